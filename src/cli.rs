//! Command-line interface for canopy.
//!
//! Subcommands replay a scripted browser session through the maintainer,
//! print stored forests, and write the default config file.

use crate::debug;
use crate::host::SimulatedBrowser;
use crate::maintainer::{MaintainerOptions, TreeMaintainer};
use crate::replay;
use crate::store::{FileStore, SnapshotStore};
use anyhow::{Context, Result};
use canopy_config::{Config, LogLevel, ScopeMode};
use canopy_tree::{ScopeId, TreeNode, count_nodes, render_outline};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;

/// canopy - keeps browser tabs organised as opener trees
#[derive(Parser)]
#[command(name = "canopy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file to use instead of ~/.config/canopy/config.yaml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log level (overrides RUST_LOG and the config file)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a JSON Lines browser script through the maintainer
    Replay {
        /// Script file (one action per line)
        script: PathBuf,

        /// Snapshot file to write
        #[arg(long, value_name = "PATH")]
        store: Option<PathBuf>,

        /// One tree per window or one for the whole browser
        #[arg(long, value_name = "MODE")]
        scope_mode: Option<ScopeMode>,

        /// Print the resulting forests
        #[arg(long)]
        print: bool,
    },

    /// Print stored forests as outlines
    Show {
        /// Snapshot file to read
        #[arg(long, value_name = "PATH")]
        store: Option<PathBuf>,

        /// Only this scope (`global` or a window ID)
        #[arg(long, value_name = "SCOPE")]
        scope: Option<ScopeId>,
    },

    /// Write the default config file
    InitConfig {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

/// Run the parsed command line
pub fn run(cli: Cli, runtime: &Runtime) -> Result<()> {
    match cli.command {
        Commands::Replay {
            script,
            store,
            scope_mode,
            print,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(mode) = scope_mode {
                config.scope_mode = mode;
            }
            run_replay(&config, &script, store, print, runtime)
        }
        Commands::Show { store, scope } => {
            let config = load_config(cli.config.as_deref())?;
            run_show(&config, store, scope)
        }
        Commands::InitConfig { force } => {
            let path = cli.config.unwrap_or_else(Config::config_path);
            init_config(&path, force)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load config")?;
    debug::apply_config_level(config.log_level.to_level_filter());
    Ok(config)
}

fn run_replay(
    config: &Config,
    script: &Path,
    store_path: Option<PathBuf>,
    print: bool,
    runtime: &Runtime,
) -> Result<()> {
    let actions = replay::load_script(script)
        .with_context(|| format!("Failed to load script {:?}", script))?;

    let store_path = store_path.unwrap_or_else(|| config.effective_store_path());
    let store = Arc::new(
        FileStore::open(&store_path)
            .with_context(|| format!("Failed to open snapshot store {:?}", store_path))?,
    );

    let browser = SimulatedBrowser::new();
    let maintainer = Arc::new(TreeMaintainer::new(
        browser.clone(),
        Arc::clone(&store),
        MaintainerOptions::from(config),
    ));
    maintainer
        .initialize()
        .context("Failed to initialize from the browser")?;

    let summary = runtime.block_on(replay::replay(&browser, Arc::clone(&maintainer), &actions));

    println!(
        "Replayed {} actions ({} rejected), {} events: {} persisted, {} destroyed, {} ignored, {} dropped",
        summary.actions,
        summary.rejected,
        summary.events,
        summary.stats.persisted,
        summary.stats.destroyed,
        summary.stats.ignored,
        summary.stats.dropped
    );
    println!("Snapshots written to {}", store_path.display());

    if print {
        for scope in store.scopes().context("Failed to list stored scopes")? {
            if let Some(snapshot) = maintainer.snapshot(scope) {
                print_forest(scope, &snapshot.forest);
            }
        }
    }
    Ok(())
}

fn run_show(config: &Config, store_path: Option<PathBuf>, only: Option<ScopeId>) -> Result<()> {
    let store_path = store_path.unwrap_or_else(|| config.effective_store_path());
    let store = FileStore::open(&store_path)
        .with_context(|| format!("Failed to open snapshot store {:?}", store_path))?;

    let scopes: Vec<ScopeId> = store
        .scopes()
        .context("Failed to list stored scopes")?
        .into_iter()
        .filter(|scope| only.is_none_or(|wanted| wanted == *scope))
        .collect();

    if scopes.is_empty() {
        println!("No stored trees in {}", store_path.display());
        return Ok(());
    }

    for scope in scopes {
        if let Some(record) = store.load(scope)? {
            print_forest(scope, &record.cached_forest);
        }
    }
    Ok(())
}

fn print_forest(scope: ScopeId, forest: &[TreeNode]) {
    println!("Scope {} ({} tabs)", scope, count_nodes(forest));
    print!("{}", render_outline(forest));
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file {} already exists (use --force to overwrite)",
            path.display()
        );
    }
    Config::default()
        .save_to(path)
        .with_context(|| format!("Failed to write config {:?}", path))?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}
