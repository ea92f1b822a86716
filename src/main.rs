use anyhow::Result;
use canopy::cli::{self, Cli};
use clap::Parser;
use tokio::runtime::Runtime;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // CLI --log-level takes precedence, then RUST_LOG, then config (applied later)
    canopy::debug::init_log_bridge(cli.log_level.map(|level| level.to_level_filter()));
    log::info!("Starting canopy");

    let runtime = Runtime::new()?;
    let result = cli::run(cli, &runtime);
    runtime.shutdown_timeout(std::time::Duration::from_secs(2));

    if let Err(ref e) = result {
        log::error!("canopy failed: {e:#}");
        eprintln!("canopy: error: {e:#}");
    }
    result
}
