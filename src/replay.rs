//! Scripted replay of browser activity.
//!
//! A script is JSON Lines: one [`BrowserAction`] object per line. Blank lines
//! and lines starting with `#` are skipped.
//!
//! ```text
//! {"op":"open_window","window":1}
//! {"op":"open_tab","window":1,"tab":10,"title":"Docs"}
//! {"op":"open_tab","window":1,"tab":11,"title":"Page","opener":10}
//! {"op":"toggle_expanded","tab":10}
//! ```

use crate::host::{BrowserAction, SimulatedBrowser};
use crate::maintainer::TreeMaintainer;
use crate::pump::{EventPump, PumpStats};
use crate::store::SnapshotStore;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while reading a script
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read script {path:?}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse a JSON Lines script
pub fn parse_script(text: &str) -> Result<Vec<BrowserAction>, ScriptError> {
    let mut actions = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let action = serde_json::from_str(trimmed).map_err(|source| ScriptError::Parse {
            line: index + 1,
            source,
        })?;
        actions.push(action);
    }
    Ok(actions)
}

/// Read and parse a script file
pub fn load_script(path: &Path) -> Result<Vec<BrowserAction>, ScriptError> {
    let text = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_script(&text)
}

/// What a replay did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Actions applied to the browser
    pub actions: usize,
    /// Actions the browser rejected (unknown tab, duplicate ID, ...)
    pub rejected: usize,
    /// Host events pushed through the pump
    pub events: usize,
    pub stats: PumpStats,
}

/// Apply `actions` to `browser` and route every resulting event through an
/// [`EventPump`] into `maintainer`.
pub async fn replay<S>(
    browser: &SimulatedBrowser,
    maintainer: Arc<TreeMaintainer<SimulatedBrowser, S>>,
    actions: &[BrowserAction],
) -> ReplaySummary
where
    S: SnapshotStore + 'static,
{
    let pump = EventPump::spawn(Arc::clone(&maintainer));
    let mut summary = ReplaySummary::default();

    for action in actions {
        if let BrowserAction::ToggleExpanded { window, tab } = action {
            let window = window.or_else(|| browser.tab(*tab).map(|t| t.window_id));
            match window {
                Some(window) => {
                    pump.toggle_expanded(maintainer.scope_for_window(window), *tab);
                    summary.actions += 1;
                }
                None => {
                    log::warn!("Cannot toggle tab {}: window unknown", tab);
                    summary.rejected += 1;
                }
            }
            continue;
        }

        match browser.apply(action) {
            Ok(events) => {
                summary.actions += 1;
                for event in events {
                    summary.events += 1;
                    pump.submit(event);
                }
            }
            Err(e) => {
                log::warn!("Rejected {:?}: {}", action, e);
                summary.rejected += 1;
            }
        }
    }

    pump.flush().await;
    summary.stats = pump.shutdown().await;
    log::info!(
        "Replay finished: {} actions, {} rejected, {} events",
        summary.actions,
        summary.rejected,
        summary.events
    );
    summary
}
