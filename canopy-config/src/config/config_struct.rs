//! Core `Config` struct definition and its `Default` impl.

use crate::types::{LogLevel, ScopeMode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings for the tab tree maintainer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    // ========================================================================
    // Scoping
    // ========================================================================
    /// One tree per window, or one tree for the whole browser
    #[serde(default = "crate::defaults::scope_mode")]
    pub scope_mode: ScopeMode,

    /// Skip the tree build when a popup, app or devtools window opens; its
    /// tab events still rebuild it
    #[serde(default = "crate::defaults::normal_windows_only")]
    pub normal_windows_only: bool,

    /// Drop persisted scopes whose windows are gone when starting up
    #[serde(default = "crate::defaults::purge_closed_windows_on_startup")]
    pub purge_closed_windows_on_startup: bool,

    // ========================================================================
    // Persistence
    // ========================================================================
    /// Snapshot file location (defaults to `window_trees.json` next to the
    /// config file)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,

    // ========================================================================
    // Debug Logging
    // ========================================================================
    /// Verbosity of the debug log file
    #[serde(default = "crate::defaults::log_level")]
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scope_mode: crate::defaults::scope_mode(),
            normal_windows_only: crate::defaults::normal_windows_only(),
            purge_closed_windows_on_startup: crate::defaults::purge_closed_windows_on_startup(),
            store_path: None,
            log_level: crate::defaults::log_level(),
        }
    }
}
