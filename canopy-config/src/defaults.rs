//! Default value functions for configuration.
//!
//! Used as `#[serde(default = "crate::defaults::...")]` attributes on
//! `Config` fields so partially written YAML files still load.

use crate::types::{LogLevel, ScopeMode};

/// Application directory name under the platform config directory
pub const APP_DIR: &str = "canopy";

/// Config file name
pub const CONFIG_FILE: &str = "config.yaml";

/// Snapshot store file name
pub const STORE_FILE: &str = "window_trees.json";

pub fn scope_mode() -> ScopeMode {
    ScopeMode::Window
}

pub fn normal_windows_only() -> bool {
    true
}

pub fn purge_closed_windows_on_startup() -> bool {
    true
}

pub fn log_level() -> LogLevel {
    LogLevel::Info
}
