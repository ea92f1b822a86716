//! Configuration system for the canopy tab tree maintainer.
//!
//! This crate provides configuration loading, saving, and default values.
//! It includes:
//!
//! - The `Config` struct (scoping, persistence and logging settings)
//! - Enumerated settings (`ScopeMode`, `LogLevel`)
//! - Typed load/save errors (`ConfigError`)

pub mod config;
pub mod defaults;
pub mod error;
mod types;

// Re-export main types for convenience
pub use config::Config;
pub use error::ConfigError;
pub use types::{LogLevel, ScopeMode};
