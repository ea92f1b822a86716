//! Tab tree maintainer configuration.
//!
//! # Sub-modules
//!
//! - [`config_struct`]: Core `Config` struct and its `Default` impl
//! - [`persistence`]: `impl Config` methods for load/save/path-resolution and validation

pub mod config_struct;
pub mod persistence;

pub use config_struct::Config;
