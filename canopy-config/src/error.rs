//! Typed error variants for the canopy-config crate.
//!
//! Callers that only want a message can wrap these in `anyhow`; callers that
//! care about the failure mode can match on the variant.

use thiserror::Error;

/// Errors that can occur when loading, validating or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An I/O error occurred reading or writing the config file.
    #[error("I/O error on config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file contained YAML that could not be parsed.
    #[error("YAML parse error in config: {0}")]
    Parse(#[source] serde_yaml_ng::Error),

    /// The config could not be serialized back to YAML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[source] serde_yaml_ng::Error),

    /// A field value failed semantic validation.
    ///
    /// The inner string describes which field is invalid and why.
    #[error("config validation error: {0}")]
    Validation(String),
}
