//! Configuration error types.

use thiserror::Error;

/// Result type for directive configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while reading declarative cache directives.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse TOML configuration.
    #[error("invalid TOML directives: {0}")]
    Toml(#[from] toml::de::Error),

    /// Failed to parse JSON configuration.
    #[error("invalid JSON directives: {0}")]
    Json(#[from] serde_json::Error),

    /// Timeout settings that cannot describe a reload interval.
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),

    /// Lookup of an element that has no configuration.
    #[error("no cache directives configured for element '{0}'")]
    UnknownElement(String),
}
