//! Error types for starchart
//!
//! Only configuration loading and terminal I/O can fail. Per-frame simulation and
//! rendering never return errors.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for starchart operations
pub type Result<T> = std::result::Result<T, StarchartError>;

#[derive(Error, Debug)]
pub enum StarchartError {
    /// IO error while talking to the terminal
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be read
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`crate::config::Config`]
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config values out of range
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Hex colour that is not RRGGBB
    #[error("Invalid hex color: {value} (expected RRGGBB, e.g. 1a1b26)")]
    InvalidColor { value: String },
}

impl StarchartError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        StarchartError::InvalidConfig {
            message: message.into(),
        }
    }
}
