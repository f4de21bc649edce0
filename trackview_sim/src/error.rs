//! Error types for the harness.

use thiserror::Error;
use trackview_core::ConfigError;

/// Errors surfaced by the CLI and its file handling.
#[derive(Debug, Error)]
pub enum SimError {
    /// Reading or writing a file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A config, track or export document was malformed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value was rejected by the core
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A track file did not describe a usable loop
    #[error("Invalid track: {0}")]
    InvalidTrack(String),
}
