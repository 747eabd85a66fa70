/// Structured error types for finreview-core.
///
/// The CLI wraps these in `anyhow` with extra context; library consumers
/// match on the variants.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for finreview-core operations
#[derive(Error, Debug)]
pub enum FinreviewError {
    /// Reading a config file failed
    #[error("I/O error reading {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },

    /// Config file is not valid TOML (or has wrongly-typed fields)
    #[error("Invalid TOML in {path:?}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Config could not be rendered back to TOML
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Semantically invalid configuration
    #[error("Configuration error: {reason}")]
    Config { reason: String },
}

/// Result type alias for finreview-core operations
pub type Result<T> = std::result::Result<T, FinreviewError>;

impl FinreviewError {
    /// Create a configuration error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}
