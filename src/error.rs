//! Error types for the scanner library.

use thiserror::Error;

/// Result type alias for scan operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Invalid user input, detected before any scanning starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid timeout value: {0} (must be greater than 0)")]
    InvalidTimeout(i64),

    #[error("invalid thread count: {0} (must be between 1 and 1000)")]
    InvalidWorkerCount(i64),

    #[error("invalid {which} port: {value}")]
    MalformedPort { which: &'static str, value: String },

    #[error("invalid port range [{start} - {end}]")]
    InvalidRange { start: i64, end: i64 },

    #[error("could not resolve hostname: {0}")]
    Unresolved(String),
}

/// Errors that abort a whole run.
#[derive(Error, Debug)]
pub enum Error {
    /// Rejected configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A worker task panicked or was cancelled by the runtime.
    #[error("worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}
