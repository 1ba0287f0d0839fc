//! Error types for tofbin-algorithms.

use thiserror::Error;

/// Result type for algorithm execution.
pub type Result<T> = std::result::Result<T, Error>;

/// Algorithm error types.
#[derive(Error, Debug)]
pub enum Error {
    /// A property is out of its valid domain. Raised before any mutation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The algorithm cannot process this kind of input.
    #[error("unsupported input: {0}")]
    Unsupported(String),

    /// Cancellation was requested through the progress reporter.
    #[error("execution cancelled after {processed} of {total} spectra")]
    Cancelled { processed: usize, total: usize },

    /// Malformed pipeline or instrument configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Data model error.
    #[error("core error: {0}")]
    Core(#[from] tofbin_core::Error),
}
