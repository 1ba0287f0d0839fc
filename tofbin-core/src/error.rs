//! Error types for tofbin-core.

use thiserror::Error;

use crate::event::EventType;

/// Result type alias for tofbin operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the workspace data model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Array lengths do not satisfy the histogram invariants.
    #[error("size mismatch for {what}: expected {expected}, got {actual}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Spectrum or bin index outside the workspace.
    #[error("{what} index {index} out of range (size {size})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        size: usize,
    },

    /// Malformed rebin parameters.
    #[error("invalid rebin parameters: {0}")]
    InvalidBinParams(String),

    /// Mask weights must lie in (0, 1].
    #[error("invalid mask weight {0}: must be in (0, 1]")]
    InvalidMaskWeight(f64),

    /// Event storage can only be promoted, never demoted.
    #[error("cannot switch event list from {from} to {to}")]
    InvalidEventSwitch { from: EventType, to: EventType },

    /// Generic invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
