//! Error types returned by estimator operations.
//!
//! Every error reflects a violated caller contract, so none of them is transient and none is
//! retried internally. An operation that fails leaves the estimator untouched.

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring, merging or restoring an estimator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Estimators with different register counts cannot be merged.
    #[error("incompatible register counts: expected {expected}, found {found}")]
    IncompatibleConfiguration { expected: usize, found: usize },

    /// No bias table or linear counting threshold exists for the given index bits.
    #[error("unsupported accuracy: {0} index bits (supported range is 4..=16)")]
    UnsupportedAccuracy(u8),

    /// A restored snapshot is malformed or internally inconsistent.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}
