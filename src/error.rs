//! Error type shared by every fallible region operation.
//!
//! Errors never leave a region half-modified: an operation either completes
//! or returns one of these with the target exactly as it was.

use thiserror::Error;

/// Status returned by region, path, and bitmap operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegionError {
    /// Rejected input: malformed data, unknown enum value, bad path layout.
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    /// An allocation failed or would exceed the bitmap ceiling.
    #[error("out of memory: {requested} bytes requested")]
    OutOfMemory { requested: u64 },

    /// The caller's output buffer is smaller than the encoded data.
    #[error("buffer too small: {needed} bytes needed, {available} available")]
    InsufficientBuffer { needed: usize, available: usize },

    /// The operation is not supported by this target.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// A matrix with a zero determinant was asked for its inverse.
    #[error("matrix is not invertible")]
    SingularMatrix,
}

pub type Result<T> = core::result::Result<T, RegionError>;
