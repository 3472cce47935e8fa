//! Error types for sequence pooling.
//!
//! Every check runs before a buffer is written, so an `Err` always means the
//! output and gradient buffers were left untouched.

use thiserror::Error;

/// Structural problems with the input shape, the offsets table or the
/// buffers handed to an operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// Only a single level of sequence offsets is supported.
    #[error("only one level of sequence offsets is supported, got {levels}")]
    LodLevels { levels: usize },

    /// The input has no leading row dimension.
    #[error("input must have at least one dimension")]
    ScalarInput,

    /// The first dimension of the input must be at least the batch size.
    #[error("input has {rows} rows but the offsets describe {batch} sequences")]
    TooFewRows { rows: usize, batch: usize },

    /// An offset points past the last input row.
    #[error("offset {offset} at index {index} exceeds the {rows} input rows")]
    OffsetOutOfRange {
        index: usize,
        offset: usize,
        rows: usize,
    },

    /// Offsets must never decrease.
    #[error("offsets decrease at index {index}: {prev} > {next}")]
    DecreasingOffsets {
        index: usize,
        prev: usize,
        next: usize,
    },

    /// Pooling an empty sequence has no defined value.
    #[error("sequence {index} is empty")]
    EmptySequence { index: usize },

    /// The output gradient does not match the pooled output shape.
    #[error("output gradient has shape {got:?}, expected {expected:?}")]
    GradientShape {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// A caller-provided buffer does not match the shape it must hold.
    #[error("buffer has shape {got:?}, expected {expected:?}")]
    BufferShape {
        expected: Vec<usize>,
        got: Vec<usize>,
    },
}

/// Failure of a sequence pooling call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The input layout or a buffer shape is invalid.
    #[error("shape error: {0}")]
    Shape(#[from] ShapeError),

    /// The pooling attribute names none of the known policies.
    #[error("unsupported pooling type {0:?}")]
    UnsupportedPoolType(String),
}

/// Shorthand used throughout the crate.
pub type PoolResult<T> = Result<T, PoolError>;
