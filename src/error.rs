use thiserror::Error;

use crate::patch::PrimitiveMap;

/// Top-level error type for patch merging and orphan adoption.
#[derive(Debug, Error)]
pub enum PatchMergeError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    ParameterOutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Errors related to the primitive and point stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("primitive not found: {0}")]
    PrimitiveNotFound(String),

    #[error("point index {index} is out of range for a cloud of {len} points")]
    PointIndexOutOfRange { index: usize, len: usize },
}

/// Errors related to merge and adoption operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("operation failed: {0}")]
    Failed(String),

    /// The merge loop hit its pass cap. `last` is the map produced by the
    /// final completed pass.
    #[error("merging did not reach a fixed point after {passes} passes")]
    NotConverged {
        passes: usize,
        last: Box<PrimitiveMap>,
    },
}

/// Convenience type alias for results using [`PatchMergeError`].
pub type Result<T> = std::result::Result<T, PatchMergeError>;
