use thiserror::Error;

use crate::element::VecType;

/// Errors produced by matrix construction, access and arithmetic.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum MatrixError {
    /// Shape or length mismatch at construction or in an arithmetic operation.
    #[error("dimension mismatch: {0}")]
    Dimension(String),

    /// An element's variant does not match the declared matrix type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: VecType, found: VecType },

    #[error("index ({row}, {col}) out of bounds for a {rows} x {cols} matrix")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// Reduction to a vector attempted on a matrix with more than one row and column.
    #[error("a {rows} x {cols} matrix is not one-dimensional in either direction")]
    Shape { rows: usize, cols: usize },

    #[error("batch multiplication requires at least one matrix")]
    EmptyBatch,

    #[error("batch multiplication was cancelled")]
    Cancelled,
}

impl MatrixError {
    pub(crate) fn dimension(msg: impl Into<String>) -> Self {
        MatrixError::Dimension(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, MatrixError>;
