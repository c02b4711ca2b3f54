pub mod dense;
pub mod element;
pub mod error;
pub mod vector;

pub use dense::batch::{batch_multiply, BatchMultiplier, BatchMultiplierBuilder, CancellationToken};
pub use dense::Matrix;
pub use element::{VecNum, VecType};
pub use error::MatrixError;
pub use vector::VectorView;
