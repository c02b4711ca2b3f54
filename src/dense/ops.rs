use std::ops::{Add, Mul, Sub};

use log::trace;

use super::Matrix;
use crate::element::VecNum;
use crate::error::{MatrixError, Result};

impl Matrix {
    fn check_same_type(&self, other: &Matrix) -> Result<()> {
        if self.typ != other.typ {
            return Err(MatrixError::TypeMismatch {
                expected: self.typ,
                found: other.typ,
            });
        }
        Ok(())
    }

    fn zip_with(&self, other: &Matrix, op: impl Fn(&VecNum, &VecNum) -> VecNum) -> Result<Matrix> {
        self.check_same_type(other)?;
        if self.shape() != other.shape() {
            return Err(MatrixError::dimension(format!(
                "cannot combine a {} x {} matrix with a {} x {} matrix element-wise",
                self.rows, self.cols, other.rows, other.cols
            )));
        }

        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| op(a, b))
            .collect();
        Ok(Matrix::from_flat_unchecked(self.typ, data, self.rows, self.cols))
    }

    /// Element-wise sum.
    ///
    /// # Errors
    /// [`MatrixError::TypeMismatch`] if the element kinds differ,
    /// [`MatrixError::Dimension`] if the shapes differ.
    pub fn add(&self, other: &Matrix) -> Result<Matrix> {
        self.zip_with(other, VecNum::add)
    }

    /// Element-wise difference `self - other`, with the same errors as [`Matrix::add`].
    pub fn sub(&self, other: &Matrix) -> Result<Matrix> {
        self.zip_with(other, VecNum::sub)
    }

    /// Multiplies every element by `factor`.
    pub fn scale(&self, factor: &VecNum) -> Result<Matrix> {
        if !self.typ.matches(factor) {
            return Err(MatrixError::TypeMismatch {
                expected: self.typ,
                found: factor.element_type(),
            });
        }
        let data = self.data.iter().map(|e| e.mul(factor)).collect();
        Ok(Matrix::from_flat_unchecked(self.typ, data, self.rows, self.cols))
    }

    /// Matrix product `self * other`.
    ///
    /// The result is `self.rows() x other.cols()`. Accumulation uses the
    /// element kind's own arithmetic, so integers stay integers and single
    /// precision floats are never widened.
    ///
    /// # Errors
    /// [`MatrixError::Dimension`] unless `self.cols() == other.rows()`,
    /// [`MatrixError::TypeMismatch`] if the element kinds differ.
    pub fn mul(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows {
            return Err(MatrixError::dimension(format!(
                "cannot multiply a {} x {} matrix by a {} x {} matrix",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        self.check_same_type(other)?;

        let (m, k, n) = (self.rows, self.cols, other.cols);
        trace!("multiplying {} x {} by {} x {}", m, k, k, n);

        let zero = VecNum::zero(self.typ);
        let mut data = Vec::with_capacity(m * n);
        for a_row in self.data.chunks_exact(k) {
            for j in 0..n {
                let mut acc = zero;
                for (p, a) in a_row.iter().enumerate() {
                    acc = acc.add(&a.mul(&other.data[p * n + j]));
                }
                data.push(acc);
            }
        }

        Ok(Matrix::from_flat_unchecked(self.typ, data, m, n))
    }
}

impl Add for &Matrix {
    type Output = Result<Matrix>;

    fn add(self, rhs: &Matrix) -> Result<Matrix> {
        Matrix::add(self, rhs)
    }
}

impl Sub for &Matrix {
    type Output = Result<Matrix>;

    fn sub(self, rhs: &Matrix) -> Result<Matrix> {
        Matrix::sub(self, rhs)
    }
}

impl Mul for &Matrix {
    type Output = Result<Matrix>;

    fn mul(self, rhs: &Matrix) -> Result<Matrix> {
        Matrix::mul(self, rhs)
    }
}
