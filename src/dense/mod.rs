//! # Dense matrices
//!
//! [`Matrix`] stores `rows * cols` elements of a single [`VecType`] in row-major
//! order: element `(i, j)` lives at offset `i * cols + j`. Callers may author a
//! matrix row by row or column by column; both are normalized to the same layout
//! at construction, so every operation downstream is independent of how the
//! matrix was written.

use std::fmt;
use std::ops::Index;

use ndarray::{Array2, ArrayView2};

use crate::element::{VecNum, VecType};
use crate::error::{MatrixError, Result};
use crate::vector::VectorView;

pub mod batch;
mod ops;

/// A dense `rows x cols` matrix of homogeneous numeric elements.
///
/// Every matrix obtained through the public constructors has at least one row
/// and one column, and every element matches [`Matrix::element_type`].
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    typ: VecType,
    data: Vec<VecNum>,
}

fn check_type(typ: VecType, data: &[VecNum]) -> Result<()> {
    match data.iter().find(|e| !typ.matches(e)) {
        Some(found) => Err(MatrixError::TypeMismatch {
            expected: typ,
            found: found.element_type(),
        }),
        None => Ok(()),
    }
}

fn check_nonempty(rows: usize, cols: usize) -> Result<()> {
    if rows == 0 || cols == 0 {
        return Err(MatrixError::dimension(format!(
            "a matrix needs at least one row and one column, got {} x {}",
            rows, cols
        )));
    }
    Ok(())
}

impl Matrix {
    /// Builds a matrix from column-major nested input.
    ///
    /// Each inner sequence is one column, so
    /// `from_columns(VecType::Int, &[[1, 0], [1, 1]])` (with `VecNum`
    /// elements) describes
    ///
    /// ```text
    /// [1, 1]
    /// [0, 1]
    /// ```
    ///
    /// # Errors
    /// - [`MatrixError::Dimension`] if there are no columns, the columns are
    ///   empty or their lengths differ.
    /// - [`MatrixError::TypeMismatch`] if any element is not of kind `typ`.
    pub fn from_columns<C: AsRef<[VecNum]>>(typ: VecType, columns: &[C]) -> Result<Self> {
        let cols = columns.len();
        let rows = columns.first().map_or(0, |c| c.as_ref().len());
        check_nonempty(rows, cols)?;

        for (j, column) in columns.iter().enumerate() {
            let column = column.as_ref();
            if column.len() != rows {
                return Err(MatrixError::dimension(format!(
                    "column {} has {} elements, expected {}",
                    j,
                    column.len(),
                    rows
                )));
            }
            check_type(typ, column)?;
        }

        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for column in columns {
                data.push(column.as_ref()[i]);
            }
        }

        Ok(Self::from_flat_unchecked(typ, data, rows, cols))
    }

    /// Builds a matrix from row-major nested input, one inner sequence per row.
    ///
    /// # Errors
    /// Same conditions as [`Matrix::from_columns`], applied to rows.
    pub fn from_rows<R: AsRef<[VecNum]>>(typ: VecType, rows: &[R]) -> Result<Self> {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, |r| r.as_ref().len());
        check_nonempty(nrows, ncols)?;

        let mut data = Vec::with_capacity(nrows * ncols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != ncols {
                return Err(MatrixError::dimension(format!(
                    "row {} has {} elements, expected {}",
                    i,
                    row.len(),
                    ncols
                )));
            }
            check_type(typ, row)?;
            data.extend_from_slice(row);
        }

        Ok(Self::from_flat_unchecked(typ, data, nrows, ncols))
    }

    /// Builds an `m x n` matrix from data already in row-major order, taking
    /// ownership of the buffer.
    ///
    /// # Errors
    /// - [`MatrixError::Dimension`] if `data.len() != m * n` or either
    ///   dimension is zero.
    /// - [`MatrixError::TypeMismatch`] if any element is not of kind `typ`.
    pub fn from_flat(typ: VecType, data: Vec<VecNum>, m: usize, n: usize) -> Result<Self> {
        check_nonempty(m, n)?;
        if m.checked_mul(n) != Some(data.len()) {
            return Err(MatrixError::dimension(format!(
                "{} elements cannot fill a {} x {} matrix",
                data.len(),
                m,
                n
            )));
        }
        check_type(typ, &data)?;

        Ok(Self::from_flat_unchecked(typ, data, m, n))
    }

    /// Builds a matrix without checking length or element kinds.
    ///
    /// Only for callers that establish the invariants by construction.
    pub(crate) fn from_flat_unchecked(typ: VecType, data: Vec<VecNum>, m: usize, n: usize) -> Self {
        debug_assert_eq!(data.len(), m * n);
        Matrix {
            rows: m,
            cols: n,
            typ,
            data,
        }
    }

    /// An `m x n` matrix with every element set to `value`.
    ///
    /// # Errors
    /// [`MatrixError::Dimension`] if either dimension is zero, or if `m * n`
    /// elements overflow `usize` or cannot be allocated.
    pub fn filled(typ: VecType, m: usize, n: usize, value: VecNum) -> Result<Self> {
        check_nonempty(m, n)?;
        check_type(typ, std::slice::from_ref(&value))?;
        let len = m.checked_mul(n).ok_or_else(|| {
            MatrixError::dimension(format!("a {} x {} matrix overflows usize", m, n))
        })?;

        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|e| {
            MatrixError::dimension(format!("cannot allocate a {} x {} matrix: {}", m, n, e))
        })?;
        data.resize(len, value);
        Ok(Self::from_flat_unchecked(typ, data, m, n))
    }

    pub fn zeros(typ: VecType, m: usize, n: usize) -> Result<Self> {
        Self::filled(typ, m, n, VecNum::zero(typ))
    }

    /// The `n x n` identity matrix of kind `typ`.
    pub fn identity(typ: VecType, n: usize) -> Result<Self> {
        let mut matrix = Self::zeros(typ, n, n)?;
        let one = VecNum::one(typ);
        for i in 0..n {
            matrix.data[i * n + i] = one;
        }
        Ok(matrix)
    }

    /// Converts an ndarray view, checking every element against `typ`.
    pub fn from_array2(typ: VecType, array: ArrayView2<'_, VecNum>) -> Result<Self> {
        let (rows, cols) = array.dim();
        check_nonempty(rows, cols)?;
        // `iter` walks the logical row-major order regardless of the view's strides.
        let data: Vec<VecNum> = array.iter().copied().collect();
        check_type(typ, &data)?;
        Ok(Self::from_flat_unchecked(typ, data, rows, cols))
    }

    pub fn to_array2(&self) -> Array2<VecNum> {
        Array2::from_shape_fn((self.rows, self.cols), |(i, j)| self.data[self.offset(i, j)])
    }

    #[inline]
    fn offset(&self, i: usize, j: usize) -> usize {
        i * self.cols + j
    }

    fn check_bounds(&self, i: usize, j: usize) -> Result<()> {
        if i >= self.rows || j >= self.cols {
            return Err(MatrixError::OutOfBounds {
                row: i,
                col: j,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn element_type(&self) -> VecType {
        self.typ
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always `false` for matrices built through the public constructors.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The row-major storage.
    pub fn as_slice(&self) -> &[VecNum] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<VecNum> {
        self.data
    }

    /// Element at row `i`, column `j`, or `None` when out of bounds.
    pub fn get(&self, i: usize, j: usize) -> Option<&VecNum> {
        self.check_bounds(i, j).ok()?;
        self.data.get(self.offset(i, j))
    }

    /// Row `i` as a contiguous slice.
    pub fn row(&self, i: usize) -> Option<&[VecNum]> {
        if i >= self.rows {
            return None;
        }
        let start = i * self.cols;
        Some(&self.data[start..start + self.cols])
    }

    /// Overwrites the element at row `i`, column `j`.
    ///
    /// Taking `&mut self` means a matrix shared between threads has to sit
    /// behind a lock before it can be written.
    ///
    /// # Errors
    /// - [`MatrixError::OutOfBounds`] if `i >= rows` or `j >= cols`.
    /// - [`MatrixError::TypeMismatch`] if `value` is not of the matrix's kind.
    pub fn set_element(&mut self, i: usize, j: usize, value: VecNum) -> Result<()> {
        self.check_bounds(i, j)?;
        if !self.typ.matches(&value) {
            return Err(MatrixError::TypeMismatch {
                expected: self.typ,
                found: value.element_type(),
            });
        }

        let offset = self.offset(i, j);
        self.data[offset] = value;
        Ok(())
    }

    pub fn transpose(&self) -> Matrix {
        let mut data = Vec::with_capacity(self.data.len());
        for j in 0..self.cols {
            for i in 0..self.rows {
                data.push(self.data[self.offset(i, j)]);
            }
        }
        Self::from_flat_unchecked(self.typ, data, self.cols, self.rows)
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Views a single row or single column matrix as a vector.
    ///
    /// # Errors
    /// [`MatrixError::Shape`] if the matrix has more than one row and more than
    /// one column.
    pub fn to_vector(&self) -> Result<VectorView<'_>> {
        if self.rows != 1 && self.cols != 1 {
            return Err(MatrixError::Shape {
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(VectorView::new_unchecked(self.typ, &self.data))
    }

    /// The single element of a `1 x 1` matrix, `None` for any other shape.
    pub fn to_scalar(&self) -> Option<&VecNum> {
        if self.rows != 1 || self.cols != 1 {
            return None;
        }
        self.data.first()
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = VecNum;

    fn index(&self, (i, j): (usize, usize)) -> &VecNum {
        assert!(
            i < self.rows && j < self.cols,
            "index ({}, {}) out of bounds for a {} x {} matrix",
            i,
            j,
            self.rows,
            self.cols
        );
        &self.data[self.offset(i, j)]
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.data.chunks(self.cols.max(1)).enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str("[")?;
            for (j, value) in row.iter().enumerate() {
                if j > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", value)?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}
