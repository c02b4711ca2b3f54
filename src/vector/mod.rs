use std::ops::Index;

use crate::element::{VecNum, VecType};
use crate::error::{MatrixError, Result};

/// Read-only, one-dimensional view over a matrix's storage.
///
/// Produced by [`crate::Matrix::to_vector`]; it borrows the matrix data rather than
/// copying it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorView<'a> {
    typ: VecType,
    data: &'a [VecNum],
}

impl<'a> VectorView<'a> {
    /// Builds a view over `data`, checking every element against `typ`.
    pub fn new(typ: VecType, data: &'a [VecNum]) -> Result<Self> {
        if let Some(found) = data.iter().find(|e| !typ.matches(e)) {
            return Err(MatrixError::TypeMismatch {
                expected: typ,
                found: found.element_type(),
            });
        }
        Ok(VectorView { typ, data })
    }

    pub(crate) fn new_unchecked(typ: VecType, data: &'a [VecNum]) -> Self {
        VectorView { typ, data }
    }

    pub fn element_type(&self) -> VecType {
        self.typ
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&'a VecNum> {
        self.data.get(i)
    }

    pub fn iter(&self) -> std::slice::Iter<'a, VecNum> {
        self.data.iter()
    }

    pub fn as_slice(&self) -> &'a [VecNum] {
        self.data
    }

    /// Inner product of two views of the same kind and length.
    pub fn dot(&self, other: &VectorView<'_>) -> Result<VecNum> {
        if self.typ != other.typ {
            return Err(MatrixError::TypeMismatch {
                expected: self.typ,
                found: other.typ,
            });
        }
        if self.len() != other.len() {
            return Err(MatrixError::dimension(format!(
                "vector lengths {} and {} differ",
                self.len(),
                other.len()
            )));
        }

        Ok(self
            .data
            .iter()
            .zip(other.data)
            .fold(VecNum::zero(self.typ), |acc, (a, b)| acc.add(&a.mul(b))))
    }
}

impl Index<usize> for VectorView<'_> {
    type Output = VecNum;

    fn index(&self, i: usize) -> &VecNum {
        &self.data[i]
    }
}

impl<'a> IntoIterator for VectorView<'a> {
    type Item = &'a VecNum;
    type IntoIter = std::slice::Iter<'a, VecNum>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}
