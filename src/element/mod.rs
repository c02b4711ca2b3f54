//! # Element type system
//!
//! Every matrix holds elements of exactly one numeric kind. [`VecType`] names the
//! kind and [`VecNum`] carries a value of it. Arithmetic is only defined between
//! values of the same kind; matrices check tags once at their boundaries so the
//! inner loops never have to.

use std::fmt;

use nalgebra::Complex;
use num_traits::{One, Zero};

/// Tag identifying the numeric kind held by a matrix or vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VecType {
    /// 64-bit signed integer, wrapping on overflow.
    Int,
    /// 32-bit IEEE float.
    Float,
    /// 64-bit IEEE float.
    Double,
    /// Complex number with 64-bit float parts.
    Complex,
}

impl VecType {
    /// Returns whether `value` is of this kind.
    #[inline]
    pub fn matches(self, value: &VecNum) -> bool {
        value.element_type() == self
    }
}

impl fmt::Display for VecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VecType::Int => "int",
            VecType::Float => "float",
            VecType::Double => "double",
            VecType::Complex => "complex",
        };
        f.write_str(name)
    }
}

/// A single numeric element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VecNum {
    Int(i64),
    Float(f32),
    Double(f64),
    Complex(Complex<f64>),
}

impl VecNum {
    pub fn element_type(&self) -> VecType {
        match self {
            VecNum::Int(_) => VecType::Int,
            VecNum::Float(_) => VecType::Float,
            VecNum::Double(_) => VecType::Double,
            VecNum::Complex(_) => VecType::Complex,
        }
    }

    #[inline]
    pub fn matches(&self, typ: VecType) -> bool {
        typ.matches(self)
    }

    /// Additive identity of the given kind.
    pub fn zero(typ: VecType) -> Self {
        match typ {
            VecType::Int => VecNum::Int(i64::zero()),
            VecType::Float => VecNum::Float(f32::zero()),
            VecType::Double => VecNum::Double(f64::zero()),
            VecType::Complex => VecNum::Complex(Complex::zero()),
        }
    }

    /// Multiplicative identity of the given kind.
    pub fn one(typ: VecType) -> Self {
        match typ {
            VecType::Int => VecNum::Int(i64::one()),
            VecType::Float => VecNum::Float(f32::one()),
            VecType::Double => VecNum::Double(f64::one()),
            VecType::Complex => VecNum::Complex(Complex::one()),
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            VecNum::Int(v) => v.is_zero(),
            VecNum::Float(v) => v.is_zero(),
            VecNum::Double(v) => v.is_zero(),
            VecNum::Complex(v) => v.is_zero(),
        }
    }

    /// Adds two values of the same kind.
    ///
    /// # Panics
    /// Panics if the operands are of different kinds. Matrix operations check
    /// tags before reaching this point, so a panic here is a logic error.
    #[inline]
    pub fn add(&self, rhs: &VecNum) -> VecNum {
        match (*self, *rhs) {
            (VecNum::Int(a), VecNum::Int(b)) => VecNum::Int(a.wrapping_add(b)),
            (VecNum::Float(a), VecNum::Float(b)) => VecNum::Float(a + b),
            (VecNum::Double(a), VecNum::Double(b)) => VecNum::Double(a + b),
            (VecNum::Complex(a), VecNum::Complex(b)) => VecNum::Complex(a + b),
            (a, b) => mixed_kinds("add", &a, &b),
        }
    }

    /// Subtracts `rhs` from `self`. Same panic contract as [`VecNum::add`].
    #[inline]
    pub fn sub(&self, rhs: &VecNum) -> VecNum {
        match (*self, *rhs) {
            (VecNum::Int(a), VecNum::Int(b)) => VecNum::Int(a.wrapping_sub(b)),
            (VecNum::Float(a), VecNum::Float(b)) => VecNum::Float(a - b),
            (VecNum::Double(a), VecNum::Double(b)) => VecNum::Double(a - b),
            (VecNum::Complex(a), VecNum::Complex(b)) => VecNum::Complex(a - b),
            (a, b) => mixed_kinds("subtract", &a, &b),
        }
    }

    /// Multiplies two values of the same kind. Same panic contract as [`VecNum::add`].
    #[inline]
    pub fn mul(&self, rhs: &VecNum) -> VecNum {
        match (*self, *rhs) {
            (VecNum::Int(a), VecNum::Int(b)) => VecNum::Int(a.wrapping_mul(b)),
            (VecNum::Float(a), VecNum::Float(b)) => VecNum::Float(a * b),
            (VecNum::Double(a), VecNum::Double(b)) => VecNum::Double(a * b),
            (VecNum::Complex(a), VecNum::Complex(b)) => VecNum::Complex(a * b),
            (a, b) => mixed_kinds("multiply", &a, &b),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match *self {
            VecNum::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match *self {
            VecNum::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match *self {
            VecNum::Double(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<Complex<f64>> {
        match *self {
            VecNum::Complex(v) => Some(v),
            _ => None,
        }
    }
}

#[cold]
fn mixed_kinds(op: &str, a: &VecNum, b: &VecNum) -> ! {
    unreachable!(
        "cannot {} {} and {} elements",
        op,
        a.element_type(),
        b.element_type()
    )
}

impl fmt::Display for VecNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VecNum::Int(v) => write!(f, "{}", v),
            VecNum::Float(v) => write!(f, "{}", v),
            VecNum::Double(v) => write!(f, "{}", v),
            VecNum::Complex(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for VecNum {
    fn from(value: i64) -> Self {
        VecNum::Int(value)
    }
}

impl From<f32> for VecNum {
    fn from(value: f32) -> Self {
        VecNum::Float(value)
    }
}

impl From<f64> for VecNum {
    fn from(value: f64) -> Self {
        VecNum::Double(value)
    }
}

impl From<Complex<f64>> for VecNum {
    fn from(value: Complex<f64>) -> Self {
        VecNum::Complex(value)
    }
}
