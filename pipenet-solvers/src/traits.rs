//! Scalar abstraction shared by the sparse containers and the direct solver
//!
//! Global matrices are real (`f64`) for eigenproblems and complex
//! (`Complex64`) for frequency samples. The CSR container and the LU
//! factorization only need magnitudes and reciprocals on top of field
//! arithmetic.

use num_complex::Complex64;
use num_traits::{Float, FromPrimitive, NumAssign};
use std::fmt::Debug;
use std::ops::Neg;

/// Matrix entry type: `f64` or `Complex64`
pub trait ComplexField: NumAssign + Copy + Send + Sync + Debug + Neg<Output = Self> + 'static {
    /// Magnitude type, used for pivoting and drop tolerances
    type Real: Float + FromPrimitive + Send + Sync + Debug + 'static;

    /// |z|
    fn norm(&self) -> Self::Real;

    /// 1/z
    fn inv(&self) -> Self;
}

impl ComplexField for Complex64 {
    type Real = f64;

    #[inline]
    fn norm(&self) -> f64 {
        self.re.hypot(self.im)
    }

    #[inline]
    fn inv(&self) -> Self {
        Complex64::inv(self)
    }
}

impl ComplexField for f64 {
    type Real = f64;

    #[inline]
    fn norm(&self) -> f64 {
        self.abs()
    }

    #[inline]
    fn inv(&self) -> Self {
        self.recip()
    }
}
