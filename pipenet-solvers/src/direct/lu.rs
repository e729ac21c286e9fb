//! LU decomposition solver
//!
//! Provides LU factorization with partial pivoting for dense linear systems.
//! The frequency sweep factorizes the reduced dynamic matrix once per sample.
//!
//! A pivot is singular when its magnitude falls below the tolerance times the
//! largest entry of the input.

use crate::traits::ComplexField;
use ndarray::{Array1, Array2};
use num_traits::{FromPrimitive, ToPrimitive, Zero};
use thiserror::Error;

/// Default relative pivot tolerance used by [`lu_solve`] and [`lu_factorize`]
pub const DEFAULT_PIVOT_TOLERANCE: f64 = 1e-14;

/// Errors that can occur during LU factorization
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LuError {
    #[error("matrix is singular or nearly singular (pivot {pivot} at column {column})")]
    SingularMatrix { column: usize, pivot: f64 },
    #[error("matrix dimensions mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// LU factorization result
///
/// Stores L and U factors along with pivot information
#[derive(Debug, Clone)]
pub struct LuFactorization<T: ComplexField> {
    /// Combined L and U matrices (L is unit lower triangular, stored below diagonal)
    pub lu: Array2<T>,
    /// Row permutation applied during elimination
    pub pivots: Vec<usize>,
    /// Matrix dimension
    pub n: usize,
}

impl<T: ComplexField> LuFactorization<T> {
    /// Solve Ax = b using the pre-computed LU factorization
    pub fn solve(&self, b: &Array1<T>) -> Result<Array1<T>, LuError> {
        if b.len() != self.n {
            return Err(LuError::DimensionMismatch {
                expected: self.n,
                got: b.len(),
            });
        }

        let mut x: Array1<T> = self.pivots.iter().map(|&p| b[p]).collect();

        // Forward substitution: Ly = Pb
        for i in 0..self.n {
            for j in 0..i {
                let l_ij = self.lu[[i, j]];
                let x_j = x[j];
                x[i] -= l_ij * x_j;
            }
        }

        // Backward substitution: Ux = y
        for i in (0..self.n).rev() {
            for j in (i + 1)..self.n {
                let u_ij = self.lu[[i, j]];
                let x_j = x[j];
                x[i] -= u_ij * x_j;
            }
            x[i] *= self.lu[[i, i]].inv();
        }

        Ok(x)
    }
}

/// Compute LU factorization with partial pivoting using [`DEFAULT_PIVOT_TOLERANCE`]
pub fn lu_factorize<T: ComplexField>(a: &Array2<T>) -> Result<LuFactorization<T>, LuError> {
    lu_factorize_with_tolerance(a, DEFAULT_PIVOT_TOLERANCE)
}

/// Compute LU factorization with partial pivoting
///
/// A pivot whose magnitude falls below `relative_tolerance · max|aᵢⱼ|` marks
/// the matrix as singular.
pub fn lu_factorize_with_tolerance<T: ComplexField>(
    a: &Array2<T>,
    relative_tolerance: f64,
) -> Result<LuFactorization<T>, LuError> {
    let n = a.nrows();
    if n != a.ncols() {
        return Err(LuError::DimensionMismatch {
            expected: n,
            got: a.ncols(),
        });
    }

    let scale = a
        .iter()
        .map(|v| v.norm())
        .fold(T::Real::zero(), |acc, v| if v > acc { v } else { acc });
    let threshold = scale * T::Real::from_f64(relative_tolerance).unwrap_or_else(T::Real::zero);

    let mut lu = a.clone();
    let mut pivots: Vec<usize> = (0..n).collect();

    for k in 0..n {
        let (max_row, max_val) = (k..n)
            .map(|i| (i, lu[[i, k]].norm()))
            .fold((k, T::Real::zero()), |best, cur| if cur.1 > best.1 { cur } else { best });

        if max_val <= threshold {
            return Err(LuError::SingularMatrix {
                column: k,
                pivot: max_val.to_f64().unwrap_or(0.0),
            });
        }

        if max_row != k {
            for j in 0..n {
                lu.swap([k, j], [max_row, j]);
            }
            pivots.swap(k, max_row);
        }

        let pivot_inv = lu[[k, k]].inv();
        for i in (k + 1)..n {
            let mult = lu[[i, k]] * pivot_inv;
            lu[[i, k]] = mult;
            if mult.is_zero() {
                continue;
            }
            for j in (k + 1)..n {
                let update = mult * lu[[k, j]];
                lu[[i, j]] -= update;
            }
        }
    }

    Ok(LuFactorization { lu, pivots, n })
}

/// Solve Ax = b using LU decomposition
///
/// This is a convenience function that combines factorization and solve.
pub fn lu_solve<T: ComplexField>(a: &Array2<T>, b: &Array1<T>) -> Result<Array1<T>, LuError> {
    lu_factorize(a)?.solve(b)
}
