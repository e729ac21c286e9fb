//! Dense generalized symmetric eigenproblem `Kφ = λMφ`
//!
//! The problem is reduced to standard form with the Cholesky factor of M
//! (`M = LLᵀ`, `A = L⁻¹ K L⁻ᵀ`), solved with a symmetric QR iteration and the
//! eigenvectors are mapped back with `φ = L⁻ᵀ y`. The returned vectors are
//! therefore M-orthonormal: `ΦᵀMΦ = I`.
//!
//! The shift `sigma` plays the role it has in shift-invert solvers: the
//! `num_modes` eigenvalues closest to `sigma` are kept, then sorted ascending.
//! Of two modes equally far from `sigma`, the lower one is kept.

use nalgebra::DMatrix;
use nalgebra::linalg::{Cholesky, SymmetricEigen};
use ndarray::{Array1, Array2};
use thiserror::Error;

/// Errors raised by the eigen-solver
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EigenError {
    #[error("stiffness and mass matrices must be square and equal in size ({k_rows}x{k_cols} vs {m_rows}x{m_cols})")]
    DimensionMismatch {
        k_rows: usize,
        k_cols: usize,
        m_rows: usize,
        m_cols: usize,
    },
    #[error("mass matrix is not positive definite")]
    MassNotPositiveDefinite,
    #[error("eigen-solver did not converge within {max_iterations} iterations")]
    NoConvergence { max_iterations: usize },
    #[error("no degrees of freedom left to solve")]
    EmptyProblem,
}

/// Tuning of the symmetric QR iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EigenSettings {
    /// Convergence tolerance of the off-diagonal elements
    pub tolerance: f64,
    /// Iteration cap; 0 means unbounded
    pub max_iterations: usize,
}

impl Default for EigenSettings {
    fn default() -> Self {
        Self {
            tolerance: f64::EPSILON,
            max_iterations: 10_000,
        }
    }
}

/// Eigenvalues sorted ascending with their M-orthonormal eigenvectors as columns
#[derive(Debug, Clone)]
pub struct EigenPairs {
    /// Eigenvalues λ (rad²/s² for structural problems)
    pub eigenvalues: Array1<f64>,
    /// Eigenvectors, one per column
    pub eigenvectors: Array2<f64>,
    /// Number of modes that were requested
    pub requested: usize,
}

impl EigenPairs {
    /// Number of eigenpairs actually returned
    pub fn len(&self) -> usize {
        self.eigenvalues.len()
    }

    /// Whether no eigenpair was returned
    pub fn is_empty(&self) -> bool {
        self.eigenvalues.is_empty()
    }

    /// Whether fewer modes than requested could be extracted
    pub fn is_truncated(&self) -> bool {
        self.len() < self.requested
    }
}

fn to_nalgebra(a: &Array2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}

/// Solve `Kφ = λMφ` for the `num_modes` eigenpairs closest to `sigma`
pub fn generalized_symmetric_eigen(
    k: &Array2<f64>,
    m: &Array2<f64>,
    num_modes: usize,
    sigma: f64,
    settings: &EigenSettings,
) -> Result<EigenPairs, EigenError> {
    let n = k.nrows();
    if k.ncols() != n || m.nrows() != n || m.ncols() != n {
        return Err(EigenError::DimensionMismatch {
            k_rows: k.nrows(),
            k_cols: k.ncols(),
            m_rows: m.nrows(),
            m_cols: m.ncols(),
        });
    }
    if n == 0 {
        return Err(EigenError::EmptyProblem);
    }

    let chol = Cholesky::new(to_nalgebra(m)).ok_or(EigenError::MassNotPositiveDefinite)?;
    let l = chol.l();

    // A = L⁻¹ K L⁻ᵀ, using the symmetry of K: L⁻¹ (L⁻¹ K)ᵀ
    let x = l
        .solve_lower_triangular(&to_nalgebra(k))
        .ok_or(EigenError::MassNotPositiveDefinite)?;
    let a = l
        .solve_lower_triangular(&x.transpose())
        .ok_or(EigenError::MassNotPositiveDefinite)?;
    let a = (&a + a.transpose()) * 0.5;

    let eig = SymmetricEigen::try_new(a, settings.tolerance, settings.max_iterations).ok_or(
        EigenError::NoConvergence {
            max_iterations: settings.max_iterations,
        },
    )?;

    // Modes equally far from sigma: the lower one wins
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| {
        let di = (eig.eigenvalues[i] - sigma).abs();
        let dj = (eig.eigenvalues[j] - sigma).abs();
        di.total_cmp(&dj)
            .then(eig.eigenvalues[i].total_cmp(&eig.eigenvalues[j]))
    });
    order.truncate(num_modes.min(n));
    order.sort_by(|&i, &j| eig.eigenvalues[i].total_cmp(&eig.eigenvalues[j]));

    if num_modes > n {
        log::warn!("requested {num_modes} modes but the problem only has {n} degrees of freedom");
    }

    let mut eigenvalues = Array1::zeros(order.len());
    let mut eigenvectors = Array2::zeros((n, order.len()));
    for (col, &idx) in order.iter().enumerate() {
        let y = eig.eigenvectors.column(idx).into_owned();
        let phi = l
            .tr_solve_lower_triangular(&y)
            .ok_or(EigenError::MassNotPositiveDefinite)?;

        // Deterministic sign: largest component positive
        let pivot = phi
            .iter()
            .copied()
            .fold(0.0_f64, |acc, v| if v.abs() > acc.abs() { v } else { acc });
        let sign = if pivot < 0.0 { -1.0 } else { 1.0 };

        eigenvalues[col] = eig.eigenvalues[idx];
        for row in 0..n {
            eigenvectors[[row, col]] = sign * phi[row];
        }
    }

    Ok(EigenPairs {
        eigenvalues,
        eigenvectors,
        requested: num_modes,
    })
}
