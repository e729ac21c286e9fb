//! Linear-algebra kernels for pipenet
//!
//! This crate provides the numerical building blocks consumed by the FEM
//! crate: sparse storage for assembly, dense direct solves for each frequency
//! sample, and the generalized eigen-solver used by modal analyses.
//!
//! # Features
//!
//! - **Sparse Matrices**: COO accumulation and CSR storage, duplicate summation,
//!   sub-matrix extraction for DOF elimination
//! - **Direct Solvers**: LU decomposition with partial pivoting
//! - **Eigen Solvers**: dense `Kφ = λMφ` with M-orthonormal modes
//! - **Generic Scalar Types**: Works with Complex64 and f64
//!
//! # Example
//!
//! ```
//! use pipenet_solvers::{CooMatrix, lu_solve};
//! use ndarray::array;
//!
//! let mut coo = CooMatrix::new(2, 2);
//! coo.push(0, 0, 4.0_f64);
//! coo.push(1, 1, 2.0);
//! coo.push(0, 0, -2.0);
//! let a = coo.into_csr().to_dense();
//! let x = lu_solve(&a, &array![2.0, 2.0]).unwrap();
//! assert_eq!(x[0], 1.0);
//! ```

pub mod direct;
pub mod eigen;
pub mod parallel;
pub mod sparse;
pub mod traits;

// Re-export main types
pub use sparse::{CooMatrix, CsrMatrix};
pub use traits::ComplexField;

// Re-export solvers
pub use direct::{
    LuError, LuFactorization, lu_factorize, lu_factorize_with_tolerance, lu_solve,
};
pub use eigen::{EigenError, EigenPairs, EigenSettings, generalized_symmetric_eigen};

/// Library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
