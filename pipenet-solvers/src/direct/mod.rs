//! Direct solvers for linear systems
//!
//! This module provides direct (non-iterative) solvers:
//! - [`lu_solve`]: LU decomposition with partial pivoting
//! - [`lu_factorize`]: factorize once, solve for several right-hand sides

mod lu;

pub use lu::{
    DEFAULT_PIVOT_TOLERANCE, LuError, LuFactorization, lu_factorize, lu_factorize_with_tolerance,
    lu_solve,
};
