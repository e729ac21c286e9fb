//! Eigenvalue solvers for modal analysis
//!
//! - [`generalized_symmetric_eigen`]: dense `Kφ = λMφ` for symmetric K and
//!   symmetric positive definite M, with shift-based mode selection

mod generalized;

pub use generalized::{EigenError, EigenPairs, EigenSettings, generalized_symmetric_eigen};
