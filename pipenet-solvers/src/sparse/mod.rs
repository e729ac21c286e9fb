//! Sparse matrix structures
//!
//! [`CooMatrix`] accumulates element contributions during assembly and
//! [`CsrMatrix`] is the compressed form consumed by the solvers.

mod csr;

pub use csr::{CooMatrix, CsrMatrix};
