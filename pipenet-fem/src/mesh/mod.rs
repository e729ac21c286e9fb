//! Piping network topology
//!
//! This module turns raw nodes and edges into a [`Mesh`] with depth-first
//! global ordering, node/element lookups and the COO index layout used by
//! the assembly.

mod topology;
mod types;

pub use topology::*;
pub use types::*;
