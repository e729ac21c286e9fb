//! Boundary conditions, loads and lumped elements attached to the mesh
//!
//! Provides:
//! - Scalar or tabulated values ([`BcValue`], [`DofValues`])
//! - Structural nodal attachments (prescribed DOFs, loads, lumped masses,
//!   springs and dampers)
//! - Elastic links between node pairs
//! - Acoustic sources and terminations
//! - Rotation decoupling masks at junctions
//!
//! Attachments are keyed by external node/element ids. Every category is a
//! map; the "nodes with ..." views are derived from the map keys, so a setter
//! only ever touches its own category.

mod acoustic;
mod decoupling;
mod links;
mod nodal;
mod values;

pub use acoustic::*;
pub use decoupling::*;
pub use links::*;
pub use nodal::*;
pub use values::*;

use crate::error::Result;
use std::collections::BTreeMap;

/// Attachment store of one model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attachments {
    prescribed_dofs: BTreeMap<usize, DofValues>,
    nodal_loads: BTreeMap<usize, DofValues>,
    lumped_masses: BTreeMap<usize, DofValues>,
    lumped_springs: BTreeMap<usize, DofValues>,
    lumped_dampers: BTreeMap<usize, DofValues>,
    link_stiffness: BTreeMap<(usize, usize), DofValues>,
    link_damping: BTreeMap<(usize, usize), DofValues>,
    acoustic_sources: BTreeMap<usize, AcousticSource>,
    terminations: BTreeMap<usize, AcousticTermination>,
    decouplings: BTreeMap<(usize, usize), RotationDecoupling>,
}

impl Attachments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether lumped masses, springs, dampers or links vary with frequency
    pub fn has_frequency_dependent_lumps(&self) -> bool {
        [
            &self.lumped_masses,
            &self.lumped_springs,
            &self.lumped_dampers,
        ]
        .iter()
        .any(|map| map.values().any(DofValues::has_tables))
            || self
                .link_stiffness
                .values()
                .chain(self.link_damping.values())
                .any(DofValues::has_tables)
    }

    /// Whether loads or prescribed values vary with frequency
    pub fn has_frequency_dependent_loads(&self) -> bool {
        self.prescribed_dofs
            .values()
            .chain(self.nodal_loads.values())
            .any(DofValues::has_tables)
    }

    /// Cross-category consistency checks run before every analysis
    pub fn validate(&self) -> Result<()> {
        self.check_load_conflicts()
    }
}
