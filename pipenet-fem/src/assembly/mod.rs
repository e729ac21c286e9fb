//! Global matrix assembly
//!
//! - [`assemble_structural`]: element-consistent stiffness and mass
//! - [`assemble_lumped`]: lumped masses, springs, dampers and elastic links
//! - [`assemble_acoustic`]: per-frequency duct system with terminations and sources
//! - [`assemble_acoustic_fe`]: real acoustic matrices for modal analyses
//! - [`assemble_coupling`]: fluid pressure load on the structure
//! - [`DofPartition`]: elimination of prescribed DOFs
//!
//! Element blocks are scattered through the COO index layout of
//! [`Mesh::global_indexes`]; duplicate entries are summed when the triplets
//! are compressed.

mod acoustic;
mod coupling;
mod lumped;
mod reduction;
mod structural;

pub use acoustic::*;
pub use coupling::*;
pub use lumped::*;
pub use reduction::*;
pub use structural::*;

use crate::error::{ConfigError, Result};
use crate::mesh::{Mesh, Physics};
use crate::properties::{ElementProperties, RequiredProperty};
use std::collections::BTreeMap;

/// Check that every element of a system carries what its kernel reads
///
/// In a structural analysis every element must have a structural kind; in an
/// acoustic analysis only elements with an acoustic kind take part. Offenders
/// are grouped per property and the first group is reported with all its ids.
pub fn check_properties(mesh: &Mesh, physics: Physics) -> Result<()> {
    let mut missing: BTreeMap<RequiredProperty, Vec<usize>> = BTreeMap::new();
    for element in mesh.elements() {
        let props = &element.properties;
        let absent = match physics {
            Physics::Structural => props.missing_structural(),
            Physics::Acoustic if props.is_acoustic() => props.missing_acoustic(),
            Physics::Acoustic => Vec::new(),
        };
        for property in absent {
            missing.entry(property).or_default().push(element.id);
        }
    }
    if let Some((property, element_ids)) = missing.into_iter().next() {
        return Err(ConfigError::MissingProperty {
            property,
            element_ids,
        });
    }

    for element in mesh.elements() {
        check_values(element.id, &element.properties, physics)?;
    }
    Ok(())
}

fn check_values(element_id: usize, props: &ElementProperties, physics: Physics) -> Result<()> {
    let invalid = |what: &str| ConfigError::InvalidValue {
        what: format!("{what} of element {element_id}"),
        reason: "non-physical constants".into(),
    };
    let reads_structure = physics == Physics::Structural
        && props
            .structural_kind
            .as_ref()
            .is_some_and(|kind| kind.is_continuous());
    let reads_fluid = physics == Physics::Acoustic && props.is_acoustic();

    if reads_structure {
        if props.material.as_ref().is_some_and(|m| !m.is_valid()) {
            return Err(invalid("material"));
        }
        if props.section.as_ref().is_some_and(|s| !s.is_valid()) {
            return Err(invalid("cross-section"));
        }
    }
    if reads_fluid {
        if props.fluid.as_ref().is_some_and(|f| !f.is_valid()) {
            return Err(invalid("fluid"));
        }
        if props.section.as_ref().is_some_and(|s| !s.is_valid()) {
            return Err(invalid("cross-section"));
        }
    }
    Ok(())
}
