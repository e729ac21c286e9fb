//! Element properties: materials, fluids, sections and element kinds
//!
//! Every element carries one [`ElementProperties`] record. The structural and
//! acoustic kinds decide which kernel assembles the element and which of the
//! other fields must be present:
//!
//! - Pipe, valve and flange: material and a pipe section
//! - Beam: material and any section
//! - Expansion joint: nothing, the stiffness travels with the kind
//! - Every acoustic kind: fluid and a pipe section

mod fluid;
mod kinds;
mod material;
mod section;

pub use fluid::*;
pub use kinds::*;
pub use material::*;
pub use section::*;

use serde::{Deserialize, Serialize};

/// Properties and flags attached to one element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementProperties {
    pub structural_kind: Option<StructuralKind>,
    pub acoustic_kind: Option<AcousticKind>,
    pub material: Option<Material>,
    pub fluid: Option<Fluid>,
    pub section: Option<CrossSection>,
    /// Pressure thrust acts on a free end of this element
    pub capped_end: bool,
    pub stress_stiffening: Option<StressStiffening>,
    /// Add the contained fluid mass to the structural mass
    pub fluid_added_mass: bool,
    pub length_correction: Option<LengthCorrection>,
    pub perforated_plate: Option<PerforatedPlate>,
}

impl ElementProperties {
    fn satisfies(&self, property: RequiredProperty) -> bool {
        match property {
            RequiredProperty::StructuralKind => self.structural_kind.is_some(),
            RequiredProperty::AcousticKind => self.acoustic_kind.is_some(),
            RequiredProperty::Material => self.material.is_some(),
            RequiredProperty::Fluid => self.fluid.is_some(),
            RequiredProperty::CrossSection => self.section.is_some(),
            RequiredProperty::PipeSection => self.section.as_ref().is_some_and(CrossSection::is_pipe),
        }
    }

    /// Properties the structural kernel needs but cannot find
    pub fn missing_structural(&self) -> Vec<RequiredProperty> {
        match &self.structural_kind {
            None => vec![RequiredProperty::StructuralKind],
            Some(kind) => kind
                .required_properties()
                .iter()
                .copied()
                .filter(|&p| !self.satisfies(p))
                .collect(),
        }
    }

    /// Properties the acoustic kernel needs but cannot find
    pub fn missing_acoustic(&self) -> Vec<RequiredProperty> {
        match &self.acoustic_kind {
            None => vec![RequiredProperty::AcousticKind],
            Some(kind) => kind
                .required_properties()
                .iter()
                .copied()
                .filter(|&p| !self.satisfies(p))
                .collect(),
        }
    }

    /// Whether the element takes part in the acoustic system
    pub fn is_acoustic(&self) -> bool {
        self.acoustic_kind.is_some()
    }

    /// Whether the element conveys fluid pressure onto the structure
    pub fn is_fluid_filled(&self) -> bool {
        self.structural_kind
            .as_ref()
            .is_some_and(StructuralKind::is_continuous)
            && self.acoustic_kind.is_some()
            && self.section.as_ref().is_some_and(CrossSection::is_pipe)
    }

    /// Inner radius of the section, if it is a pipe
    pub fn inner_radius(&self) -> Option<f64> {
        self.section.as_ref().and_then(CrossSection::inner_radius)
    }
}
