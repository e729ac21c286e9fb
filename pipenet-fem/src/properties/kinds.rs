//! Element kinds and the per-element options that select kernel variants

use crate::attachments::BcValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural element formulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StructuralKind {
    /// Timoshenko pipe element
    Pipe,
    /// Timoshenko beam element with a generic section
    Beam,
    /// Valve body, modelled as a pipe with its own section and material
    Valve,
    /// Flange pair, modelled as a pipe with its own section and material
    Flange,
    /// Massless spring element
    ExpansionJoint(ExpansionJointStiffness),
}

/// Stiffness constants of an expansion joint in element local axes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpansionJointStiffness {
    /// Along the element axis (N/m)
    pub axial: f64,
    /// Across the element axis (N/m)
    pub transversal: f64,
    /// About the element axis (N·m/rad)
    pub torsional: f64,
    /// About the transverse axes (N·m/rad)
    pub bending: f64,
}

/// Acoustic propagation model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcousticKind {
    /// Lossless plane wave, with optional hysteretic loss
    PlaneWave,
    /// Kirchhoff boundary-layer losses, valid for large shear numbers
    WideDuct,
    /// Low reduced frequency model, viscous term only
    LrfFluidEquivalent,
    /// Low reduced frequency model, viscous and thermal terms
    LrfFull,
}

/// Property an element kind cannot do without
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RequiredProperty {
    StructuralKind,
    AcousticKind,
    Material,
    Fluid,
    CrossSection,
    PipeSection,
}

impl fmt::Display for RequiredProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequiredProperty::StructuralKind => "a structural element type",
            RequiredProperty::AcousticKind => "an acoustic element type",
            RequiredProperty::Material => "a material",
            RequiredProperty::Fluid => "a fluid",
            RequiredProperty::CrossSection => "a cross-section",
            RequiredProperty::PipeSection => "a pipe cross-section",
        };
        f.write_str(name)
    }
}

impl StructuralKind {
    /// Properties the kernel of this kind reads
    pub fn required_properties(&self) -> &'static [RequiredProperty] {
        match self {
            StructuralKind::Pipe | StructuralKind::Valve | StructuralKind::Flange => {
                &[RequiredProperty::Material, RequiredProperty::PipeSection]
            }
            StructuralKind::Beam => &[RequiredProperty::Material, RequiredProperty::CrossSection],
            StructuralKind::ExpansionJoint(_) => &[],
        }
    }

    /// Whether the element carries distributed mass and a section
    pub fn is_continuous(&self) -> bool {
        !matches!(self, StructuralKind::ExpansionJoint(_))
    }
}

impl AcousticKind {
    /// Properties every acoustic kernel reads
    pub fn required_properties(&self) -> &'static [RequiredProperty] {
        &[RequiredProperty::Fluid, RequiredProperty::PipeSection]
    }
}

/// Internal and external pressure producing the stress-stiffening axial load
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StressStiffening {
    /// Internal static pressure (Pa)
    pub internal_pressure: f64,
    /// External static pressure (Pa)
    pub external_pressure: f64,
}

/// End correction applied to the acoustic length of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthCorrection {
    /// Abrupt area expansion
    Expansion,
    /// Side branch opening into a main duct
    SideBranch,
}

/// Perforated plate lumped on an acoustic element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerforatedPlate {
    /// Hole diameter (m)
    pub hole_diameter: f64,
    /// Plate thickness (m)
    pub thickness: f64,
    /// Open area ratio
    pub porosity: f64,
    /// Measured dimensionless impedance overriding the semi-empirical model
    #[serde(default)]
    pub dimensionless_impedance: Option<BcValue>,
}
