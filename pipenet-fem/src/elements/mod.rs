//! Element kernels
//!
//! - [`beam`]: Timoshenko pipe/beam, geometric stiffness, expansion joints
//! - [`duct`]: acoustic dynamic stiffness, FE matrices, perforated plates,
//!   end corrections
//! - [`bessel`]: complex Bessel ratio of the low reduced frequency model
//!
//! [`structural_matrices`] picks the kernel from the element's structural
//! kind and returns global-axis matrices ready for scatter.

pub mod beam;
pub mod bessel;
pub mod duct;

use crate::error::{ConfigError, Result};
use crate::mesh::Element;
use crate::properties::{CrossSection, RequiredProperty, StructuralKind};
use ndarray::Array2;
use std::f64::consts::PI;

/// Stiffness and mass of one structural element in global axes
#[derive(Debug, Clone)]
pub struct StructuralElementMatrices {
    pub stiffness: Array2<f64>,
    pub mass: Array2<f64>,
}

impl StructuralElementMatrices {
    /// Entry-wise multiplication by a 12×12 mask
    pub fn apply_mask(&mut self, mask: &[[f64; 12]; 12]) {
        for matrix in [&mut self.stiffness, &mut self.mass] {
            for ((i, j), value) in matrix.indexed_iter_mut() {
                *value *= mask[i][j];
            }
        }
    }
}

fn missing(property: RequiredProperty, element: &Element) -> ConfigError {
    ConfigError::MissingProperty {
        property,
        element_ids: vec![element.id],
    }
}

/// Axial force produced by internal and external pressure
///
/// Closed (capped) elements carry the end thrust reduced by the Poisson
/// contraction; open ones only the Poisson part.
pub fn pressure_axial_force(
    internal_pressure: f64,
    external_pressure: f64,
    inner_area: f64,
    outer_area: f64,
    poisson_ratio: f64,
    capped: bool,
) -> f64 {
    let thrust = internal_pressure * inner_area - external_pressure * outer_area;
    if capped {
        thrust * (1.0 - 2.0 * poisson_ratio)
    } else {
        -2.0 * poisson_ratio * thrust
    }
}

/// Global stiffness and mass of a structural element
pub fn structural_matrices(element: &Element) -> Result<StructuralElementMatrices> {
    let props = &element.properties;
    let kind = props
        .structural_kind
        .as_ref()
        .ok_or_else(|| missing(RequiredProperty::StructuralKind, element))?;
    if let Some(&property) = props.missing_structural().first() {
        return Err(missing(property, element));
    }

    let transformation = beam::transformation_matrix(&element.direction);

    let (local_k, local_m) = match kind {
        StructuralKind::ExpansionJoint(joint) => {
            (beam::expansion_joint_stiffness(joint), Array2::zeros((12, 12)))
        }
        StructuralKind::Pipe | StructuralKind::Valve | StructuralKind::Flange | StructuralKind::Beam => {
            let material = props
                .material
                .as_ref()
                .ok_or_else(|| missing(RequiredProperty::Material, element))?;
            let section_kind = props
                .section
                .as_ref()
                .ok_or_else(|| missing(RequiredProperty::CrossSection, element))?;
            let section = section_kind.properties(material.poisson_ratio);

            let mut mass_per_length = material.density * section.area + section.insulation_mass_per_length;
            if props.fluid_added_mass {
                if let Some(fluid) = &props.fluid {
                    mass_per_length += fluid.density * section.inner_area;
                }
            }

            let mut k = beam::local_stiffness(
                material.elastic_modulus,
                material.shear_modulus(),
                &section,
                element.length,
            );
            if let (Some(stiffening), CrossSection::Pipe { .. } | CrossSection::Reducer { .. }) =
                (&props.stress_stiffening, section_kind)
            {
                let outer = section.outer_diameter.unwrap_or_default();
                let force = pressure_axial_force(
                    stiffening.internal_pressure,
                    stiffening.external_pressure,
                    section.inner_area,
                    PI / 4.0 * outer * outer,
                    material.poisson_ratio,
                    props.capped_end,
                );
                k += &beam::local_geometric_stiffness(force, element.length);
            }
            let m = beam::local_mass(material.density, &section, mass_per_length, element.length);
            (k, m)
        }
    };

    Ok(StructuralElementMatrices {
        stiffness: beam::to_global(&local_k, &transformation),
        mass: beam::to_global(&local_m, &transformation),
    })
}
