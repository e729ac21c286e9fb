//! Cross-sections and their derived geometric properties

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Thermal or acoustic insulation wrapped around a pipe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Insulation {
    /// Layer thickness (m)
    pub thickness: f64,
    /// Layer density (kg/m³)
    pub density: f64,
}

/// Element cross-section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CrossSection {
    /// Straight circular pipe
    Pipe {
        outer_diameter: f64,
        thickness: f64,
        #[serde(default)]
        insulation: Option<Insulation>,
    },
    /// Conical reducer, evaluated at mid-length
    Reducer {
        outer_diameter_first: f64,
        outer_diameter_last: f64,
        thickness: f64,
    },
    /// Generic beam section given by its constants
    Beam {
        area: f64,
        iy: f64,
        iz: f64,
        /// Torsion constant
        j: f64,
        shear_coefficient_y: f64,
        shear_coefficient_z: f64,
        /// Height or diameter used by the slenderness check
        characteristic_dimension: f64,
    },
}

/// Geometric constants consumed by the element kernels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionProperties {
    /// Wall (or solid) area
    pub area: f64,
    /// Second moment about local y
    pub iy: f64,
    /// Second moment about local z
    pub iz: f64,
    /// Saint-Venant torsion constant
    pub torsion_constant: f64,
    /// Polar moment Iy + Iz, used for rotary inertia
    pub polar_moment: f64,
    /// Effective shear area along local y
    pub shear_area_y: f64,
    /// Effective shear area along local z
    pub shear_area_z: f64,
    /// Inner (fluid) area, zero for solid beams
    pub inner_area: f64,
    /// Inner diameter, `None` for solid beams
    pub inner_diameter: Option<f64>,
    /// Outer diameter, `None` for generic beams
    pub outer_diameter: Option<f64>,
    /// Length scale of the slenderness check
    pub characteristic_dimension: f64,
    /// Mass of the insulation per unit length
    pub insulation_mass_per_length: f64,
}

impl CrossSection {
    /// Pipe without insulation
    pub fn pipe(outer_diameter: f64, thickness: f64) -> Self {
        CrossSection::Pipe {
            outer_diameter,
            thickness,
            insulation: None,
        }
    }

    /// Whether the section describes a pipe wall (pipe or reducer)
    pub fn is_pipe(&self) -> bool {
        matches!(self, CrossSection::Pipe { .. } | CrossSection::Reducer { .. })
    }

    /// Outer diameter and wall thickness of pipe-like sections
    fn wall(&self) -> Option<(f64, f64)> {
        match *self {
            CrossSection::Pipe {
                outer_diameter,
                thickness,
                ..
            } => Some((outer_diameter, thickness)),
            CrossSection::Reducer {
                outer_diameter_first,
                outer_diameter_last,
                thickness,
            } => Some((0.5 * (outer_diameter_first + outer_diameter_last), thickness)),
            CrossSection::Beam { .. } => None,
        }
    }

    /// Inner diameter of pipe-like sections
    pub fn inner_diameter(&self) -> Option<f64> {
        self.wall().map(|(d, t)| d - 2.0 * t)
    }

    /// Inner (acoustic) radius of pipe-like sections
    pub fn inner_radius(&self) -> Option<f64> {
        self.inner_diameter().map(|d| 0.5 * d)
    }

    /// Length scale of the slenderness check: outer diameter of pipe-like
    /// sections, the given dimension of beam sections
    pub fn characteristic_dimension(&self) -> f64 {
        match *self {
            CrossSection::Beam {
                characteristic_dimension,
                ..
            } => characteristic_dimension,
            _ => self.wall().map_or(0.0, |(outer, _)| outer),
        }
    }

    /// Whether the dimensions are physical
    pub fn is_valid(&self) -> bool {
        match *self {
            CrossSection::Pipe {
                outer_diameter,
                thickness,
                insulation,
            } => {
                outer_diameter > 0.0
                    && thickness > 0.0
                    && 2.0 * thickness <= outer_diameter
                    && insulation.is_none_or(|i| i.thickness >= 0.0 && i.density >= 0.0)
            }
            CrossSection::Reducer {
                outer_diameter_first,
                outer_diameter_last,
                thickness,
            } => {
                thickness > 0.0
                    && 2.0 * thickness < outer_diameter_first
                    && 2.0 * thickness < outer_diameter_last
            }
            CrossSection::Beam {
                area,
                iy,
                iz,
                j,
                shear_coefficient_y,
                shear_coefficient_z,
                characteristic_dimension,
            } => [area, iy, iz, j, shear_coefficient_y, shear_coefficient_z, characteristic_dimension]
                .iter()
                .all(|&v| v > 0.0),
        }
    }

    /// Derived constants; `poisson_ratio` enters the pipe shear coefficient
    pub fn properties(&self, poisson_ratio: f64) -> SectionProperties {
        match *self {
            CrossSection::Beam {
                area,
                iy,
                iz,
                j,
                shear_coefficient_y,
                shear_coefficient_z,
                characteristic_dimension,
            } => SectionProperties {
                area,
                iy,
                iz,
                torsion_constant: j,
                polar_moment: iy + iz,
                shear_area_y: shear_coefficient_y * area,
                shear_area_z: shear_coefficient_z * area,
                inner_area: 0.0,
                inner_diameter: None,
                outer_diameter: None,
                characteristic_dimension,
                insulation_mass_per_length: 0.0,
            },
            CrossSection::Pipe { .. } | CrossSection::Reducer { .. } => {
                let (outer, thickness) = self.wall().unwrap_or_default();
                let inner = outer - 2.0 * thickness;
                let area = PI / 4.0 * (outer.powi(2) - inner.powi(2));
                let second_moment = PI / 64.0 * (outer.powi(4) - inner.powi(4));
                let kappa = hollow_circle_shear_coefficient(inner / outer, poisson_ratio);
                let insulation_mass_per_length = match *self {
                    CrossSection::Pipe {
                        insulation: Some(layer),
                        ..
                    } => {
                        let insulated = outer + 2.0 * layer.thickness;
                        layer.density * PI / 4.0 * (insulated.powi(2) - outer.powi(2))
                    }
                    _ => 0.0,
                };
                SectionProperties {
                    area,
                    iy: second_moment,
                    iz: second_moment,
                    torsion_constant: 2.0 * second_moment,
                    polar_moment: 2.0 * second_moment,
                    shear_area_y: kappa * area,
                    shear_area_z: kappa * area,
                    inner_area: PI / 4.0 * inner.powi(2),
                    inner_diameter: Some(inner),
                    outer_diameter: Some(outer),
                    characteristic_dimension: self.characteristic_dimension(),
                    insulation_mass_per_length,
                }
            }
        }
    }
}

/// Cowper's shear coefficient of a hollow circle with diameter ratio `m = d/D`
pub fn hollow_circle_shear_coefficient(m: f64, poisson_ratio: f64) -> f64 {
    let nu = poisson_ratio;
    let m2 = m * m;
    let a = (1.0 + m2).powi(2);
    6.0 * (1.0 + nu) * a / ((7.0 + 6.0 * nu) * a + (20.0 + 12.0 * nu) * m2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pipe_properties() {
        let section = CrossSection::pipe(0.1, 0.005);
        let props = section.properties(0.3);
        let inner: f64 = 0.09;

        assert_relative_eq!(props.area, PI / 4.0 * (0.01 - inner * inner), epsilon = 1e-15);
        assert_relative_eq!(props.inner_area, PI / 4.0 * inner * inner, epsilon = 1e-15);
        assert_relative_eq!(props.torsion_constant, props.iy + props.iz);
        assert_relative_eq!(props.inner_diameter.unwrap(), inner, epsilon = 1e-15);
        assert!(props.shear_area_y < props.area);
    }

    #[test]
    fn test_solid_circle_shear_coefficient() {
        // Cowper: 6(1+ν)/(7+6ν) for a solid circle
        assert_relative_eq!(
            hollow_circle_shear_coefficient(0.0, 0.3),
            6.0 * 1.3 / 8.8,
            epsilon = 1e-14
        );
        // Thin-walled limit 2(1+ν)/(4+3ν)
        assert_relative_eq!(
            hollow_circle_shear_coefficient(1.0, 0.3),
            2.0 * 1.3 / 4.9,
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_reducer_uses_mid_length_diameter() {
        let reducer = CrossSection::Reducer {
            outer_diameter_first: 0.2,
            outer_diameter_last: 0.1,
            thickness: 0.01,
        };
        assert_relative_eq!(reducer.inner_diameter().unwrap(), 0.13, epsilon = 1e-15);
        assert!(reducer.is_valid());
        assert!(reducer.is_pipe());
    }

    #[test]
    fn test_insulation_mass() {
        let section = CrossSection::Pipe {
            outer_diameter: 0.1,
            thickness: 0.005,
            insulation: Some(Insulation {
                thickness: 0.05,
                density: 100.0,
            }),
        };
        let props = section.properties(0.3);
        assert_relative_eq!(
            props.insulation_mass_per_length,
            100.0 * PI / 4.0 * (0.04 - 0.01),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_invalid_sections() {
        assert!(!CrossSection::pipe(0.1, 0.06).is_valid());
        let beam = CrossSection::Beam {
            area: 1e-3,
            iy: 1e-6,
            iz: 0.0,
            j: 1e-6,
            shear_coefficient_y: 0.8,
            shear_coefficient_z: 0.8,
            characteristic_dimension: 0.1,
        };
        assert!(!beam.is_valid());
    }
}
