//! Isotropic structural materials

use serde::{Deserialize, Serialize};

/// Linear elastic isotropic material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Display name
    pub name: String,
    /// Density (kg/m³)
    pub density: f64,
    /// Young's modulus (Pa)
    pub elastic_modulus: f64,
    /// Poisson's ratio
    pub poisson_ratio: f64,
}

impl Material {
    /// Create a material
    pub fn new(name: impl Into<String>, density: f64, elastic_modulus: f64, poisson_ratio: f64) -> Self {
        Self {
            name: name.into(),
            density,
            elastic_modulus,
            poisson_ratio,
        }
    }

    /// Carbon steel
    pub fn steel() -> Self {
        Self::new("steel", 7860.0, 210e9, 0.3)
    }

    /// Shear modulus G = E / (2(1 + ν))
    pub fn shear_modulus(&self) -> f64 {
        self.elastic_modulus / (2.0 * (1.0 + self.poisson_ratio))
    }

    /// Whether the constants describe a physical material
    pub fn is_valid(&self) -> bool {
        self.density > 0.0
            && self.elastic_modulus > 0.0
            && self.poisson_ratio > -1.0
            && self.poisson_ratio < 0.5
    }
}
