//! Acoustic fluids

use serde::{Deserialize, Serialize};

/// Fluid filling the pipes
///
/// The thermo-viscous constants are only read by the dissipative acoustic
/// models (wide duct and low reduced frequency).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fluid {
    /// Display name
    pub name: String,
    /// Density ρ (kg/m³)
    pub density: f64,
    /// Speed of sound c (m/s)
    pub speed_of_sound: f64,
    /// Dynamic viscosity μ (Pa·s)
    pub dynamic_viscosity: f64,
    /// Ratio of specific heats γ
    pub isentropic_exponent: f64,
    /// Prandtl number
    pub prandtl: f64,
}

impl Fluid {
    /// Air at 20 °C
    pub fn air() -> Self {
        Self {
            name: "air".into(),
            density: 1.2041,
            speed_of_sound: 343.21,
            dynamic_viscosity: 1.8140e-5,
            isentropic_exponent: 1.400,
            prandtl: 0.7068,
        }
    }

    /// Water at 20 °C
    pub fn water() -> Self {
        Self {
            name: "water".into(),
            density: 998.2,
            speed_of_sound: 1482.0,
            dynamic_viscosity: 1.002e-3,
            isentropic_exponent: 1.0,
            prandtl: 7.0,
        }
    }

    /// Characteristic impedance ρc
    pub fn impedance(&self) -> f64 {
        self.density * self.speed_of_sound
    }

    /// Adiabatic bulk modulus ρc²
    pub fn bulk_modulus(&self) -> f64 {
        self.density * self.speed_of_sound * self.speed_of_sound
    }

    /// Kinematic viscosity ν = μ/ρ
    pub fn kinematic_viscosity(&self) -> f64 {
        self.dynamic_viscosity / self.density
    }

    /// Shear number s = a √(ρω/μ) for a duct of radius `radius`
    pub fn shear_number(&self, radius: f64, omega: f64) -> f64 {
        radius * (omega / self.kinematic_viscosity()).sqrt()
    }

    /// Whether the constants describe a physical fluid
    pub fn is_valid(&self) -> bool {
        self.density > 0.0
            && self.speed_of_sound > 0.0
            && self.dynamic_viscosity >= 0.0
            && self.isentropic_exponent >= 1.0
            && self.prandtl > 0.0
    }
}
