//! One-dimensional acoustic duct elements
//!
//! Harmonic analyses use the exact dynamic stiffness of a uniform duct,
//!
//! ```text
//! D = A k / (ρ sin kL) · [[cos kL, −1], [−1, cos kL]]
//! ```
//!
//! where the propagation model fixes the complex wavenumber `k` and the
//! effective density `ρ`. Modal analyses use the linear FE matrices, which
//! are the low-frequency expansion of `D`.
//!
//! Rows of every element matrix give `iω` times the volume velocity entering
//! the element at that node.

use super::bessel::zwikker_kosten;
use crate::properties::{AcousticKind, Fluid, LengthCorrection, PerforatedPlate};
use num_complex::Complex64;
use std::f64::consts::PI;

/// Lowest frequency (Hz) fed into divisions by ω
///
/// The frequency vector itself is never modified; a 0 Hz sample is solved as
/// if it were this frequency.
pub const FREQUENCY_EPSILON: f64 = 1e-4;

/// |sin kL| below which a lossless element sits on its blocked resonance
const SIN_FLOOR: f64 = 1e-10;

/// Angular frequency safe for divisions
pub fn division_safe_omega(frequency: f64) -> f64 {
    2.0 * PI * frequency.max(FREQUENCY_EPSILON)
}

/// 2×2 complex element matrix
pub type AcousticBlock = [[Complex64; 2]; 2];

/// Complex propagation constants of a duct
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Propagation {
    /// Wavenumber, `Im k ≤ 0` for lossy media
    pub wavenumber: Complex64,
    /// Effective density
    pub density: Complex64,
}

/// Propagation constants of a duct of inner radius `radius`
///
/// `loss_factor` is the hysteretic loss of the plane-wave model; the other
/// models derive their losses from the fluid.
pub fn propagation(kind: AcousticKind, fluid: &Fluid, radius: f64, omega: f64, loss_factor: f64) -> Propagation {
    let rho = fluid.density;
    let c = fluid.speed_of_sound;
    let k0 = omega / c;
    match kind {
        AcousticKind::PlaneWave => Propagation {
            wavenumber: k0 / Complex64::new(1.0, loss_factor).sqrt(),
            density: Complex64::new(rho, 0.0),
        },
        AcousticKind::WideDuct => {
            let s = fluid.shear_number(radius, omega);
            let sigma = fluid.prandtl.sqrt();
            let thermal = (fluid.isentropic_exponent - 1.0) / sigma;
            let boundary_layer = Complex64::new(1.0, -1.0) / (2.0_f64.sqrt() * s);
            let wavenumber = k0 * (1.0 + boundary_layer * (1.0 + thermal));
            let impedance = rho * c * (1.0 + boundary_layer * (1.0 - thermal));
            Propagation {
                wavenumber,
                density: impedance * wavenumber / omega,
            }
        }
        AcousticKind::LrfFluidEquivalent | AcousticKind::LrfFull => {
            let s = fluid.shear_number(radius, omega);
            let density = rho / (1.0 - zwikker_kosten(s));
            let mut compressibility = Complex64::new(1.0 / fluid.bulk_modulus(), 0.0);
            if kind == AcousticKind::LrfFull {
                let thermal = zwikker_kosten(fluid.prandtl.sqrt() * s);
                compressibility *= 1.0 + (fluid.isentropic_exponent - 1.0) * thermal;
            }
            Propagation {
                wavenumber: omega * (density * compressibility).sqrt(),
                density,
            }
        }
    }
}

/// Exact dynamic stiffness of a duct of cross-section `area` and length `length`
pub fn dynamic_stiffness(propagation: &Propagation, area: f64, length: f64) -> AcousticBlock {
    let mut k = propagation.wavenumber;
    if (k * length).sin().norm() < SIN_FLOOR {
        k *= Complex64::new(1.0, -1e-8);
    }
    let kl = k * length;
    let factor = area * k / (propagation.density * kl.sin());
    let diagonal = factor * kl.cos();
    [[diagonal, -factor], [-factor, diagonal]]
}

/// Linear FE stiffness and mass of a duct
pub fn fe_matrices(fluid: &Fluid, area: f64, length: f64) -> ([[f64; 2]; 2], [[f64; 2]; 2]) {
    let k = area / (fluid.density * length);
    let m = area * length / (6.0 * fluid.bulk_modulus());
    ([[k, -k], [-k, k]], [[2.0 * m, m], [m, 2.0 * m]])
}

/// Dimensionless transfer impedance of a perforated plate
///
/// Uses the tabulated value when given, otherwise a linear model with
/// viscous resistance and end-corrected inertance of the holes.
pub fn plate_impedance(plate: &PerforatedPlate, fluid: &Fluid, frequency: f64) -> Complex64 {
    if let Some(table) = &plate.dimensionless_impedance {
        return table.evaluate(frequency);
    }
    let omega = division_safe_omega(frequency);
    let c = fluid.speed_of_sound;
    let d = plate.hole_diameter;
    let t = plate.thickness;
    let resistance = (8.0 * fluid.kinematic_viscosity() * omega).sqrt() / c * (1.0 + t / d);
    let end_correction = 0.85 * d * (1.0 - 0.7 * plate.porosity.sqrt());
    let reactance = omega / c * (t + end_correction);
    Complex64::new(resistance, reactance) / plate.porosity
}

/// Transfer admittance block of a perforated plate over a duct of area `area`
pub fn plate_admittance(plate: &PerforatedPlate, fluid: &Fluid, area: f64, frequency: f64) -> AcousticBlock {
    let omega = division_safe_omega(frequency);
    let z = plate_impedance(plate, fluid, frequency);
    let y = Complex64::new(0.0, omega * area) / (fluid.impedance() * z);
    [[y, -y], [-y, y]]
}

/// End correction of a duct of radius `radius` opening onto one of radius `other_radius`
///
/// Expansion follows Kergomard & Garcia, side branches follow Dubos et al.
/// No correction applies when the neighbour is not wider.
pub fn end_correction(correction: LengthCorrection, radius: f64, other_radius: f64) -> f64 {
    if other_radius <= radius || radius <= 0.0 {
        return 0.0;
    }
    let nu = radius / other_radius;
    match correction {
        LengthCorrection::Expansion => 0.82 * radius * (1.0 - 1.35 * nu + 0.31 * nu.powi(3)),
        LengthCorrection::SideBranch => {
            radius * (0.82 - 0.193 * nu - 1.09 * nu.powi(2) + 1.27 * nu.powi(3) - 0.71 * nu.powi(4))
        }
    }
}
