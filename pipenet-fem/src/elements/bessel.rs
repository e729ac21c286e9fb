//! Complex Bessel ratio for the low reduced frequency model

use num_complex::Complex64;

/// Below this modulus the power series is used, above it the Hankel expansion
const SERIES_LIMIT: f64 = 12.0;
const MAX_TERMS: usize = 200;

/// `J₁(z) / J₀(z)` for complex `z`
///
/// The asymptotic branch assumes `z` lies away from the real axis, which is
/// always the case for the thermo-viscous arguments `i^{3/2} s`.
pub fn j1_over_j0(z: Complex64) -> Complex64 {
    if z.norm() < SERIES_LIMIT {
        let (j0, j1) = series_j0_j1(z);
        j1 / j0
    } else if z.im >= 0.0 {
        asymptotic_ratio(z)
    } else {
        asymptotic_ratio(z.conj()).conj()
    }
}

fn series_j0_j1(z: Complex64) -> (Complex64, Complex64) {
    let half = z * 0.5;
    let q = -(half * half);
    let mut term0 = Complex64::new(1.0, 0.0);
    let mut term1 = half;
    let mut j0 = term0;
    let mut j1 = term1;
    for m in 1..MAX_TERMS {
        let m = m as f64;
        term0 *= q / (m * m);
        term1 *= q / (m * (m + 1.0));
        j0 += term0;
        j1 += term1;
        if term0.norm() <= f64::EPSILON * j0.norm() && term1.norm() <= f64::EPSILON * j1.norm() {
            break;
        }
    }
    (j0, j1)
}

fn asymptotic_ratio(z: Complex64) -> Complex64 {
    let inv = z.inv();
    let inv2 = inv * inv;
    let inv3 = inv2 * inv;
    let p0 = 1.0 - inv2 * (9.0 / 128.0);
    let q0 = -inv * 0.125 + inv3 * (75.0 / 1024.0);
    let p1 = 1.0 + inv2 * (15.0 / 128.0);
    let q1 = inv * 0.375 - inv3 * (105.0 / 1024.0);
    let i = Complex64::i();
    i * (p1 - i * q1) / (p0 - i * q0)
}

/// Zwikker–Kosten function `F(s) = 2 J₁(z) / (z J₀(z))`, `z = i^{3/2} s`
///
/// Tends to 1 for a vanishing shear number and to 0 for a wide duct.
pub fn zwikker_kosten(shear_number: f64) -> Complex64 {
    if shear_number <= 0.0 {
        return Complex64::new(1.0, 0.0);
    }
    let z = Complex64::from_polar(shear_number, 0.75 * std::f64::consts::PI);
    2.0 * j1_over_j0(z) / z
}
