//! Three-dimensional Timoshenko pipe/beam element
//!
//! Local DOF order per node: u, v, w (translations along the local x, y, z
//! axes), then θx, θy, θz. The local x axis runs from the first to the last
//! node. Bending in the x-y plane couples (v, θz) through Iz; bending in the
//! x-z plane couples (w, θy) through Iy with the opposite sign convention.

use crate::mesh::Point;
use crate::properties::{ExpansionJointStiffness, SectionProperties};
use ndarray::Array2;

/// Local (v₁, θz₁, v₂, θz₂) DOFs of the x-y bending plane
const XY_PLANE: [usize; 4] = [1, 5, 7, 11];
/// Local (w₁, θy₁, w₂, θy₂) DOFs of the x-z bending plane
const XZ_PLANE: [usize; 4] = [2, 4, 8, 10];
/// Sign flip turning an x-y plane block into its x-z counterpart
const XZ_SIGNS: [f64; 4] = [1.0, -1.0, 1.0, -1.0];

fn add_pair(m: &mut Array2<f64>, i: usize, j: usize, value: f64, coupling: f64) {
    m[[i, i]] += value;
    m[[j, j]] += value;
    m[[i, j]] += coupling;
    m[[j, i]] += coupling;
}

fn add_bending_block(m: &mut Array2<f64>, dofs: [usize; 4], signs: [f64; 4], block: [[f64; 4]; 4]) {
    for a in 0..4 {
        for b in 0..4 {
            m[[dofs[a], dofs[b]]] += signs[a] * signs[b] * block[a][b];
        }
    }
}

fn add_bending(m: &mut Array2<f64>, xy: [[f64; 4]; 4], xz: [[f64; 4]; 4]) {
    add_bending_block(m, XY_PLANE, [1.0; 4], xy);
    add_bending_block(m, XZ_PLANE, XZ_SIGNS, xz);
}

fn timoshenko_bending(ei: f64, phi: f64, l: f64) -> [[f64; 4]; 4] {
    let c = ei / (1.0 + phi);
    let (l2, l3) = (l * l, l * l * l);
    [
        [12.0 * c / l3, 6.0 * c / l2, -12.0 * c / l3, 6.0 * c / l2],
        [6.0 * c / l2, (4.0 + phi) * c / l, -6.0 * c / l2, (2.0 - phi) * c / l],
        [-12.0 * c / l3, -6.0 * c / l2, 12.0 * c / l3, -6.0 * c / l2],
        [6.0 * c / l2, (2.0 - phi) * c / l, -6.0 * c / l2, (4.0 + phi) * c / l],
    ]
}

/// Pattern shared by rotary inertia and the geometric stiffness
fn cubic_gradient_block(scale: f64, l: f64) -> [[f64; 4]; 4] {
    let l2 = l * l;
    [
        [36.0 * scale, 3.0 * l * scale, -36.0 * scale, 3.0 * l * scale],
        [3.0 * l * scale, 4.0 * l2 * scale, -3.0 * l * scale, -l2 * scale],
        [-36.0 * scale, -3.0 * l * scale, 36.0 * scale, -3.0 * l * scale],
        [3.0 * l * scale, -l2 * scale, -3.0 * l * scale, 4.0 * l2 * scale],
    ]
}

/// Local stiffness with shear deformation
pub fn local_stiffness(elastic_modulus: f64, shear_modulus: f64, section: &SectionProperties, length: f64) -> Array2<f64> {
    let (e, g, l) = (elastic_modulus, shear_modulus, length);
    let mut k = Array2::zeros((12, 12));

    let axial = e * section.area / l;
    add_pair(&mut k, 0, 6, axial, -axial);
    let torsion = g * section.torsion_constant / l;
    add_pair(&mut k, 3, 9, torsion, -torsion);

    let phi_y = 12.0 * e * section.iz / (g * section.shear_area_y * l * l);
    let phi_z = 12.0 * e * section.iy / (g * section.shear_area_z * l * l);
    add_bending(
        &mut k,
        timoshenko_bending(e * section.iz, phi_y, l),
        timoshenko_bending(e * section.iy, phi_z, l),
    );
    k
}

/// Local consistent mass with rotary inertia
///
/// `mass_per_length` carries the wall mass plus any contained fluid or
/// insulation; rotary and torsional inertia only use the wall.
pub fn local_mass(density: f64, section: &SectionProperties, mass_per_length: f64, length: f64) -> Array2<f64> {
    let l = length;
    let mut m = Array2::zeros((12, 12));

    let axial = mass_per_length * l / 6.0;
    add_pair(&mut m, 0, 6, 2.0 * axial, axial);
    let torsion = density * section.polar_moment * l / 6.0;
    add_pair(&mut m, 3, 9, 2.0 * torsion, torsion);

    let c = mass_per_length * l / 420.0;
    let l2 = l * l;
    let translational = [
        [156.0 * c, 22.0 * l * c, 54.0 * c, -13.0 * l * c],
        [22.0 * l * c, 4.0 * l2 * c, 13.0 * l * c, -3.0 * l2 * c],
        [54.0 * c, 13.0 * l * c, 156.0 * c, -22.0 * l * c],
        [-13.0 * l * c, -3.0 * l2 * c, -22.0 * l * c, 4.0 * l2 * c],
    ];
    add_bending(&mut m, translational, translational);
    add_bending(
        &mut m,
        cubic_gradient_block(density * section.iz / (30.0 * l), l),
        cubic_gradient_block(density * section.iy / (30.0 * l), l),
    );
    m
}

/// Local geometric stiffness for an axial force `axial_force` (tension positive)
pub fn local_geometric_stiffness(axial_force: f64, length: f64) -> Array2<f64> {
    let mut k = Array2::zeros((12, 12));
    let block = cubic_gradient_block(axial_force / (30.0 * length), length);
    add_bending(&mut k, block, block);
    k
}

/// Local stiffness of an expansion joint spring
pub fn expansion_joint_stiffness(joint: &ExpansionJointStiffness) -> Array2<f64> {
    let mut k = Array2::zeros((12, 12));
    let springs = [
        joint.axial,
        joint.transversal,
        joint.transversal,
        joint.torsional,
        joint.bending,
        joint.bending,
    ];
    for (dof, &value) in springs.iter().enumerate() {
        add_pair(&mut k, dof, dof + 6, value, -value);
    }
    k
}

/// Rows are the local x, y, z axes in global coordinates
pub fn rotation_matrix(direction: &Point) -> [[f64; 3]; 3] {
    let ex = *direction;
    let reference = if ex.x.abs() < 0.9 {
        Point::new(1.0, 0.0, 0.0)
    } else {
        Point::new(0.0, 1.0, 0.0)
    };
    let ez = ex.cross(&reference).normalized().unwrap_or(Point::new(0.0, 0.0, 1.0));
    let ey = ez.cross(&ex);
    [ex.to_array(), ey.to_array(), ez.to_array()]
}

/// Block-diagonal 12×12 local-from-global transformation
pub fn transformation_matrix(direction: &Point) -> Array2<f64> {
    let r = rotation_matrix(direction);
    let mut t = Array2::zeros((12, 12));
    for block in 0..4 {
        let offset = 3 * block;
        for i in 0..3 {
            for j in 0..3 {
                t[[offset + i, offset + j]] = r[i][j];
            }
        }
    }
    t
}

/// `Tᵀ · local · T`
pub fn to_global(local: &Array2<f64>, transformation: &Array2<f64>) -> Array2<f64> {
    transformation.t().dot(local).dot(transformation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::CrossSection;
    use approx::assert_relative_eq;
    use ndarray::Array1;

    const E: f64 = 210e9;
    const G: f64 = 210e9 / 2.6;

    fn pipe() -> SectionProperties {
        CrossSection::pipe(0.1, 0.005).properties(0.3)
    }

    fn assert_symmetric(m: &Array2<f64>) {
        let scale = m.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        for i in 0..12 {
            for j in 0..12 {
                assert_relative_eq!(m[[i, j]], m[[j, i]], epsilon = 1e-12 * scale);
            }
        }
    }

    /// Global displacement of a rigid rotation `omega` about the origin
    fn rigid_rotation(first: Point, last: Point, omega: Point) -> Array1<f64> {
        let mut u = Array1::zeros(12);
        for (node, p) in [first, last].iter().enumerate() {
            let t = omega.cross(p);
            for (i, v) in t.to_array().into_iter().chain(omega.to_array()).enumerate() {
                u[6 * node + i] = v;
            }
        }
        u
    }

    #[test]
    fn test_matrices_are_symmetric() {
        let section = pipe();
        assert_symmetric(&local_stiffness(E, G, &section, 1.5));
        assert_symmetric(&local_mass(7860.0, &section, 7860.0 * section.area, 1.5));
        assert_symmetric(&local_geometric_stiffness(1e4, 1.5));
    }

    #[test]
    fn test_rigid_body_motion_is_stress_free() {
        let first = Point::new(0.3, -0.2, 0.5);
        let last = Point::new(1.1, 0.4, 1.3);
        let delta = last.sub(&first);
        let direction = delta.scale(1.0 / delta.norm());
        let t = transformation_matrix(&direction);
        let k = to_global(&local_stiffness(E, G, &pipe(), delta.norm()), &t);

        let scale = k.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let rotation = rigid_rotation(first, last, Point::new(0.2, -0.7, 0.4));
        let forces = k.dot(&rotation);
        for f in forces.iter() {
            assert!(f.abs() < 1e-9 * scale, "residual force {f}");
        }

        let mut translation = Array1::zeros(12);
        for i in [0, 1, 2, 6, 7, 8] {
            translation[i] = 1.0;
        }
        assert!(k.dot(&translation).iter().all(|f| f.abs() < 1e-9 * scale));
    }

    #[test]
    fn test_mass_conserves_total_mass() {
        let section = pipe();
        let mu = 7860.0 * section.area + 12.0;
        let length = 2.0;
        let m = local_mass(7860.0, &section, mu, length);
        for axis in 0..3 {
            let mut u = Array1::zeros(12);
            u[axis] = 1.0;
            u[6 + axis] = 1.0;
            assert_relative_eq!(u.dot(&m.dot(&u)), mu * length, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_transformation_is_orthogonal() {
        let direction = Point::new(0.0, 0.6, 0.8);
        let t = transformation_matrix(&direction);
        let identity = t.t().dot(&t);
        for i in 0..12 {
            for j in 0..12 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(identity[[i, j]], expected, epsilon = 1e-14);
            }
        }
        assert_eq!(rotation_matrix(&direction)[0], [0.0, 0.6, 0.8]);
    }

    #[test]
    fn test_expansion_joint_has_no_rigid_stiffness() {
        let joint = ExpansionJointStiffness {
            axial: 1e6,
            transversal: 2e6,
            torsional: 3e3,
            bending: 4e3,
        };
        let k = expansion_joint_stiffness(&joint);
        assert_relative_eq!(k[[1, 7]], -2e6);
        assert_relative_eq!(k[[4, 4]], 4e3);
        assert!(k.sum_axis(ndarray::Axis(0)).iter().all(|v| v.abs() < 1e-9));
    }
}
