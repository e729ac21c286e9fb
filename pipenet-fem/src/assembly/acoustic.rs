//! Acoustic system assembly
//!
//! Harmonic analyses rebuild the duct blocks at every frequency: the
//! dissipative models, perforated plates and tabulated terminations all depend
//! on it. Modal analyses use the frequency-independent FE matrices.

use crate::attachments::Attachments;
use crate::elements::duct::{
    AcousticBlock, FREQUENCY_EPSILON, division_safe_omega, dynamic_stiffness, end_correction, fe_matrices,
    plate_admittance, propagation,
};
use crate::error::{ConfigError, Result};
use crate::mesh::{Element, Mesh, Physics};
use crate::properties::{AcousticKind, Fluid, RequiredProperty};
use ndarray::Array1;
use num_complex::Complex64;
use solvers::{CooMatrix, CsrMatrix};
use std::collections::BTreeMap;
use std::f64::consts::PI;

/// Acoustic operator and right-hand side of one frequency sample
#[derive(Debug, Clone)]
pub struct AcousticSystem {
    pub matrix: CsrMatrix<Complex64>,
    /// `iω U` at volume-velocity nodes
    pub rhs: Array1<Complex64>,
}

/// Frequency-independent acoustic stiffness and mass
#[derive(Debug, Clone)]
pub struct AcousticFeMatrices {
    pub stiffness: CsrMatrix<f64>,
    pub mass: CsrMatrix<f64>,
    pub num_dofs: usize,
}

/// Fluid and bore of an acoustic element
struct Duct<'a> {
    kind: AcousticKind,
    fluid: &'a Fluid,
    radius: f64,
    area: f64,
}

fn missing(property: RequiredProperty, element: &Element) -> ConfigError {
    ConfigError::MissingProperty {
        property,
        element_ids: vec![element.id],
    }
}

fn duct(element: &Element) -> Result<Duct<'_>> {
    let props = &element.properties;
    let kind = props
        .acoustic_kind
        .ok_or_else(|| missing(RequiredProperty::AcousticKind, element))?;
    let fluid = props
        .fluid
        .as_ref()
        .ok_or_else(|| missing(RequiredProperty::Fluid, element))?;
    let radius = props
        .inner_radius()
        .ok_or_else(|| missing(RequiredProperty::PipeSection, element))?;
    Ok(Duct {
        kind,
        fluid,
        radius,
        area: PI * radius * radius,
    })
}

/// Acoustic length of an element including its end corrections
///
/// A length correction is applied at every end where the element opens onto
/// a wider acoustic neighbour.
pub fn acoustic_length(mesh: &Mesh, element: &Element) -> Result<f64> {
    let Some(correction) = element.properties.length_correction else {
        return Ok(element.length);
    };
    let radius = duct(element)?.radius;
    let mut length = element.length;
    for node_id in [element.first_node, element.last_node] {
        let widest = mesh
            .incident_elements(node_id)?
            .into_iter()
            .filter(|e| e.id != element.id && e.properties.is_acoustic())
            .filter_map(|e| e.properties.inner_radius())
            .fold(0.0, f64::max);
        length += end_correction(correction, radius, widest);
    }
    Ok(length)
}

/// Dynamic stiffness (or plate admittance) of one element at `frequency`
pub fn acoustic_element_block(
    mesh: &Mesh,
    element: &Element,
    frequency: f64,
    loss_factor: f64,
) -> Result<AcousticBlock> {
    let duct = duct(element)?;
    if let Some(plate) = &element.properties.perforated_plate {
        return Ok(plate_admittance(plate, duct.fluid, duct.area, frequency));
    }
    let omega = division_safe_omega(frequency);
    let prop = propagation(duct.kind, duct.fluid, duct.radius, omega, loss_factor);
    Ok(dynamic_stiffness(&prop, duct.area, acoustic_length(mesh, element)?))
}

/// First acoustic element touching a node
pub fn terminating_element<'a>(mesh: &'a Mesh, node_id: usize) -> Result<Option<&'a Element>> {
    Ok(mesh
        .incident_elements(node_id)?
        .into_iter()
        .find(|e| e.properties.is_acoustic()))
}

/// Assemble the acoustic system at `frequency` (Hz)
///
/// `loss_factor` is the hysteretic loss of plane-wave elements. Terminations
/// add `iω A / Z` on their diagonal, with the bore and fluid of the first
/// acoustic element at the node; volume velocities load the right-hand side.
pub fn assemble_acoustic(
    mesh: &Mesh,
    attachments: &Attachments,
    frequency: f64,
    loss_factor: f64,
) -> Result<AcousticSystem> {
    let indexes = mesh.global_acoustic_indexes()?;
    let n = mesh.num_dofs(Physics::Acoustic);

    let mut values = Vec::with_capacity(indexes.rows.len());
    for &id in &indexes.element_ids {
        let block = acoustic_element_block(mesh, mesh.element(id)?, frequency, loss_factor)?;
        values.extend(block.iter().flatten().copied());
    }
    let mut coo = CooMatrix::with_capacity(n, n, values.len() + n);
    coo.extend_from_arrays(&indexes.rows, &indexes.cols, &values);

    let safe_omega = division_safe_omega(frequency);
    for (node_id, termination) in attachments.terminations() {
        let Some(element) = terminating_element(mesh, node_id)? else {
            continue;
        };
        let duct = duct(element)?;
        let ka = safe_omega / duct.fluid.speed_of_sound * duct.radius;
        let impedance = termination.specific_impedance(frequency, duct.fluid.impedance(), ka);
        let dof = mesh.node(node_id)?.acoustic_dof();
        coo.push(dof, dof, Complex64::new(0.0, safe_omega * duct.area) / impedance);
    }

    let omega = 2.0 * PI * frequency;
    let mut rhs = Array1::zeros(n);
    for (node_id, value) in attachments.volume_velocities() {
        let dof = mesh.node(node_id)?.acoustic_dof();
        rhs[dof] += Complex64::new(0.0, omega) * value.evaluate(frequency);
    }

    Ok(AcousticSystem {
        matrix: coo.into_csr(),
        rhs,
    })
}

/// Assemble the real acoustic FE matrices
///
/// Perforated plates and terminations are dissipative and left out; plate
/// elements act as plain ducts.
pub fn assemble_acoustic_fe(mesh: &Mesh) -> Result<AcousticFeMatrices> {
    let indexes = mesh.global_acoustic_indexes()?;
    let n = mesh.num_dofs(Physics::Acoustic);

    let mut k_values = Vec::with_capacity(indexes.rows.len());
    let mut m_values = Vec::with_capacity(indexes.rows.len());
    for &id in &indexes.element_ids {
        let element = mesh.element(id)?;
        let duct = duct(element)?;
        let (k, m) = fe_matrices(duct.fluid, duct.area, acoustic_length(mesh, element)?);
        k_values.extend(k.iter().flatten().copied());
        m_values.extend(m.iter().flatten().copied());
    }

    let mut stiffness = CooMatrix::with_capacity(n, n, k_values.len());
    stiffness.extend_from_arrays(&indexes.rows, &indexes.cols, &k_values);
    let mut mass = CooMatrix::with_capacity(n, n, m_values.len());
    mass.extend_from_arrays(&indexes.rows, &indexes.cols, &m_values);

    Ok(AcousticFeMatrices {
        stiffness: stiffness.into_csr(),
        mass: mass.into_csr(),
        num_dofs: n,
    })
}

/// Prescribed acoustic values at `frequency`, sorted by DOF
///
/// Nodes outside every acoustic element are held at zero pressure;
/// prescribed pressures take their tabulated value.
pub fn acoustic_prescribed_values(
    mesh: &Mesh,
    attachments: &Attachments,
    frequency: f64,
) -> Result<Vec<(usize, Complex64)>> {
    let mut values: BTreeMap<usize, Complex64> = mesh
        .orphan_acoustic_dofs()
        .into_iter()
        .map(|dof| (dof, Complex64::new(0.0, 0.0)))
        .collect();
    for (node_id, value) in attachments.acoustic_pressures() {
        values.insert(mesh.node(node_id)?.acoustic_dof(), value.evaluate(frequency));
    }
    Ok(values.into_iter().collect())
}

/// DOFs eliminated from the acoustic system
pub fn acoustic_prescribed_dofs(mesh: &Mesh, attachments: &Attachments) -> Result<Vec<usize>> {
    Ok(acoustic_prescribed_values(mesh, attachments, FREQUENCY_EPSILON)?
        .into_iter()
        .map(|(dof, _)| dof)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachments::{BcValue, RadiationKind};
    use crate::mesh::{RawEdge, RawNode};
    use crate::properties::{CrossSection, LengthCorrection};
    use approx::assert_relative_eq;
    use solvers::lu_solve;

    fn duct_line(lengths: &[f64]) -> Mesh {
        let mut x = 0.0;
        let mut nodes = vec![RawNode::new(0, 0.0, 0.0, 0.0)];
        for (i, l) in lengths.iter().enumerate() {
            x += l;
            nodes.push(RawNode::new(i + 1, x, 0.0, 0.0));
        }
        let edges: Vec<RawEdge> = (0..lengths.len()).map(|i| RawEdge::new(i, i, i + 1)).collect();
        let mut mesh = Mesh::build(&nodes, &edges).unwrap();
        mesh.update_all_properties(|p| {
            p.acoustic_kind = Some(AcousticKind::PlaneWave);
            p.fluid = Some(Fluid::air());
            p.section = Some(CrossSection::pipe(0.1, 0.005));
        });
        mesh
    }

    #[test]
    fn test_anechoic_end_gives_characteristic_input_impedance() {
        let mesh = duct_line(&[0.4, 0.3, 0.5]);
        let mut attachments = Attachments::new();
        let u = 1e-3;
        attachments.set_volume_velocity(&mesh, 0, Some(BcValue::real(u))).unwrap();
        attachments
            .set_radiation_impedance(&mesh, 3, Some(RadiationKind::Anechoic))
            .unwrap();

        let system = assemble_acoustic(&mesh, &attachments, 250.0, 0.0).unwrap();
        let p = lu_solve(&system.matrix.to_dense(), &system.rhs).unwrap();

        let air = Fluid::air();
        let area = PI * 0.045 * 0.045;
        let inlet = p[mesh.node(0).unwrap().acoustic_dof()];
        let outlet = p[mesh.node(3).unwrap().acoustic_dof()];
        assert_relative_eq!(inlet.re, air.impedance() * u / area, max_relative = 1e-8);
        assert_relative_eq!(inlet.im, 0.0, epsilon = 1e-8 * inlet.re);
        assert_relative_eq!(outlet.norm(), inlet.norm(), max_relative = 1e-8);
    }

    #[test]
    fn test_orphan_nodes_and_pressures_are_prescribed() {
        let mut mesh = duct_line(&[0.4, 0.3]);
        mesh.update_properties(&[1], |p| p.acoustic_kind = None).unwrap();
        let mut attachments = Attachments::new();
        attachments
            .set_acoustic_pressure(&mesh, 0, Some(BcValue::complex(2.0, 1.0)))
            .unwrap();

        let values = acoustic_prescribed_values(&mesh, &attachments, 10.0).unwrap();
        let orphan = mesh.node(2).unwrap().acoustic_dof();
        let source = mesh.node(0).unwrap().acoustic_dof();
        assert!(values.contains(&(orphan, Complex64::new(0.0, 0.0))));
        assert!(values.contains(&(source, Complex64::new(2.0, 1.0))));
        assert_eq!(acoustic_prescribed_dofs(&mesh, &attachments).unwrap().len(), 2);
    }

    #[test]
    fn test_expansion_correction_lengthens_narrow_duct() {
        let mut mesh = duct_line(&[0.4, 0.3]);
        mesh.set_cross_section(&[0], &CrossSection::pipe(0.05, 0.002)).unwrap();
        mesh.update_properties(&[0], |p| p.length_correction = Some(LengthCorrection::Expansion))
            .unwrap();

        let narrow = mesh.element(0).unwrap();
        let length = acoustic_length(&mesh, narrow).unwrap();
        let expected = 0.4 + end_correction(LengthCorrection::Expansion, 0.023, 0.045);
        assert_relative_eq!(length, expected, epsilon = 1e-12);
        assert!(length > 0.4);
        // the wide neighbour is not corrected
        let wide = acoustic_length(&mesh, mesh.element(1).unwrap()).unwrap();
        assert_relative_eq!(wide, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_fe_matrices_are_symmetric_and_conservative() {
        let mesh = duct_line(&[0.4, 0.3, 0.5]);
        let fe = assemble_acoustic_fe(&mesh).unwrap();
        assert!(fe.stiffness.is_symmetric(1e-18));
        let ones = Array1::from_elem(fe.num_dofs, 1.0);
        assert!(fe.stiffness.matvec(&ones).iter().all(|v| v.abs() < 1e-15));
        let air = Fluid::air();
        let volume = PI * 0.045 * 0.045 * 1.2;
        assert_relative_eq!(ones.dot(&fe.mass.matvec(&ones)), volume / air.bulk_modulus(), max_relative = 1e-12);
    }
}
