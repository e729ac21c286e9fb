//! Point attachments of the structural system
//!
//! Lumped masses, springs, dampers and elastic links are kept out of the
//! element-consistent matrices so reactions can separate them.

use crate::attachments::{Attachments, DofValues, NodalCategory};
use crate::error::Result;
use crate::mesh::{Mesh, Physics};
use ndarray::Array1;
use num_complex::Complex64;
use solvers::{CooMatrix, CsrMatrix};

/// Lumped stiffness, mass and damping at one frequency
#[derive(Debug, Clone)]
pub struct LumpedMatrices {
    pub stiffness: CsrMatrix<Complex64>,
    pub mass: CsrMatrix<Complex64>,
    pub damping: CsrMatrix<Complex64>,
}

impl LumpedMatrices {
    /// Real parts, as used by undamped eigenproblems
    pub fn real_parts(&self) -> (CsrMatrix<f64>, CsrMatrix<f64>) {
        (self.stiffness.map(|v| v.re), self.mass.map(|v| v.re))
    }
}

fn push_diagonal<'a>(
    coo: &mut CooMatrix<Complex64>,
    mesh: &Mesh,
    entries: impl Iterator<Item = (usize, &'a DofValues)>,
    frequency: f64,
) -> Result<()> {
    for (node_id, values) in entries {
        let dofs = mesh.node(node_id)?.structural_dofs();
        for (dof, value) in dofs.iter().zip(values.evaluate(frequency)) {
            if let Some(value) = value {
                coo.push(*dof, *dof, value);
            }
        }
    }
    Ok(())
}

fn push_links<'a>(
    coo: &mut CooMatrix<Complex64>,
    mesh: &Mesh,
    links: impl Iterator<Item = ((usize, usize), &'a DofValues)>,
    frequency: f64,
) -> Result<()> {
    for ((first, last), values) in links {
        let a = mesh.node(first)?.structural_dofs();
        let b = mesh.node(last)?.structural_dofs();
        for (i, value) in values.evaluate(frequency).into_iter().enumerate() {
            let Some(value) = value else { continue };
            coo.push(a[i], a[i], value);
            coo.push(b[i], b[i], value);
            coo.push(a[i], b[i], -value);
            coo.push(b[i], a[i], -value);
        }
    }
    Ok(())
}

/// Assemble the lumped matrices at `frequency` (Hz)
///
/// Springs and stiffness links feed the stiffness, masses the mass, dampers
/// and damping links the damping.
pub fn assemble_lumped(mesh: &Mesh, attachments: &Attachments, frequency: f64) -> Result<LumpedMatrices> {
    let n = mesh.num_dofs(Physics::Structural);

    let mut stiffness = CooMatrix::new(n, n);
    push_diagonal(
        &mut stiffness,
        mesh,
        attachments.nodal_entries(NodalCategory::LumpedSprings),
        frequency,
    )?;
    push_links(&mut stiffness, mesh, attachments.elastic_links_stiffness(), frequency)?;

    let mut mass = CooMatrix::new(n, n);
    push_diagonal(
        &mut mass,
        mesh,
        attachments.nodal_entries(NodalCategory::LumpedMasses),
        frequency,
    )?;

    let mut damping = CooMatrix::new(n, n);
    push_diagonal(
        &mut damping,
        mesh,
        attachments.nodal_entries(NodalCategory::LumpedDampers),
        frequency,
    )?;
    push_links(&mut damping, mesh, attachments.elastic_links_damping(), frequency)?;

    Ok(LumpedMatrices {
        stiffness: stiffness.into_csr(),
        mass: mass.into_csr(),
        damping: damping.into_csr(),
    })
}

/// Global nodal load vector at `frequency`
pub fn nodal_load_vector(mesh: &Mesh, attachments: &Attachments, frequency: f64) -> Result<Array1<Complex64>> {
    let mut loads = Array1::zeros(mesh.num_dofs(Physics::Structural));
    for (node_id, values) in attachments.nodal_entries(NodalCategory::NodalLoads) {
        let dofs = mesh.node(node_id)?.structural_dofs();
        for (dof, value) in dofs.iter().zip(values.evaluate(frequency)) {
            if let Some(value) = value {
                loads[*dof] += value;
            }
        }
    }
    Ok(loads)
}

/// Prescribed structural values at `frequency`, sorted by global DOF
pub fn prescribed_structural_values(
    mesh: &Mesh,
    attachments: &Attachments,
    frequency: f64,
) -> Result<Vec<(usize, Complex64)>> {
    let mut values = Vec::new();
    for (node_id, record) in attachments.nodal_entries(NodalCategory::PrescribedDofs) {
        let dofs = mesh.node(node_id)?.structural_dofs();
        for (dof, value) in dofs.iter().zip(record.evaluate(frequency)) {
            if let Some(value) = value {
                values.push((*dof, value));
            }
        }
    }
    values.sort_unstable_by_key(|&(dof, _)| dof);
    Ok(values)
}
