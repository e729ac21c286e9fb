//! Element-consistent structural stiffness and mass

use super::check_properties;
use crate::attachments::Attachments;
use crate::elements::{StructuralElementMatrices, structural_matrices};
use crate::error::Result;
use crate::mesh::{Element, Mesh, Physics};
use solvers::{CooMatrix, CsrMatrix};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Global structural stiffness and mass
#[derive(Debug, Clone)]
pub struct StructuralMatrices {
    pub stiffness: CsrMatrix<f64>,
    pub mass: CsrMatrix<f64>,
    /// 6 × number of nodes
    pub num_dofs: usize,
}

fn element_block(element: &Element, attachments: &Attachments) -> Result<StructuralElementMatrices> {
    let mut block = structural_matrices(element)?;
    if let Some(mask) = attachments.element_decoupling_mask(element.id) {
        block.apply_mask(&mask);
    }
    Ok(block)
}

#[cfg(feature = "parallel")]
fn element_blocks(elements: &[&Element], attachments: &Attachments) -> Result<Vec<StructuralElementMatrices>> {
    elements
        .par_iter()
        .map(|element| element_block(element, attachments))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn element_blocks(elements: &[&Element], attachments: &Attachments) -> Result<Vec<StructuralElementMatrices>> {
    elements
        .iter()
        .map(|element| element_block(element, attachments))
        .collect()
}

/// Assemble K and M over every element
///
/// Decoupling masks are multiplied into the element matrices before the
/// scatter. Every element must carry a structural kind.
pub fn assemble_structural(mesh: &Mesh, attachments: &Attachments) -> Result<StructuralMatrices> {
    check_properties(mesh, Physics::Structural)?;

    let indexes = mesh.global_structural_indexes()?;
    let elements = indexes
        .element_ids
        .iter()
        .map(|&id| mesh.element(id))
        .collect::<Result<Vec<_>>>()?;
    let blocks = element_blocks(&elements, attachments)?;

    let n = mesh.num_dofs(Physics::Structural);
    let k_values: Vec<f64> = blocks.iter().flat_map(|b| b.stiffness.iter().copied()).collect();
    let m_values: Vec<f64> = blocks.iter().flat_map(|b| b.mass.iter().copied()).collect();

    let mut stiffness = CooMatrix::with_capacity(n, n, k_values.len());
    stiffness.extend_from_arrays(&indexes.rows, &indexes.cols, &k_values);
    let mut mass = CooMatrix::with_capacity(n, n, m_values.len());
    mass.extend_from_arrays(&indexes.rows, &indexes.cols, &m_values);

    let matrices = StructuralMatrices {
        stiffness: stiffness.into_csr(),
        mass: mass.into_csr(),
        num_dofs: n,
    };
    log::debug!(
        "structural assembly: {} DOFs, {} stiffness and {} mass non-zeros",
        n,
        matrices.stiffness.nnz(),
        matrices.mass.nnz()
    );
    Ok(matrices)
}
