//! Support reactions recovered from a structural sweep
//!
//! Reactions are reported per node as a `frequencies × 6` complex array.
//! Rows of unsolved samples hold NaN.

use super::sweep::CollectedField;
use crate::assembly::DofPartition;
use crate::attachments::{DofValues, NodalCategory};
use crate::error::Result;
use crate::model::PipeModel;
use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;

/// Node id → `frequencies × 6` reaction array
pub type NodalReactions = BTreeMap<usize, Array2<Complex64>>;

/// Forces and moments exerted by supports on the structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reactions {
    /// `(A u − F)` at prescribed DOFs; zero at the node's free DOFs
    pub prescribed: NodalReactions,
    /// `−k u` of lumped springs
    pub springs: NodalReactions,
    /// `−iω c u` of lumped dampers
    pub dampers: NodalReactions,
}

impl Reactions {
    pub fn is_empty(&self) -> bool {
        self.prescribed.is_empty() && self.springs.is_empty() && self.dampers.is_empty()
    }
}

fn nan_row(array: &mut Array2<Complex64>, row: usize) {
    array.row_mut(row).fill(Complex64::new(f64::NAN, f64::NAN));
}

/// Reactions of lumped elements: `−factor(ω) · value · u` per DOF
fn lumped_reactions<'a>(
    model: &PipeModel,
    entries: impl Iterator<Item = (usize, &'a DofValues)>,
    frequencies: &[f64],
    collected: &CollectedField,
    factor: impl Fn(f64) -> Complex64,
) -> Result<NodalReactions> {
    let mut reactions = NodalReactions::new();
    for (node_id, values) in entries {
        let dofs = model.mesh.node(node_id)?.structural_dofs();
        let mut array = Array2::zeros((frequencies.len(), dofs.len()));
        for (row, &frequency) in frequencies.iter().enumerate() {
            if !collected.solved[row] {
                nan_row(&mut array, row);
                continue;
            }
            let omega = 2.0 * PI * frequency;
            for (col, value) in values.evaluate(frequency).into_iter().enumerate() {
                if let Some(value) = value {
                    array[[row, col]] = -factor(omega) * value * collected.field[[dofs[col], row]];
                }
            }
        }
        reactions.insert(node_id, array);
    }
    Ok(reactions)
}

/// Reactions of every support of a structural sweep
pub(crate) fn structural_reactions(
    model: &PipeModel,
    partition: &DofPartition,
    frequencies: &[f64],
    collected: &CollectedField,
) -> Result<Reactions> {
    let attachments = &model.attachments;

    let mut prescribed = NodalReactions::new();
    for node_id in attachments.nodes_with_prescribed_dofs() {
        let dofs = model.mesh.node(node_id)?.structural_dofs();
        let mut array = Array2::zeros((frequencies.len(), dofs.len()));
        for row in 0..frequencies.len() {
            let Some(forces) = &collected.prescribed_forces[row] else {
                nan_row(&mut array, row);
                continue;
            };
            for (col, dof) in dofs.iter().enumerate() {
                if let Ok(position) = partition.prescribed.binary_search(dof) {
                    array[[row, col]] = forces[position];
                }
            }
        }
        prescribed.insert(node_id, array);
    }

    let springs = lumped_reactions(
        model,
        attachments.nodal_entries(NodalCategory::LumpedSprings),
        frequencies,
        collected,
        |_| Complex64::new(1.0, 0.0),
    )?;
    let dampers = lumped_reactions(
        model,
        attachments.nodal_entries(NodalCategory::LumpedDampers),
        frequencies,
        collected,
        |omega| Complex64::new(0.0, omega),
    )?;

    Ok(Reactions {
        prescribed,
        springs,
        dampers,
    })
}
