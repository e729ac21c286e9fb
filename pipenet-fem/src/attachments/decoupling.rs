//! Rotation decoupling of an element end at a junction
//!
//! Decoupling releases selected rotations (global axes) of one element at one
//! of its end nodes. The release is expressed as a 12×12 mask multiplied
//! entry-wise into the element matrices before scatter: the row and column of
//! every released DOF are zeroed, the diagonal included.
//!
//! All 8 rotation combinations × 2 end positions are built at compile time.

use super::Attachments;
use crate::error::{ConfigError, Result};
use crate::mesh::{EndPosition, Mesh, STRUCTURAL_DOFS_PER_NODE};

/// Entry-wise multiplier of a 12×12 structural element matrix
pub type DecouplingMask = [[f64; 12]; 12];

/// Minimum number of incident elements for a node to be a junction
///
/// A released rotation drops its diagonal term from the element, so only the
/// other incident elements stiffen that DOF. Below three elements a release
/// could leave the rotation with no stiffness at all.
pub const MIN_JUNCTION_ELEMENTS: usize = 3;

/// Masks indexed by `[end position][rotation code]`
pub static DECOUPLING_MASKS: [[DecouplingMask; 8]; 2] = build_mask_table();

/// The identity mask
pub static NO_DECOUPLING: DecouplingMask = [[1.0; 12]; 12];

/// Zero the rows and columns of the released rotations at one element end,
/// diagonal included
const fn build_mask(position: usize, code: usize) -> DecouplingMask {
    let mut mask = [[1.0; 12]; 12];
    let offset = position * STRUCTURAL_DOFS_PER_NODE + 3;
    let mut axis = 0;
    while axis < 3 {
        if code & (1 << axis) != 0 {
            let dof = offset + axis;
            let mut k = 0;
            while k < 12 {
                mask[dof][k] = 0.0;
                mask[k][dof] = 0.0;
                k += 1;
            }
        }
        axis += 1;
    }
    mask
}

const fn build_mask_table() -> [[DecouplingMask; 8]; 2] {
    let mut table = [[[[1.0; 12]; 12]; 8]; 2];
    let mut position = 0;
    while position < 2 {
        let mut code = 0;
        while code < 8 {
            table[position][code] = build_mask(position, code);
            code += 1;
        }
        position += 1;
    }
    table
}

/// Bit code of released rotations: rx → 1, ry → 2, rz → 4
pub const fn rotation_code(rotations: [bool; 3]) -> usize {
    (rotations[0] as usize) | ((rotations[1] as usize) << 1) | ((rotations[2] as usize) << 2)
}

/// Mask for an end position and a set of released rotations
pub fn decoupling_mask(position: EndPosition, rotations: [bool; 3]) -> &'static DecouplingMask {
    &DECOUPLING_MASKS[position.index()][rotation_code(rotations)]
}

/// Registered decoupling of one element end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationDecoupling {
    pub element_id: usize,
    pub node_id: usize,
    pub position: EndPosition,
    /// Released rotations about global x, y, z
    pub rotations: [bool; 3],
}

impl Attachments {
    /// Release rotations of `element_id` at `node_id`
    ///
    /// Only junction nodes (at least three incident elements) accept a
    /// decoupling; elsewhere the identity mask is returned and nothing is
    /// registered. Releasing no rotation clears the registration.
    pub fn set_rotation_decoupling(
        &mut self,
        mesh: &Mesh,
        element_id: usize,
        node_id: usize,
        rotations: [bool; 3],
    ) -> Result<&'static DecouplingMask> {
        let element = mesh.element(element_id)?;
        let position = element.position_of(node_id).ok_or(ConfigError::NotIncident {
            element_id,
            node_id,
        })?;

        let incident = mesh.incident_elements(node_id)?.len();
        if incident < MIN_JUNCTION_ELEMENTS {
            log::warn!(
                "node {node_id} has {incident} incident elements; rotation decoupling of element {element_id} ignored"
            );
            return Ok(&NO_DECOUPLING);
        }

        let key = (element_id, node_id);
        if rotation_code(rotations) == 0 {
            self.decouplings.remove(&key);
            return Ok(&NO_DECOUPLING);
        }

        self.decouplings.insert(
            key,
            RotationDecoupling {
                element_id,
                node_id,
                position,
                rotations,
            },
        );
        Ok(decoupling_mask(position, rotations))
    }

    /// Registered decouplings, ordered by (element, node)
    pub fn decouplings(&self) -> impl Iterator<Item = &RotationDecoupling> {
        self.decouplings.values()
    }

    /// Elements with at least one decoupled end
    pub fn decoupled_elements(&self) -> impl Iterator<Item = usize> + '_ {
        let mut last = None;
        self.decouplings.keys().filter_map(move |&(element_id, _)| {
            (last.replace(element_id) != Some(element_id)).then_some(element_id)
        })
    }

    /// Combined mask of both ends of an element, `None` when not decoupled
    pub fn element_decoupling_mask(&self, element_id: usize) -> Option<DecouplingMask> {
        let ends: Vec<&RotationDecoupling> = self
            .decouplings
            .range((element_id, 0)..=(element_id, usize::MAX))
            .map(|(_, d)| d)
            .collect();
        if ends.is_empty() {
            return None;
        }
        let mut combined = NO_DECOUPLING;
        for end in ends {
            let mask = decoupling_mask(end.position, end.rotations);
            for (row, mask_row) in combined.iter_mut().zip(mask) {
                for (value, factor) in row.iter_mut().zip(mask_row) {
                    *value *= factor;
                }
            }
        }
        Some(combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{RawEdge, RawNode};

    fn tee() -> Mesh {
        let nodes = [
            RawNode::new(1, 0.0, 0.0, 0.0),
            RawNode::new(2, 1.0, 0.0, 0.0),
            RawNode::new(3, 2.0, 0.0, 0.0),
            RawNode::new(4, 1.0, 1.0, 0.0),
        ];
        let edges = [RawEdge::new(1, 1, 2), RawEdge::new(2, 2, 3), RawEdge::new(3, 2, 4)];
        Mesh::build(&nodes, &edges).unwrap()
    }

    #[test]
    fn test_masks_are_symmetric_and_zero_released_rows() {
        for position in 0..2 {
            for code in 0..8 {
                let mask = &DECOUPLING_MASKS[position][code];
                for i in 0..12 {
                    for j in 0..12 {
                        assert_eq!(mask[i][j], mask[j][i]);
                    }
                }
                for axis in 0..3 {
                    let dof = position * 6 + 3 + axis;
                    let released = code & (1 << axis) != 0;
                    assert_eq!(mask[dof][dof] == 0.0, released);
                }
            }
        }
        assert_eq!(DECOUPLING_MASKS[0][0], NO_DECOUPLING);
    }

    #[test]
    fn test_mask_touches_only_its_end() {
        let mask = decoupling_mask(EndPosition::Last, [false, false, true]);
        assert_eq!(mask[11][11], 0.0);
        assert_eq!(mask[11][0], 0.0);
        assert_eq!(mask[5][5], 1.0);
        assert_eq!(mask[0][0], 1.0);
    }

    #[test]
    fn test_junction_registration() {
        let mesh = tee();
        let mut attachments = Attachments::new();
        let mask = attachments
            .set_rotation_decoupling(&mesh, 3, 2, [true, false, false])
            .unwrap();
        assert_eq!(mask[3][3], 0.0);
        assert_eq!(attachments.decoupled_elements().collect::<Vec<_>>(), vec![3]);
        assert!(attachments.element_decoupling_mask(3).is_some());
        assert!(attachments.element_decoupling_mask(1).is_none());

        attachments
            .set_rotation_decoupling(&mesh, 3, 2, [false, false, false])
            .unwrap();
        assert_eq!(attachments.decoupled_elements().count(), 0);
    }

    #[test]
    fn test_non_junction_returns_identity() {
        let mesh = tee();
        let mut attachments = Attachments::new();
        let mask = attachments
            .set_rotation_decoupling(&mesh, 3, 4, [true, true, true])
            .unwrap();
        assert_eq!(*mask, NO_DECOUPLING);
        assert_eq!(attachments.decoupled_elements().count(), 0);

        // two elements meeting in a line are not a junction either
        let nodes = [
            RawNode::new(1, 0.0, 0.0, 0.0),
            RawNode::new(2, 1.0, 0.0, 0.0),
            RawNode::new(3, 2.0, 0.0, 0.0),
        ];
        let line = Mesh::build(&nodes, &[RawEdge::new(1, 1, 2), RawEdge::new(2, 2, 3)]).unwrap();
        let mask = attachments
            .set_rotation_decoupling(&line, 2, 2, [true, true, true])
            .unwrap();
        assert_eq!(*mask, NO_DECOUPLING);
        assert_eq!(attachments.decoupled_elements().count(), 0);

        assert!(matches!(
            attachments.set_rotation_decoupling(&mesh, 1, 3, [true, false, false]),
            Err(ConfigError::NotIncident { element_id: 1, node_id: 3 })
        ));
    }
}
