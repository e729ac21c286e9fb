//! Fluid pressure load on the structure
//!
//! The acoustic pressure at a node pushes on the bore of every fluid-filled
//! element meeting there. Along a straight run the thrusts cancel; at bends,
//! reducers and capped ends a net force remains.

use crate::error::Result;
use crate::mesh::{Mesh, Physics};
use solvers::{CooMatrix, CsrMatrix};
use std::f64::consts::PI;

/// Assemble the coupling block `G` (structural DOFs × acoustic DOFs)
///
/// Column `n` holds `−A_e t̂_e` summed over the fluid-filled elements `e` at
/// node `n`, with `t̂_e` pointing from the node into the element. A node
/// reached by a single fluid-filled element only carries a load when that
/// element is capped.
pub fn assemble_coupling(mesh: &Mesh) -> Result<CsrMatrix<f64>> {
    let mut coo = CooMatrix::new(mesh.num_dofs(Physics::Structural), mesh.num_dofs(Physics::Acoustic));

    for node in mesh.nodes() {
        let filled: Vec<_> = mesh
            .incident_elements(node.id)?
            .into_iter()
            .filter(|e| e.properties.is_fluid_filled())
            .collect();
        if filled.len() == 1 && !filled[0].properties.capped_end {
            continue;
        }

        let mut thrust = [0.0; 3];
        let mut total_area = 0.0;
        for element in filled {
            let (Some(radius), Some(inward)) = (element.properties.inner_radius(), element.inward_direction(node.id))
            else {
                continue;
            };
            let area = PI * radius * radius;
            total_area += area;
            for (t, d) in thrust.iter_mut().zip(inward.to_array()) {
                *t -= area * d;
            }
        }

        let dofs = node.structural_dofs();
        let pressure = node.acoustic_dof();
        for (axis, value) in thrust.into_iter().enumerate() {
            if value.abs() > 1e-12 * total_area {
                coo.push(dofs[axis], pressure, value);
            }
        }
    }

    Ok(coo.into_csr())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{RawEdge, RawNode};
    use crate::properties::{AcousticKind, CrossSection, Fluid, Material, StructuralKind};
    use approx::assert_relative_eq;

    fn filled(nodes: &[RawNode], edges: &[RawEdge]) -> Mesh {
        let mut mesh = Mesh::build(nodes, edges).unwrap();
        mesh.update_all_properties(|p| {
            p.structural_kind = Some(StructuralKind::Pipe);
            p.acoustic_kind = Some(AcousticKind::PlaneWave);
            p.material = Some(Material::steel());
            p.fluid = Some(Fluid::water());
            p.section = Some(CrossSection::pipe(0.1, 0.005));
        });
        mesh
    }

    fn bore() -> f64 {
        PI * 0.045 * 0.045
    }

    #[test]
    fn test_straight_run_cancels_and_open_ends_are_free() {
        let nodes: Vec<RawNode> = (0..4).map(|i| RawNode::new(i, i as f64, 0.0, 0.0)).collect();
        let edges: Vec<RawEdge> = (0..3).map(|i| RawEdge::new(i, i, i + 1)).collect();
        let mesh = filled(&nodes, &edges);
        let g = assemble_coupling(&mesh).unwrap();
        assert_eq!(g.num_rows, 24);
        assert_eq!(g.num_cols, 4);
        assert_eq!(g.nnz(), 0);
    }

    #[test]
    fn test_bend_thrust_points_out_of_the_corner() {
        let nodes = [
            RawNode::new(1, 0.0, 0.0, 0.0),
            RawNode::new(2, 1.0, 0.0, 0.0),
            RawNode::new(3, 1.0, 1.0, 0.0),
        ];
        let mesh = filled(&nodes, &[RawEdge::new(1, 1, 2), RawEdge::new(2, 2, 3)]);
        let g = assemble_coupling(&mesh).unwrap();

        let corner = mesh.node(2).unwrap();
        let [ux, uy, uz, ..] = corner.structural_dofs();
        let p = corner.acoustic_dof();
        assert_relative_eq!(g.get(ux, p), bore(), max_relative = 1e-12);
        assert_relative_eq!(g.get(uy, p), -bore(), max_relative = 1e-12);
        assert_eq!(g.get(uz, p), 0.0);
        assert_eq!(g.nnz(), 2);
    }

    #[test]
    fn test_capped_dead_end_is_pushed_outward() {
        let nodes = [RawNode::new(1, 0.0, 0.0, 0.0), RawNode::new(2, 0.0, 0.0, 2.0)];
        let mut mesh = filled(&nodes, &[RawEdge::new(7, 1, 2)]);
        mesh.update_properties(&[7], |p| p.capped_end = true).unwrap();
        let g = assemble_coupling(&mesh).unwrap();

        let top = mesh.node(2).unwrap();
        assert_relative_eq!(g.get(top.structural_dofs()[2], top.acoustic_dof()), bore(), max_relative = 1e-12);
        let bottom = mesh.node(1).unwrap();
        assert_relative_eq!(
            g.get(bottom.structural_dofs()[2], bottom.acoustic_dof()),
            -bore(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_dry_elements_carry_no_thrust() {
        let nodes = [
            RawNode::new(1, 0.0, 0.0, 0.0),
            RawNode::new(2, 1.0, 0.0, 0.0),
            RawNode::new(3, 1.0, 1.0, 0.0),
        ];
        let mut mesh = filled(&nodes, &[RawEdge::new(1, 1, 2), RawEdge::new(2, 2, 3)]);
        mesh.update_all_properties(|p| p.acoustic_kind = None);
        assert_eq!(assemble_coupling(&mesh).unwrap().nnz(), 0);
    }
}
