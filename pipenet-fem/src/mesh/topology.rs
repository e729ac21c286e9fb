//! Mesh construction, depth-first global ordering and index helpers

use super::types::*;
use crate::error::{ConfigError, Result};
use crate::properties::{AcousticKind, CrossSection, ElementProperties, Fluid, Material, StructuralKind};
use ndarray::{Array2, Array3};
use std::collections::HashMap;

/// Row/column COO indices of every element block of one system
///
/// `rows` and `cols` hold `n_elements × d × d` entries in element order, with
/// `d` the local DOF count (12 structural, 2 acoustic). Element values laid out
/// the same way can be scattered without further bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalIndexes {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
    /// Element ids in block order
    pub element_ids: Vec<usize>,
    /// Local DOFs per element
    pub block_size: usize,
}

/// Piping network mesh
///
/// Nodes are stored in an arena indexed by their global index; external ids
/// are resolved through hash lookups.
#[derive(Debug, Clone)]
pub struct Mesh {
    nodes: Vec<Node>,
    node_lookup: HashMap<usize, usize>,
    elements: Vec<Element>,
    element_lookup: HashMap<usize, usize>,
    /// Element positions incident to each global index, in edge order
    incidence: Vec<Vec<usize>>,
}

impl Mesh {
    /// Build a mesh from raw nodes and edges
    ///
    /// Global indices follow an iterative depth-first traversal starting at
    /// the first raw node, visiting neighbours in edge insertion order.
    pub fn build(raw_nodes: &[RawNode], raw_edges: &[RawEdge]) -> Result<Self> {
        if raw_nodes.is_empty() {
            return Err(ConfigError::EmptyMesh);
        }

        let mut raw_position = HashMap::with_capacity(raw_nodes.len());
        for (pos, node) in raw_nodes.iter().enumerate() {
            if raw_position.insert(node.id, pos).is_some() {
                return Err(ConfigError::DuplicateNode { node_id: node.id });
            }
        }

        let mut seen_edges = HashMap::with_capacity(raw_edges.len());
        let mut degenerate = Vec::new();
        let mut adjacency = vec![Vec::new(); raw_nodes.len()];
        for (pos, edge) in raw_edges.iter().enumerate() {
            if seen_edges.insert(edge.id, pos).is_some() {
                return Err(ConfigError::DuplicateElement { element_id: edge.id });
            }
            let first = *raw_position
                .get(&edge.first)
                .ok_or(ConfigError::UnknownNode { node_id: edge.first })?;
            let last = *raw_position
                .get(&edge.last)
                .ok_or(ConfigError::UnknownNode { node_id: edge.last })?;
            let a = &raw_nodes[first];
            let b = &raw_nodes[last];
            let length = Point::new(a.x, a.y, a.z).distance(&Point::new(b.x, b.y, b.z));
            if first == last || length <= 0.0 {
                degenerate.push(edge.id);
                continue;
            }
            adjacency[first].push(last);
            adjacency[last].push(first);
        }
        if !degenerate.is_empty() {
            return Err(ConfigError::DegenerateElements {
                element_ids: degenerate,
            });
        }

        let order = depth_first_order(&adjacency);
        let unreachable: Vec<usize> = order
            .iter()
            .zip(raw_nodes)
            .filter(|(index, _)| index.is_none())
            .map(|(_, node)| node.id)
            .collect();
        if !unreachable.is_empty() {
            return Err(ConfigError::DisconnectedMesh {
                start: raw_nodes[0].id,
                node_ids: unreachable,
            });
        }

        let mut nodes: Vec<Node> = raw_nodes
            .iter()
            .zip(&order)
            .map(|(raw, index)| Node {
                id: raw.id,
                global_index: index.unwrap_or_default(),
                coordinates: Point::new(raw.x, raw.y, raw.z),
            })
            .collect();
        nodes.sort_by_key(|n| n.global_index);
        let node_lookup: HashMap<usize, usize> = nodes.iter().map(|n| (n.id, n.global_index)).collect();

        let mut elements = Vec::with_capacity(raw_edges.len());
        let mut element_lookup = HashMap::with_capacity(raw_edges.len());
        let mut incidence = vec![Vec::new(); nodes.len()];
        for edge in raw_edges {
            let first_index = node_lookup[&edge.first];
            let last_index = node_lookup[&edge.last];
            let delta = nodes[last_index].coordinates.sub(&nodes[first_index].coordinates);
            let length = delta.norm();
            let position = elements.len();
            incidence[first_index].push(position);
            incidence[last_index].push(position);
            element_lookup.insert(edge.id, position);
            elements.push(Element {
                id: edge.id,
                first_node: edge.first,
                last_node: edge.last,
                first_index,
                last_index,
                length,
                direction: delta.scale(1.0 / length),
                properties: ElementProperties::default(),
            });
        }

        log::info!(
            "Mesh built: {} nodes, {} elements",
            nodes.len(),
            elements.len()
        );

        Ok(Self {
            nodes,
            node_lookup,
            elements,
            element_lookup,
            incidence,
        })
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    /// Total DOF count of a system
    pub fn num_dofs(&self, physics: Physics) -> usize {
        self.nodes.len() * physics.dofs_per_node()
    }

    /// Nodes in global-index order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Elements in edge insertion order
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Elements taking part in the structural system
    pub fn structural_elements(&self) -> impl Iterator<Item = &Element> {
        self.elements
            .iter()
            .filter(|e| e.properties.structural_kind.is_some())
    }

    /// Elements taking part in the acoustic system
    pub fn acoustic_elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(|e| e.properties.is_acoustic())
    }

    /// Node by external id
    pub fn node(&self, node_id: usize) -> Result<&Node> {
        self.node_lookup
            .get(&node_id)
            .map(|&index| &self.nodes[index])
            .ok_or(ConfigError::UnknownNode { node_id })
    }

    /// Node by global index
    pub fn node_at(&self, global_index: usize) -> Option<&Node> {
        self.nodes.get(global_index)
    }

    /// Global index of a node id
    pub fn global_index(&self, node_id: usize) -> Result<usize> {
        self.node(node_id).map(|n| n.global_index)
    }

    pub fn contains_node(&self, node_id: usize) -> bool {
        self.node_lookup.contains_key(&node_id)
    }

    /// Element by external id
    pub fn element(&self, element_id: usize) -> Result<&Element> {
        self.element_lookup
            .get(&element_id)
            .map(|&pos| &self.elements[pos])
            .ok_or(ConfigError::UnknownElement { element_id })
    }

    fn element_mut(&mut self, element_id: usize) -> Result<&mut Element> {
        let pos = *self
            .element_lookup
            .get(&element_id)
            .ok_or(ConfigError::UnknownElement { element_id })?;
        Ok(&mut self.elements[pos])
    }

    /// Elements touching a node, in edge insertion order
    pub fn incident_elements(&self, node_id: usize) -> Result<Vec<&Element>> {
        let index = self.global_index(node_id)?;
        Ok(self.incidence[index].iter().map(|&pos| &self.elements[pos]).collect())
    }

    /// Node ids adjacent to a node, in edge insertion order
    pub fn neighbours(&self, node_id: usize) -> Result<Vec<usize>> {
        Ok(self
            .incident_elements(node_id)?
            .into_iter()
            .filter_map(|e| e.other_node(node_id))
            .collect())
    }

    /// Apply `update` to the properties of every listed element
    ///
    /// All ids are checked before anything is modified.
    pub fn update_properties<F>(&mut self, element_ids: &[usize], mut update: F) -> Result<()>
    where
        F: FnMut(&mut ElementProperties),
    {
        for &id in element_ids {
            self.element(id)?;
        }
        for &id in element_ids {
            update(&mut self.element_mut(id)?.properties);
        }
        Ok(())
    }

    /// Apply `update` to the properties of every element
    pub fn update_all_properties<F>(&mut self, mut update: F)
    where
        F: FnMut(&mut ElementProperties),
    {
        for element in &mut self.elements {
            update(&mut element.properties);
        }
    }

    pub fn set_structural_kind(&mut self, element_ids: &[usize], kind: StructuralKind) -> Result<()> {
        self.update_properties(element_ids, |p| p.structural_kind = Some(kind.clone()))
    }

    pub fn set_acoustic_kind(&mut self, element_ids: &[usize], kind: AcousticKind) -> Result<()> {
        self.update_properties(element_ids, |p| p.acoustic_kind = Some(kind))
    }

    pub fn set_material(&mut self, element_ids: &[usize], material: &Material) -> Result<()> {
        self.update_properties(element_ids, |p| p.material = Some(material.clone()))
    }

    pub fn set_fluid(&mut self, element_ids: &[usize], fluid: &Fluid) -> Result<()> {
        self.update_properties(element_ids, |p| p.fluid = Some(fluid.clone()))
    }

    pub fn set_cross_section(&mut self, element_ids: &[usize], section: &CrossSection) -> Result<()> {
        self.update_properties(element_ids, |p| p.section = Some(section.clone()))
    }

    /// `n_elements × 3` table of `[element id, first global index, last global index]`
    pub fn connectivity_matrix(&self) -> Array2<usize> {
        Array2::from_shape_fn((self.elements.len(), 3), |(row, col)| {
            let e = &self.elements[row];
            match col {
                0 => e.id,
                1 => e.first_index,
                _ => e.last_index,
            }
        })
    }

    /// `n_nodes × 4` table of `[global index, x, y, z]`, sorted by global index
    pub fn nodal_coordinates_matrix(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.nodes.len(), 4), |(row, col)| {
            let n = &self.nodes[row];
            match col {
                0 => n.global_index as f64,
                1 => n.coordinates.x,
                2 => n.coordinates.y,
                _ => n.coordinates.z,
            }
        })
    }

    /// COO indices of the element blocks of `element_ids` in one system
    ///
    /// Row indices repeat each element DOF along the block row
    /// (`dofs ⊗ 1ᵀ`), column indices tile the DOF vector (`1 ⊗ dofsᵀ`).
    pub fn global_indexes(&self, physics: Physics, element_ids: &[usize]) -> Result<GlobalIndexes> {
        let d = physics.dofs_per_element();
        let n = element_ids.len();
        let mut dofs = Array2::<usize>::zeros((n, d));
        for (row, &id) in element_ids.iter().enumerate() {
            for (col, dof) in self.element(id)?.dofs(physics).into_iter().enumerate() {
                dofs[[row, col]] = dof;
            }
        }

        let rows = Array3::from_shape_fn((n, d, d), |(e, a, _)| dofs[[e, a]]);
        let cols = Array3::from_shape_fn((n, d, d), |(e, _, b)| dofs[[e, b]]);

        Ok(GlobalIndexes {
            rows: rows.iter().copied().collect(),
            cols: cols.iter().copied().collect(),
            element_ids: element_ids.to_vec(),
            block_size: d,
        })
    }

    /// [`Mesh::global_indexes`] over every structural element
    pub fn global_structural_indexes(&self) -> Result<GlobalIndexes> {
        let ids: Vec<usize> = self.structural_elements().map(|e| e.id).collect();
        self.global_indexes(Physics::Structural, &ids)
    }

    /// [`Mesh::global_indexes`] over every acoustic element
    pub fn global_acoustic_indexes(&self) -> Result<GlobalIndexes> {
        let ids: Vec<usize> = self.acoustic_elements().map(|e| e.id).collect();
        self.global_indexes(Physics::Acoustic, &ids)
    }

    /// Acoustic DOFs of nodes that no acoustic element touches
    pub fn orphan_acoustic_dofs(&self) -> Vec<usize> {
        self.incidence
            .iter()
            .enumerate()
            .filter(|(_, incident)| {
                !incident
                    .iter()
                    .any(|&pos| self.elements[pos].properties.is_acoustic())
            })
            .map(|(index, _)| index)
            .collect()
    }
}

/// Iterative depth-first ordering from raw position 0
///
/// Returns the global index assigned to every raw position, `None` for nodes
/// the traversal never reaches.
fn depth_first_order(adjacency: &[Vec<usize>]) -> Vec<Option<usize>> {
    let mut order = vec![None; adjacency.len()];
    let mut counter = 0;
    let mut stack = vec![0];
    while let Some(v) = stack.pop() {
        if order[v].is_some() {
            continue;
        }
        order[v] = Some(counter);
        counter += 1;
        // reversed so the first neighbour is popped first
        for &w in adjacency[v].iter().rev() {
            if order[w].is_none() {
                stack.push(w);
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tee() -> Mesh {
        // 1 - 2 - 3 with a branch 2 - 4
        let nodes = [
            RawNode::new(1, 0.0, 0.0, 0.0),
            RawNode::new(2, 1.0, 0.0, 0.0),
            RawNode::new(3, 2.0, 0.0, 0.0),
            RawNode::new(4, 1.0, 1.0, 0.0),
        ];
        let edges = [RawEdge::new(10, 1, 2), RawEdge::new(11, 2, 4), RawEdge::new(12, 2, 3)];
        Mesh::build(&nodes, &edges).unwrap()
    }

    #[test]
    fn test_depth_first_order_follows_edge_order() {
        let mesh = tee();
        assert_eq!(mesh.global_index(1).unwrap(), 0);
        assert_eq!(mesh.global_index(2).unwrap(), 1);
        assert_eq!(mesh.global_index(4).unwrap(), 2);
        assert_eq!(mesh.global_index(3).unwrap(), 3);
    }

    #[test]
    fn test_connectivity_and_coordinates() {
        let mesh = tee();
        let conn = mesh.connectivity_matrix();
        assert_eq!(conn.shape(), &[3, 3]);
        assert_eq!(conn.row(1).to_vec(), vec![11, 1, 2]);

        let coords = mesh.nodal_coordinates_matrix();
        assert_eq!(coords.shape(), &[4, 4]);
        assert_relative_eq!(coords[[2, 2]], 1.0);
        assert_relative_eq!(coords[[3, 1]], 2.0);
    }

    #[test]
    fn test_global_indexes_broadcast() {
        let mesh = tee();
        let idx = mesh.global_indexes(Physics::Acoustic, &[11]).unwrap();
        assert_eq!(idx.rows, vec![1, 1, 2, 2]);
        assert_eq!(idx.cols, vec![1, 2, 1, 2]);

        let idx = mesh.global_indexes(Physics::Structural, &[10, 12]).unwrap();
        assert_eq!(idx.rows.len(), 2 * 144);
        // second block, row 6 (first dof of node 3), column 0 (first dof of node 2)
        assert_eq!(idx.rows[144 + 6 * 12], 18);
        assert_eq!(idx.cols[144 + 6 * 12], 6);
    }

    #[test]
    fn test_incidence_and_neighbours() {
        let mesh = tee();
        let ids: Vec<usize> = mesh.incident_elements(2).unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
        assert_eq!(mesh.neighbours(2).unwrap(), vec![1, 4, 3]);
        assert!(mesh.incident_elements(99).is_err());
    }

    #[test]
    fn test_disconnected_mesh_names_nodes() {
        let nodes = [
            RawNode::new(1, 0.0, 0.0, 0.0),
            RawNode::new(2, 1.0, 0.0, 0.0),
            RawNode::new(3, 5.0, 0.0, 0.0),
            RawNode::new(4, 6.0, 0.0, 0.0),
        ];
        let edges = [RawEdge::new(1, 1, 2), RawEdge::new(2, 3, 4)];
        match Mesh::build(&nodes, &edges) {
            Err(ConfigError::DisconnectedMesh { start, node_ids }) => {
                assert_eq!(start, 1);
                assert_eq!(node_ids, vec![3, 4]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_invalid_raw_input() {
        let nodes = [RawNode::new(1, 0.0, 0.0, 0.0), RawNode::new(2, 0.0, 0.0, 0.0)];
        assert!(matches!(
            Mesh::build(&nodes, &[RawEdge::new(7, 1, 2)]),
            Err(ConfigError::DegenerateElements { element_ids }) if element_ids == vec![7]
        ));
        assert!(matches!(
            Mesh::build(&nodes, &[RawEdge::new(7, 1, 9)]),
            Err(ConfigError::UnknownNode { node_id: 9 })
        ));
        let dup = [RawNode::new(1, 0.0, 0.0, 0.0), RawNode::new(1, 1.0, 0.0, 0.0)];
        assert!(matches!(
            Mesh::build(&dup, &[]),
            Err(ConfigError::DuplicateNode { node_id: 1 })
        ));
        assert!(matches!(Mesh::build(&[], &[]), Err(ConfigError::EmptyMesh)));
    }

    #[test]
    fn test_orphan_acoustic_dofs() {
        let mut mesh = tee();
        mesh.set_acoustic_kind(&[10, 12], AcousticKind::PlaneWave).unwrap();
        assert_eq!(mesh.orphan_acoustic_dofs(), vec![2]);
        assert!(mesh.set_acoustic_kind(&[10, 99], AcousticKind::PlaneWave).is_err());
    }
}
