//! Structural nodal attachments: prescribed DOFs, loads and lumped elements

use super::{Attachments, DofValues};
use crate::error::{ConfigError, Result};
use crate::mesh::Mesh;
use std::collections::BTreeMap;

/// Categories of six-DOF nodal attachments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodalCategory {
    PrescribedDofs,
    NodalLoads,
    LumpedMasses,
    LumpedSprings,
    LumpedDampers,
}

impl Attachments {
    fn nodal_map(&self, category: NodalCategory) -> &BTreeMap<usize, DofValues> {
        match category {
            NodalCategory::PrescribedDofs => &self.prescribed_dofs,
            NodalCategory::NodalLoads => &self.nodal_loads,
            NodalCategory::LumpedMasses => &self.lumped_masses,
            NodalCategory::LumpedSprings => &self.lumped_springs,
            NodalCategory::LumpedDampers => &self.lumped_dampers,
        }
    }

    fn nodal_map_mut(&mut self, category: NodalCategory) -> &mut BTreeMap<usize, DofValues> {
        match category {
            NodalCategory::PrescribedDofs => &mut self.prescribed_dofs,
            NodalCategory::NodalLoads => &mut self.nodal_loads,
            NodalCategory::LumpedMasses => &mut self.lumped_masses,
            NodalCategory::LumpedSprings => &mut self.lumped_springs,
            NodalCategory::LumpedDampers => &mut self.lumped_dampers,
        }
    }

    /// Set or clear a nodal attachment
    ///
    /// `None` or a record without any value removes the node from the
    /// category. Setting the same record twice is a no-op.
    pub fn set_nodal(
        &mut self,
        mesh: &Mesh,
        category: NodalCategory,
        node_id: usize,
        values: Option<DofValues>,
    ) -> Result<()> {
        mesh.node(node_id)?;
        let map = self.nodal_map_mut(category);
        match values.filter(|v| !v.is_empty()) {
            Some(values) => {
                values.validate()?;
                map.insert(node_id, values);
            }
            None => {
                map.remove(&node_id);
            }
        }
        Ok(())
    }

    pub fn set_prescribed_dofs(&mut self, mesh: &Mesh, node_id: usize, values: Option<DofValues>) -> Result<()> {
        self.set_nodal(mesh, NodalCategory::PrescribedDofs, node_id, values)
    }

    pub fn set_nodal_loads(&mut self, mesh: &Mesh, node_id: usize, values: Option<DofValues>) -> Result<()> {
        self.set_nodal(mesh, NodalCategory::NodalLoads, node_id, values)
    }

    pub fn set_lumped_masses(&mut self, mesh: &Mesh, node_id: usize, values: Option<DofValues>) -> Result<()> {
        self.set_nodal(mesh, NodalCategory::LumpedMasses, node_id, values)
    }

    pub fn set_lumped_springs(&mut self, mesh: &Mesh, node_id: usize, values: Option<DofValues>) -> Result<()> {
        self.set_nodal(mesh, NodalCategory::LumpedSprings, node_id, values)
    }

    pub fn set_lumped_dampers(&mut self, mesh: &Mesh, node_id: usize, values: Option<DofValues>) -> Result<()> {
        self.set_nodal(mesh, NodalCategory::LumpedDampers, node_id, values)
    }

    /// Record of a node in a category
    pub fn nodal(&self, category: NodalCategory, node_id: usize) -> Option<&DofValues> {
        self.nodal_map(category).get(&node_id)
    }

    /// Records of a category, ordered by node id
    pub fn nodal_entries(&self, category: NodalCategory) -> impl Iterator<Item = (usize, &DofValues)> {
        self.nodal_map(category).iter().map(|(&id, v)| (id, v))
    }

    /// Node ids in a category, ordered by node id
    pub fn nodes_with(&self, category: NodalCategory) -> impl Iterator<Item = usize> + '_ {
        self.nodal_map(category).keys().copied()
    }

    pub fn nodes_with_prescribed_dofs(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes_with(NodalCategory::PrescribedDofs)
    }

    pub fn nodes_with_nodal_loads(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes_with(NodalCategory::NodalLoads)
    }

    pub fn nodes_with_lumped_masses(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes_with(NodalCategory::LumpedMasses)
    }

    pub fn nodes_with_lumped_springs(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes_with(NodalCategory::LumpedSprings)
    }

    pub fn nodes_with_lumped_dampers(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes_with(NodalCategory::LumpedDampers)
    }

    /// Global structural DOFs that carry a prescribed value
    pub fn prescribed_structural_dofs(&self, mesh: &Mesh) -> Result<Vec<usize>> {
        let mut dofs = Vec::new();
        for (&node_id, values) in &self.prescribed_dofs {
            let node = mesh.node(node_id)?;
            let base = node.structural_dofs();
            dofs.extend(values.active_dofs().map(|i| base[i]));
        }
        dofs.sort_unstable();
        Ok(dofs)
    }

    /// Reject loads applied on prescribed DOFs
    pub(crate) fn check_load_conflicts(&self) -> Result<()> {
        let conflicting: Vec<usize> = self
            .nodal_loads
            .iter()
            .filter(|(node_id, loads)| {
                self.prescribed_dofs
                    .get(node_id)
                    .is_some_and(|prescribed| loads.active_dofs().any(|i| prescribed.get(i).is_some()))
            })
            .map(|(&id, _)| id)
            .collect();
        if conflicting.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ConflictingAttachments {
                node_ids: conflicting,
                reason: "nodal load applied on a prescribed DOF".into(),
            })
        }
    }
}
