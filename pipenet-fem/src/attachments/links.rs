//! Elastic nodal links between two structural nodes
//!
//! A link couples the six DOFs of two nodes with `[[+k, −k], [−k, +k]]`
//! blocks. Stiffness and damping are stored independently under the ordered
//! node pair.

use super::{Attachments, DofValues};
use crate::error::{ConfigError, Result};
use crate::mesh::Mesh;
use std::collections::BTreeMap;

/// Ordered key of a link, smallest node id first
pub fn link_key(first: usize, last: usize) -> (usize, usize) {
    (first.min(last), first.max(last))
}

impl Attachments {
    fn set_link(
        mesh: &Mesh,
        map: &mut BTreeMap<(usize, usize), DofValues>,
        first: usize,
        last: usize,
        values: Option<DofValues>,
    ) -> Result<()> {
        mesh.node(first)?;
        mesh.node(last)?;
        if first == last {
            return Err(ConfigError::ConflictingAttachments {
                node_ids: vec![first],
                reason: "an elastic link needs two distinct nodes".into(),
            });
        }
        let key = link_key(first, last);
        match values.filter(|v| !v.is_empty()) {
            Some(values) => {
                values.validate()?;
                map.insert(key, values);
            }
            None => {
                map.remove(&key);
            }
        }
        Ok(())
    }

    /// Set (or clear) the stiffness of a link
    pub fn set_elastic_link_stiffness(
        &mut self,
        mesh: &Mesh,
        first: usize,
        last: usize,
        values: Option<DofValues>,
    ) -> Result<()> {
        Self::set_link(mesh, &mut self.link_stiffness, first, last, values)
    }

    /// Set (or clear) the damping of a link
    pub fn set_elastic_link_damping(
        &mut self,
        mesh: &Mesh,
        first: usize,
        last: usize,
        values: Option<DofValues>,
    ) -> Result<()> {
        Self::set_link(mesh, &mut self.link_damping, first, last, values)
    }

    pub fn elastic_link_stiffness(&self, first: usize, last: usize) -> Option<&DofValues> {
        self.link_stiffness.get(&link_key(first, last))
    }

    pub fn elastic_link_damping(&self, first: usize, last: usize) -> Option<&DofValues> {
        self.link_damping.get(&link_key(first, last))
    }

    /// Stiffness links, ordered by node pair
    pub fn elastic_links_stiffness(&self) -> impl Iterator<Item = ((usize, usize), &DofValues)> {
        self.link_stiffness.iter().map(|(&k, v)| (k, v))
    }

    /// Damping links, ordered by node pair
    pub fn elastic_links_damping(&self) -> impl Iterator<Item = ((usize, usize), &DofValues)> {
        self.link_damping.iter().map(|(&k, v)| (k, v))
    }

    /// Nodes at either end of a stiffness link
    pub fn nodes_with_link_stiffness(&self) -> impl Iterator<Item = usize> + '_ {
        self.link_stiffness.keys().flat_map(|&(a, b)| [a, b])
    }

    /// Nodes at either end of a damping link
    pub fn nodes_with_link_damping(&self) -> impl Iterator<Item = usize> + '_ {
        self.link_damping.keys().flat_map(|&(a, b)| [a, b])
    }
}
