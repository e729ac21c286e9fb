//! A mesh together with its attachments

use crate::assembly::check_properties;
use crate::attachments::Attachments;
use crate::error::{ConfigError, Result};
use crate::mesh::{Mesh, Physics, RawEdge, RawNode};

/// Everything an analysis reads
#[derive(Debug, Clone)]
pub struct PipeModel {
    pub mesh: Mesh,
    pub attachments: Attachments,
}

impl PipeModel {
    pub fn new(mesh: Mesh) -> Self {
        Self {
            mesh,
            attachments: Attachments::new(),
        }
    }

    /// Build the mesh from raw nodes and edges
    pub fn build(raw_nodes: &[RawNode], raw_edges: &[RawEdge]) -> Result<Self> {
        Ok(Self::new(Mesh::build(raw_nodes, raw_edges)?))
    }

    /// Check that `physics` can be assembled on this model
    pub fn validate(&self, physics: Physics) -> Result<()> {
        check_properties(&self.mesh, physics)?;
        self.attachments.validate()?;
        if physics == Physics::Acoustic && self.mesh.acoustic_elements().next().is_none() {
            return Err(ConfigError::InvalidRequest("the model has no acoustic element".into()));
        }
        Ok(())
    }
}
