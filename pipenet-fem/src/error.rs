//! Error types for model configuration and analysis.
//!
//! Configuration problems (disconnected meshes, missing properties, invalid
//! attachments) abort an analysis before any matrix is assembled and always
//! name the offending node/element ids. Numerical problems at a single
//! frequency or mode are not errors: they are collected as [`NumericalIssue`]
//! values inside the returned solution.

use crate::properties::RequiredProperty;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The mesh has no node.
    #[error("mesh is empty")]
    EmptyMesh,

    /// Two raw nodes share the same external id.
    #[error("duplicate node id {node_id}")]
    DuplicateNode {
        /// The repeated id
        node_id: usize,
    },

    /// Two raw edges share the same external id.
    #[error("duplicate element id {element_id}")]
    DuplicateElement {
        /// The repeated id
        element_id: usize,
    },

    /// A node id does not exist in the mesh.
    #[error("unknown node id {node_id}")]
    UnknownNode {
        /// The missing id
        node_id: usize,
    },

    /// An element id does not exist in the mesh.
    #[error("unknown element id {element_id}")]
    UnknownElement {
        /// The missing id
        element_id: usize,
    },

    /// Elements with zero length or identical end nodes.
    #[error("degenerate elements (zero length or self-loop): {element_ids:?}")]
    DegenerateElements {
        /// Offending element ids
        element_ids: Vec<usize>,
    },

    /// Some nodes cannot be reached from the traversal start node.
    #[error("mesh is disconnected: nodes {node_ids:?} are unreachable from node {start}")]
    DisconnectedMesh {
        /// External id of the traversal start node
        start: usize,
        /// External ids of the unreachable nodes
        node_ids: Vec<usize>,
    },

    /// Elements lack a property required by their element kind.
    #[error("elements {element_ids:?} are missing {property}")]
    MissingProperty {
        /// The missing property
        property: RequiredProperty,
        /// Offending element ids
        element_ids: Vec<usize>,
    },

    /// Attachments that cannot hold together on the same node.
    #[error("conflicting attachments on nodes {node_ids:?}: {reason}")]
    ConflictingAttachments {
        /// Offending node ids
        node_ids: Vec<usize>,
        /// Human readable description of the conflict
        reason: String,
    },

    /// An element referenced together with a node it does not touch.
    #[error("element {element_id} is not incident to node {node_id}")]
    NotIncident {
        /// Element id
        element_id: usize,
        /// Node id
        node_id: usize,
    },

    /// A malformed value (table, property, request field).
    #[error("invalid {what}: {reason}")]
    InvalidValue {
        /// Name of the offending quantity
        what: String,
        /// Why it was rejected
        reason: String,
    },

    /// An analysis request that cannot be carried out on this model.
    #[error("invalid analysis request: {0}")]
    InvalidRequest(String),

    /// Failure to read a configuration file.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Failure to parse a JSON configuration.
    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` type for model and analysis operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

impl ConfigError {
    /// Returns `true` for mesh/topology problems.
    pub fn is_topology_error(&self) -> bool {
        matches!(
            self,
            ConfigError::EmptyMesh
                | ConfigError::DuplicateNode { .. }
                | ConfigError::DuplicateElement { .. }
                | ConfigError::DegenerateElements { .. }
                | ConfigError::DisconnectedMesh { .. }
        )
    }

    /// Returns `true` when element properties are missing.
    pub fn is_property_error(&self) -> bool {
        matches!(self, ConfigError::MissingProperty { .. })
    }

    /// Returns `true` for attachment problems.
    pub fn is_attachment_error(&self) -> bool {
        matches!(
            self,
            ConfigError::ConflictingAttachments { .. } | ConfigError::NotIncident { .. }
        )
    }

    /// Node ids named by this error, if any.
    pub fn node_ids(&self) -> Vec<usize> {
        match self {
            ConfigError::DuplicateNode { node_id } | ConfigError::UnknownNode { node_id } => {
                vec![*node_id]
            }
            ConfigError::DisconnectedMesh { node_ids, .. }
            | ConfigError::ConflictingAttachments { node_ids, .. } => node_ids.clone(),
            ConfigError::NotIncident { node_id, .. } => vec![*node_id],
            _ => Vec::new(),
        }
    }

    /// Element ids named by this error, if any.
    pub fn element_ids(&self) -> Vec<usize> {
        match self {
            ConfigError::DuplicateElement { element_id }
            | ConfigError::UnknownElement { element_id }
            | ConfigError::NotIncident { element_id, .. } => vec![*element_id],
            ConfigError::DegenerateElements { element_ids }
            | ConfigError::MissingProperty { element_ids, .. } => element_ids.clone(),
            _ => Vec::new(),
        }
    }
}

/// A recoverable numerical problem encountered during an analysis.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum NumericalIssue {
    /// The reduced dynamic matrix could not be factorized at this frequency.
    #[error("singular system at {frequency} Hz: {detail}")]
    SingularSystem {
        /// Frequency sample in Hz
        frequency: f64,
        /// Solver diagnostic
        detail: String,
    },
    /// The eigen-solver failed.
    #[error("eigen-solver failure: {detail}")]
    EigenFailure {
        /// Solver diagnostic
        detail: String,
    },
    /// A coupled structural sample was skipped because the acoustic sample
    /// at the same frequency failed.
    #[error("no acoustic pressure at {frequency} Hz for the structural solve")]
    MissingAcousticPressure {
        /// Frequency sample in Hz
        frequency: f64,
    },
    /// Fewer modes than requested could be extracted.
    #[error("{found} of {requested} requested modes extracted")]
    TruncatedModes {
        /// Requested mode count
        requested: usize,
        /// Extracted mode count
        found: usize,
    },
}

impl NumericalIssue {
    /// Frequency sample affected by the issue, if it is frequency specific.
    pub fn frequency(&self) -> Option<f64> {
        match self {
            NumericalIssue::SingularSystem { frequency, .. }
            | NumericalIssue::MissingAcousticPressure { frequency } => Some(*frequency),
            _ => None,
        }
    }
}
