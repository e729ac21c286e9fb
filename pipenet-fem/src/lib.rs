//! Frequency-domain finite elements for piping networks
//!
//! This crate models a network of straight pipe segments twice: as a
//! Timoshenko frame with six DOFs per node, and as a one-dimensional acoustic
//! duct with one pressure DOF per node. Both systems are assembled from the
//! same mesh and can be solved alone or coupled through the fluid pressure
//! acting on bends and capped ends.
//!
//! # Features
//!
//! - **Structural elements**: Timoshenko pipes and beams, valves, flanges,
//!   expansion joints, stress stiffening, fluid added mass
//! - **Acoustic elements**: plane wave, wide duct and low reduced frequency
//!   models, length corrections, perforated plates
//! - **Attachments**: prescribed DOFs, loads, lumped springs, masses and
//!   dampers, elastic links, rotation decoupling, acoustic sources and
//!   terminations, all optionally frequency-dependent
//! - **Analyses**: direct harmonic, mode superposition, modal and coupled
//!   sweeps, parallel over frequencies with the `parallel` feature
//! - **Validity checks**: acoustic model frequency ranges and beam
//!   slenderness, reported with the solution
//!
//! # Example
//!
//! ```ignore
//! use fem::{AnalysisRequest, PipeModel, SolverConfig, solve};
//! use fem::attachments::DofValues;
//! use fem::mesh::{Physics, RawEdge, RawNode};
//!
//! let nodes = [RawNode::new(1, 0.0, 0.0, 0.0), RawNode::new(2, 1.0, 0.0, 0.0)];
//! let mut model = PipeModel::build(&nodes, &[RawEdge::new(1, 1, 2)])?;
//! // ... set kinds, materials and sections on the mesh
//! model.attachments.set_prescribed_dofs(&model.mesh, 1, Some(DofValues::clamped()))?;
//!
//! let request = AnalysisRequest::direct_harmonic(Physics::Structural, vec![10.0, 20.0]);
//! let outcome = solve(&model, &request, &SolverConfig::default())?;
//! ```

pub mod assembly;
pub mod attachments;
pub mod config;
pub mod criteria;
pub mod elements;
pub mod error;
pub mod mesh;
pub mod model;
pub mod properties;
pub mod solver;

pub use config::{AnalysisKind, AnalysisRequest, DampingCoefficients, FrequencySweep, SolverConfig};
pub use error::{ConfigError, NumericalIssue, Result};
pub use model::PipeModel;
pub use solver::{AnalysisOutcome, CancellationToken, solve, solve_with_cancellation};

/// Library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
