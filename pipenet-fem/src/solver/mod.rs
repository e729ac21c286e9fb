//! Analysis drivers
//!
//! # Analysis kinds
//!
//! - **Direct harmonic**: `A(ω) u = F(ω)` at every frequency, prescribed DOFs
//!   eliminated, one dense LU per sample
//! - **Mode superposition**: the same system projected on the lowest modes of
//!   the undamped problem
//! - **Modal**: `Kφ = λMφ` with a shift selecting the modes of interest
//! - **Coupled**: acoustic sweep, then a structural sweep loaded by the
//!   acoustic pressure
//!
//! Configuration errors abort before any sample is solved. Failing samples
//! and eigen-solver problems are reported as [`NumericalIssue`]s inside the
//! returned solution; the other samples are kept.
//!
//! [`NumericalIssue`]: crate::error::NumericalIssue

mod coupled;
mod harmonic;
mod modal;
mod operators;
mod reactions;
mod solution;
mod sweep;

pub use harmonic::{ModalBasis, Projection};
pub use operators::{AcousticOperator, HarmonicOperator, StructuralOperator, harmonic_operator};
pub use reactions::{NodalReactions, Reactions};
pub use solution::{AnalysisOutcome, CoupledSolution, HarmonicSolution, ModalSolution};
pub use sweep::CancellationToken;

use crate::config::{AnalysisKind, AnalysisRequest, SolverConfig};
use crate::error::Result;
use crate::mesh::Physics;
use crate::model::PipeModel;
use harmonic::{SweepSettings, harmonic_sweep};
use modal::{free_eigenpairs, modal_analysis, truncation_issue};
use sweep::log_issue_summary;

/// Run an analysis to completion
pub fn solve(model: &PipeModel, request: &AnalysisRequest, config: &SolverConfig) -> Result<AnalysisOutcome> {
    solve_with_cancellation(model, request, config, &CancellationToken::new())
}

/// Run an analysis, checking `cancel` between frequency samples
///
/// A cancelled sweep returns the samples solved so far with its `cancelled`
/// flag set.
pub fn solve_with_cancellation(
    model: &PipeModel,
    request: &AnalysisRequest,
    config: &SolverConfig,
    cancel: &CancellationToken,
) -> Result<AnalysisOutcome> {
    let frequencies = request.validate()?;
    log::info!(
        "{:?} analysis on {} nodes and {} elements",
        request.kind,
        model.mesh.num_nodes(),
        model.mesh.num_elements()
    );

    let settings = SweepSettings {
        frequencies: &frequencies,
        extra_loads: None,
        config,
        cancel,
    };
    let outcome = match request.kind {
        AnalysisKind::Coupled => {
            model.validate(Physics::Structural)?;
            model.validate(Physics::Acoustic)?;
            AnalysisOutcome::Coupled(coupled::coupled_analysis(
                model,
                request.damping,
                &frequencies,
                config,
                cancel,
            )?)
        }
        AnalysisKind::DirectHarmonic => {
            let op = prepare(model, request)?;
            AnalysisOutcome::Harmonic(harmonic_sweep(model, op.as_ref(), &Projection::Full, &settings, Vec::new())?)
        }
        AnalysisKind::ModeSuperposition => {
            let op = prepare(model, request)?;
            match free_eigenpairs(op.as_ref(), request.modes, request.sigma, &config.eigen_settings())? {
                Ok(pairs) => {
                    let issues = truncation_issue(&pairs).into_iter().collect();
                    let projection = Projection::Modal(ModalBasis::new(&pairs.eigenvectors));
                    AnalysisOutcome::Harmonic(harmonic_sweep(model, op.as_ref(), &projection, &settings, issues)?)
                }
                Err(issue) => {
                    let issues = vec![issue];
                    log_issue_summary("mode superposition", frequencies.len(), &issues);
                    AnalysisOutcome::Harmonic(HarmonicSolution::unsolved(
                        request.physics,
                        op.num_dofs(),
                        &frequencies,
                        issues,
                    ))
                }
            }
        }
        AnalysisKind::Modal => {
            let op = prepare(model, request)?;
            AnalysisOutcome::Modal(modal_analysis(model, op.as_ref(), request.modes, request.sigma, config)?)
        }
    };
    Ok(outcome)
}

/// Validate the model for the request's physics and build its operator
fn prepare<'a>(model: &'a PipeModel, request: &AnalysisRequest) -> Result<Box<dyn HarmonicOperator + 'a>> {
    model.validate(request.physics)?;
    harmonic_operator(model, request.physics, request.damping)
}
