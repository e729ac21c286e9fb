//! Harmonic response: direct and mode-superposition sweeps
//!
//! Both paths eliminate the prescribed DOFs the same way. The direct path
//! factorizes the reduced dynamic matrix of every sample; mode superposition
//! projects it on a fixed M-orthonormal basis `Φ` and solves the small system
//! `Φᵀ A_ff Φ q = Φᵀ (F_f − A_fp u_p)`, then expands `u_f = Φ q`.

use super::operators::HarmonicOperator;
use super::reactions::{Reactions, structural_reactions};
use super::solution::HarmonicSolution;
use super::sweep::{CancellationToken, SampleResult, SampleSolution, collect_field, log_issue_summary, run_sweep};
use crate::assembly::ReducedSystem;
use crate::config::SolverConfig;
use crate::criteria::{beam_ratio_warnings, validity_warnings};
use crate::error::{NumericalIssue, Result};
use crate::mesh::Physics;
use crate::model::PipeModel;
use ndarray::{Array1, Array2};
use num_complex::Complex64;
use solvers::{LuError, lu_factorize_with_tolerance};

/// How the reduced system of each sample is solved
pub enum Projection {
    /// Dense LU on the full reduced system
    Full,
    /// Projection on a truncated modal basis
    Modal(ModalBasis),
}

/// Free-DOF modal basis, one mode per column
#[derive(Debug, Clone)]
pub struct ModalBasis {
    modes: Array2<Complex64>,
    transposed: Array2<Complex64>,
}

impl ModalBasis {
    /// Basis from real M-orthonormal modes restricted to the free DOFs
    pub fn new(modes: &Array2<f64>) -> Self {
        let modes = modes.mapv(|v| Complex64::new(v, 0.0));
        let transposed = modes.t().to_owned();
        Self { modes, transposed }
    }

    pub fn num_modes(&self) -> usize {
        self.modes.ncols()
    }

    fn solve(&self, reduced: &ReducedSystem, pivot_tolerance: f64) -> std::result::Result<Array1<Complex64>, LuError> {
        let projected = self.transposed.dot(&reduced.matrix.matmul_dense(&self.modes));
        let rhs = self.transposed.dot(&reduced.rhs);
        let q = lu_factorize_with_tolerance(&projected, pivot_tolerance)?.solve(&rhs)?;
        Ok(self.modes.dot(&q))
    }
}

/// Solve one frequency sample
///
/// `extra_load` is added to the operator's own load before elimination.
pub(crate) fn solve_sample(
    op: &dyn HarmonicOperator,
    projection: &Projection,
    frequency: f64,
    extra_load: Option<&Array1<Complex64>>,
    pivot_tolerance: f64,
) -> SampleResult<SampleSolution> {
    let (matrix, mut load) = op.system(frequency)?;
    if let Some(extra) = extra_load {
        load += extra;
    }
    let partition = op.partition();
    let prescribed = partition.prescribed_vector(&op.prescribed_values(frequency)?);
    let reduced = partition.eliminate(&matrix, &load, &prescribed);

    let solved = match projection {
        Projection::Full => lu_factorize_with_tolerance(&reduced.matrix.to_dense(), pivot_tolerance)
            .and_then(|lu| lu.solve(&reduced.rhs)),
        Projection::Modal(basis) => basis.solve(&reduced, pivot_tolerance),
    };
    let free = match solved {
        Ok(free) if free.iter().all(|v| v.is_finite()) => free,
        Ok(_) => {
            return Ok(Err(NumericalIssue::SingularSystem {
                frequency,
                detail: "non-finite solution".into(),
            }));
        }
        Err(err) => {
            return Ok(Err(NumericalIssue::SingularSystem {
                frequency,
                detail: err.to_string(),
            }));
        }
    };

    let field = partition.expand(&free, &prescribed);
    let prescribed_forces = (op.physics() == Physics::Structural).then(|| {
        let residual = matrix.matvec(&field) - &load;
        partition.prescribed.iter().map(|&dof| residual[dof]).collect()
    });
    Ok(Ok(SampleSolution {
        field,
        prescribed_forces,
    }))
}

/// Inputs of a harmonic sweep beyond the operator itself
pub(crate) struct SweepSettings<'a> {
    pub frequencies: &'a [f64],
    /// Per-sample extra loads; `None` entries fail their sample
    pub extra_loads: Option<&'a [Option<Array1<Complex64>>]>,
    pub config: &'a SolverConfig,
    pub cancel: &'a CancellationToken,
}

/// Run a harmonic sweep and gather the solution, reactions and warnings
pub(crate) fn harmonic_sweep(
    model: &PipeModel,
    op: &dyn HarmonicOperator,
    projection: &Projection,
    settings: &SweepSettings<'_>,
    mut issues: Vec<NumericalIssue>,
) -> Result<HarmonicSolution> {
    let physics = op.physics();
    let tolerance = settings.config.lu_pivot_tolerance;
    log::info!(
        "{physics:?} harmonic sweep: {} samples, {} free DOFs{}",
        settings.frequencies.len(),
        op.partition().num_free(),
        match projection {
            Projection::Full => String::new(),
            Projection::Modal(basis) => format!(", {} modes", basis.num_modes()),
        }
    );

    let outcome = run_sweep(
        settings.frequencies,
        settings.config.parallel_sweep,
        settings.cancel,
        |index, frequency| {
            let extra = match settings.extra_loads {
                Some(loads) => match &loads[index] {
                    Some(load) => Some(load),
                    None => return Ok(Err(NumericalIssue::MissingAcousticPressure { frequency })),
                },
                None => None,
            };
            solve_sample(op, projection, frequency, extra, tolerance)
        },
    )?;
    let collected = collect_field(op.num_dofs(), outcome);
    if collected.cancelled {
        log::warn!("{physics:?} sweep cancelled");
    }
    issues.extend(collected.issues.iter().cloned());
    log_issue_summary(&format!("{physics:?} sweep"), settings.frequencies.len(), &issues);

    let reactions = match physics {
        Physics::Structural => structural_reactions(model, op.partition(), settings.frequencies, &collected)?,
        Physics::Acoustic => Reactions::default(),
    };
    let (warnings, beam_warnings) = match physics {
        Physics::Acoustic => (
            validity_warnings(&model.mesh, &model.attachments, settings.frequencies)?,
            Vec::new(),
        ),
        Physics::Structural => (
            Vec::new(),
            beam_ratio_warnings(&model.mesh, settings.config.beam_ratio_threshold),
        ),
    };

    Ok(HarmonicSolution {
        physics,
        frequencies: settings.frequencies.to_vec(),
        field: collected.field,
        solved: collected.solved,
        issues,
        warnings,
        beam_warnings,
        reactions,
        cancelled: collected.cancelled,
    })
}
