//! Acoustic-then-structural coupled sweep
//!
//! The acoustic sweep runs first. At every frequency its pressure field is
//! turned into nodal forces through the coupling block and added to the
//! structural load. A structural sample whose acoustic sample failed is
//! reported as missing its pressure.

use super::harmonic::{Projection, SweepSettings, harmonic_sweep};
use super::operators::{AcousticOperator, StructuralOperator};
use super::solution::CoupledSolution;
use super::sweep::CancellationToken;
use crate::assembly::assemble_coupling;
use crate::config::{DampingCoefficients, SolverConfig};
use crate::error::Result;
use crate::model::PipeModel;
use ndarray::Array1;
use num_complex::Complex64;

pub(crate) fn coupled_analysis(
    model: &PipeModel,
    damping: DampingCoefficients,
    frequencies: &[f64],
    config: &SolverConfig,
    cancel: &CancellationToken,
) -> Result<CoupledSolution> {
    let acoustic_op = AcousticOperator::new(model, damping)?;
    let acoustic_settings = SweepSettings {
        frequencies,
        extra_loads: None,
        config,
        cancel,
    };
    let acoustic = harmonic_sweep(model, &acoustic_op, &Projection::Full, &acoustic_settings, Vec::new())?;

    let coupling = assemble_coupling(&model.mesh)?.map(|v| Complex64::new(v, 0.0));
    log::debug!("coupling block: {} non-zeros", coupling.nnz());
    let pressure_loads: Vec<Option<Array1<Complex64>>> = acoustic
        .solved
        .iter()
        .enumerate()
        .map(|(column, &solved)| solved.then(|| coupling.matvec(&acoustic.field.column(column).to_owned())))
        .collect();

    let structural_op = StructuralOperator::new(model, damping)?;
    let structural_settings = SweepSettings {
        extra_loads: Some(&pressure_loads),
        ..acoustic_settings
    };
    let structural = harmonic_sweep(
        model,
        &structural_op,
        &Projection::Full,
        &structural_settings,
        Vec::new(),
    )?;

    Ok(CoupledSolution { acoustic, structural })
}
