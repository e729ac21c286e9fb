//! Undamped eigenanalysis `Kφ = λMφ` on the free DOFs

use super::operators::HarmonicOperator;
use super::solution::ModalSolution;
use super::sweep::{SampleResult, log_issue_summary};
use crate::config::SolverConfig;
use crate::criteria::{beam_ratio_warnings, validity_warnings};
use crate::error::{NumericalIssue, Result};
use crate::mesh::Physics;
use crate::model::PipeModel;
use ndarray::{Array1, Array2};
use solvers::{EigenPairs, EigenSettings, generalized_symmetric_eigen};
use std::f64::consts::PI;

/// Eigenpairs of the operator's modal matrices restricted to the free DOFs
///
/// Eigen-solver failures are numerical issues, not errors.
pub(crate) fn free_eigenpairs(
    op: &dyn HarmonicOperator,
    modes: usize,
    sigma: f64,
    settings: &EigenSettings,
) -> SampleResult<EigenPairs> {
    let (stiffness, mass) = op.modal_matrices()?;
    let partition = op.partition();
    let k = partition.free_block(&stiffness).to_dense();
    let m = partition.free_block(&mass).to_dense();
    log::info!(
        "{:?} eigenproblem: {} free DOFs, {modes} modes around sigma = {sigma}",
        op.physics(),
        partition.num_free()
    );
    Ok(generalized_symmetric_eigen(&k, &m, modes, sigma, settings).map_err(|err| {
        NumericalIssue::EigenFailure {
            detail: err.to_string(),
        }
    }))
}

/// Issue reported when fewer modes than requested were found
pub(crate) fn truncation_issue(pairs: &EigenPairs) -> Option<NumericalIssue> {
    pairs.is_truncated().then(|| NumericalIssue::TruncatedModes {
        requested: pairs.requested,
        found: pairs.len(),
    })
}

/// Natural frequencies and mode shapes of `op`
pub(crate) fn modal_analysis(
    model: &PipeModel,
    op: &dyn HarmonicOperator,
    modes: usize,
    sigma: f64,
    config: &SolverConfig,
) -> Result<ModalSolution> {
    let physics = op.physics();
    let partition = op.partition();
    let mut issues = Vec::new();

    let (eigenvalues, mode_shapes) = match free_eigenpairs(op, modes, sigma, &config.eigen_settings())? {
        Ok(pairs) => {
            issues.extend(truncation_issue(&pairs));
            let shapes = partition.expand_columns(&pairs.eigenvectors);
            (pairs.eigenvalues, shapes)
        }
        Err(issue) => {
            issues.push(issue);
            (Array1::zeros(0), Array2::zeros((partition.num_dofs(), 0)))
        }
    };
    log_issue_summary(&format!("{physics:?} modal analysis"), modes, &issues);

    let angular_frequencies = eigenvalues.mapv(|lambda: f64| lambda.max(0.0).sqrt());
    let natural_frequencies = angular_frequencies.mapv(|omega| omega / (2.0 * PI));
    let (warnings, beam_warnings) = match physics {
        Physics::Acoustic => (
            validity_warnings(&model.mesh, &model.attachments, natural_frequencies.as_slice().unwrap_or(&[]))?,
            Vec::new(),
        ),
        Physics::Structural => (Vec::new(), beam_ratio_warnings(&model.mesh, config.beam_ratio_threshold)),
    };
    log::info!("{physics:?} modal analysis: {} modes extracted", eigenvalues.len());

    Ok(ModalSolution {
        physics,
        eigenvalues,
        angular_frequencies,
        natural_frequencies,
        mode_shapes,
        issues,
        warnings,
        beam_warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachments::DofValues;
    use crate::config::DampingCoefficients;
    use crate::mesh::{RawEdge, RawNode};
    use crate::properties::{AcousticKind, CrossSection, Fluid, Material, StructuralKind};
    use crate::solver::operators::{AcousticOperator, StructuralOperator};
    use approx::assert_relative_eq;

    #[test]
    fn test_closed_duct_resonances() {
        // closed-closed duct: f_n = n c / 2L
        let elements = 40;
        let length = 1.0;
        let nodes: Vec<RawNode> = (0..=elements)
            .map(|i| RawNode::new(i, length * i as f64 / elements as f64, 0.0, 0.0))
            .collect();
        let edges: Vec<RawEdge> = (0..elements).map(|i| RawEdge::new(i, i, i + 1)).collect();
        let mut model = PipeModel::build(&nodes, &edges).unwrap();
        model.mesh.update_all_properties(|p| {
            p.acoustic_kind = Some(AcousticKind::PlaneWave);
            p.fluid = Some(Fluid::air());
            p.section = Some(CrossSection::pipe(0.05, 0.002));
        });
        let op = AcousticOperator::new(&model, DampingCoefficients::default()).unwrap();
        let solution = modal_analysis(&model, &op, 3, 0.0, &SolverConfig::default()).unwrap();

        assert!(solution.issues.is_empty());
        assert!(solution.natural_frequencies[0].abs() < 1e-3);
        let c = Fluid::air().speed_of_sound;
        assert_relative_eq!(solution.natural_frequencies[1], c / (2.0 * length), max_relative = 1e-3);
        assert_relative_eq!(solution.natural_frequencies[2], c / length, max_relative = 3e-3);
        assert_eq!(solution.mode_shapes.nrows(), elements + 1);
    }

    #[test]
    fn test_prescribed_rows_are_zero_in_mode_shapes() {
        let nodes = [
            RawNode::new(1, 0.0, 0.0, 0.0),
            RawNode::new(2, 1.0, 0.0, 0.0),
            RawNode::new(3, 2.0, 0.0, 0.0),
        ];
        let mut model = PipeModel::build(&nodes, &[RawEdge::new(1, 1, 2), RawEdge::new(2, 2, 3)]).unwrap();
        model.mesh.update_all_properties(|p| {
            p.structural_kind = Some(StructuralKind::Pipe);
            p.material = Some(Material::steel());
            p.section = Some(CrossSection::pipe(0.1, 0.005));
        });
        model
            .attachments
            .set_prescribed_dofs(&model.mesh, 1, Some(DofValues::clamped()))
            .unwrap();
        let op = StructuralOperator::new(&model, DampingCoefficients::default()).unwrap();
        let solution = modal_analysis(&model, &op, 4, 0.0, &SolverConfig::default()).unwrap();

        assert_eq!(solution.natural_frequencies.len(), 4);
        for dof in model.mesh.node(1).unwrap().structural_dofs() {
            assert!(solution.mode_shapes.row(dof).iter().all(|v| *v == 0.0));
        }
        assert!(solution.natural_frequencies.windows(2).into_iter().all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_too_many_modes_is_truncated() {
        let nodes = [RawNode::new(1, 0.0, 0.0, 0.0), RawNode::new(2, 1.0, 0.0, 0.0)];
        let mut model = PipeModel::build(&nodes, &[RawEdge::new(1, 1, 2)]).unwrap();
        model.mesh.update_all_properties(|p| {
            p.structural_kind = Some(StructuralKind::Pipe);
            p.material = Some(Material::steel());
            p.section = Some(CrossSection::pipe(0.1, 0.005));
        });
        let op = StructuralOperator::new(&model, DampingCoefficients::default()).unwrap();
        let solution = modal_analysis(&model, &op, 20, 0.0, &SolverConfig::default()).unwrap();
        assert_eq!(solution.eigenvalues.len(), 12);
        assert_eq!(
            solution.issues,
            vec![NumericalIssue::TruncatedModes {
                requested: 20,
                found: 12
            }]
        );
    }
}
