//! Analysis results

use super::reactions::Reactions;
use crate::criteria::{BeamRatioWarning, ValidityWarning};
use crate::error::{NumericalIssue, Result};
use crate::mesh::{Mesh, Physics};
use ndarray::{Array1, Array2, Axis, s};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Frequency response of one physical system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonicSolution {
    pub physics: Physics,
    /// Requested frequencies, as given (Hz)
    pub frequencies: Vec<f64>,
    /// Displacements/rotations or pressures, DOFs × frequencies.
    /// Columns of unsolved samples hold NaN.
    pub field: Array2<Complex64>,
    /// Whether each frequency sample was solved
    pub solved: Vec<bool>,
    pub issues: Vec<NumericalIssue>,
    pub warnings: Vec<ValidityWarning>,
    pub beam_warnings: Vec<BeamRatioWarning>,
    pub reactions: Reactions,
    /// The sweep was cancelled before every sample started
    pub cancelled: bool,
}

impl HarmonicSolution {
    /// A sweep where no sample could be attempted
    pub(crate) fn unsolved(physics: Physics, num_dofs: usize, frequencies: &[f64], issues: Vec<NumericalIssue>) -> Self {
        Self {
            physics,
            frequencies: frequencies.to_vec(),
            field: Array2::from_elem((num_dofs, frequencies.len()), Complex64::new(f64::NAN, f64::NAN)),
            solved: vec![false; frequencies.len()],
            issues,
            warnings: Vec::new(),
            beam_warnings: Vec::new(),
            reactions: Reactions::default(),
            cancelled: false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.solved.iter().all(|&s| s)
    }

    /// Response of one node, node DOFs × frequencies
    pub fn nodal_response(&self, mesh: &Mesh, node_id: usize) -> Result<Array2<Complex64>> {
        let dofs = mesh.node(node_id)?.dofs(self.physics);
        Ok(self.field.slice(s![dofs, ..]).to_owned())
    }

    /// Solved frequencies with their field columns
    pub fn solved_field(&self) -> (Vec<f64>, Array2<Complex64>) {
        let columns: Vec<usize> = (0..self.solved.len()).filter(|&i| self.solved[i]).collect();
        let frequencies = columns.iter().map(|&i| self.frequencies[i]).collect();
        (frequencies, self.field.select(Axis(1), &columns))
    }
}

/// Natural frequencies and mode shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalSolution {
    pub physics: Physics,
    /// λ, ascending
    pub eigenvalues: Array1<f64>,
    /// `√max(λ, 0)` (rad/s)
    pub angular_frequencies: Array1<f64>,
    /// Hz
    pub natural_frequencies: Array1<f64>,
    /// DOFs × modes, M-orthonormal, zero at prescribed DOFs
    pub mode_shapes: Array2<f64>,
    pub issues: Vec<NumericalIssue>,
    pub warnings: Vec<ValidityWarning>,
    pub beam_warnings: Vec<BeamRatioWarning>,
}

impl ModalSolution {
    pub fn num_modes(&self) -> usize {
        self.eigenvalues.len()
    }

    /// Shape of mode `mode` at one node
    pub fn nodal_shape(&self, mesh: &Mesh, node_id: usize, mode: usize) -> Result<Array1<f64>> {
        let dofs = mesh.node(node_id)?.dofs(self.physics);
        Ok(self.mode_shapes.slice(s![dofs, mode]).to_owned())
    }
}

/// Acoustic sweep and the structural sweep it loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoupledSolution {
    pub acoustic: HarmonicSolution,
    pub structural: HarmonicSolution,
}

/// Result of any analysis kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Harmonic(HarmonicSolution),
    Modal(ModalSolution),
    Coupled(CoupledSolution),
}

impl AnalysisOutcome {
    pub fn as_harmonic(&self) -> Option<&HarmonicSolution> {
        match self {
            AnalysisOutcome::Harmonic(solution) => Some(solution),
            _ => None,
        }
    }

    pub fn as_modal(&self) -> Option<&ModalSolution> {
        match self {
            AnalysisOutcome::Modal(solution) => Some(solution),
            _ => None,
        }
    }

    pub fn as_coupled(&self) -> Option<&CoupledSolution> {
        match self {
            AnalysisOutcome::Coupled(solution) => Some(solution),
            _ => None,
        }
    }

    /// Every numerical issue of the analysis
    pub fn issues(&self) -> Vec<&NumericalIssue> {
        match self {
            AnalysisOutcome::Harmonic(solution) => solution.issues.iter().collect(),
            AnalysisOutcome::Modal(solution) => solution.issues.iter().collect(),
            AnalysisOutcome::Coupled(solution) => solution
                .acoustic
                .issues
                .iter()
                .chain(&solution.structural.issues)
                .collect(),
        }
    }
}
