//! Frequency sweep driver
//!
//! Every sample reads the same immutable operator and returns its own
//! solution, so samples are spread over the rayon pool when the sweep is
//! parallel. A cancelled sweep stops starting new samples; samples already
//! running finish normally.

use crate::error::{NumericalIssue, Result};
use ndarray::{Array1, Array2};
use num_complex::Complex64;
use solvers::parallel::parallel_map_indexed;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag checked between frequency samples
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Result of one sample: fatal configuration error outside, numerical issue inside
pub(crate) type SampleResult<T> = Result<std::result::Result<T, NumericalIssue>>;

/// Solved field of one frequency sample
#[derive(Debug, Clone)]
pub(crate) struct SampleSolution {
    /// Full DOF vector
    pub field: Array1<Complex64>,
    /// `(A u − F)` at the prescribed DOFs, in partition order
    pub prescribed_forces: Option<Array1<Complex64>>,
}

/// Samples of a sweep; `None` marks samples skipped after cancellation
pub(crate) struct SweepOutcome<T> {
    pub samples: Vec<Option<std::result::Result<T, NumericalIssue>>>,
}

impl<T> SweepOutcome<T> {
    pub fn cancelled(&self) -> bool {
        self.samples.iter().any(Option::is_none)
    }
}

/// Run `solve` on every frequency, in order of the returned vector
///
/// The first configuration error aborts the whole sweep.
pub(crate) fn run_sweep<T, F>(
    frequencies: &[f64],
    parallel: bool,
    cancel: &CancellationToken,
    solve: F,
) -> Result<SweepOutcome<T>>
where
    T: Send,
    F: Fn(usize, f64) -> SampleResult<T> + Sync + Send,
{
    let sample = |index: usize| {
        if cancel.is_cancelled() {
            return None;
        }
        log::debug!("solving sample {index} at {} Hz", frequencies[index]);
        Some(solve(index, frequencies[index]))
    };
    let raw: Vec<Option<SampleResult<T>>> = if parallel {
        parallel_map_indexed(frequencies.len(), sample)
    } else {
        (0..frequencies.len()).map(sample).collect()
    };

    let samples = raw
        .into_iter()
        .map(Option::transpose)
        .collect::<Result<Vec<_>>>()?;
    Ok(SweepOutcome { samples })
}

/// Field matrix, solved mask and issues gathered from a sweep
pub(crate) struct CollectedField {
    /// DOFs × frequencies, NaN in unsolved columns
    pub field: Array2<Complex64>,
    pub solved: Vec<bool>,
    pub prescribed_forces: Vec<Option<Array1<Complex64>>>,
    pub issues: Vec<NumericalIssue>,
    pub cancelled: bool,
}

pub(crate) fn collect_field(num_dofs: usize, outcome: SweepOutcome<SampleSolution>) -> CollectedField {
    let cancelled = outcome.cancelled();
    let count = outcome.samples.len();
    let mut field = Array2::from_elem((num_dofs, count), Complex64::new(f64::NAN, f64::NAN));
    let mut solved = vec![false; count];
    let mut prescribed_forces = vec![None; count];
    let mut issues = Vec::new();

    for (column, sample) in outcome.samples.into_iter().enumerate() {
        match sample {
            Some(Ok(solution)) => {
                field.column_mut(column).assign(&solution.field);
                solved[column] = true;
                prescribed_forces[column] = solution.prescribed_forces;
            }
            Some(Err(issue)) => issues.push(issue),
            None => {}
        }
    }

    CollectedField {
        field,
        solved,
        prescribed_forces,
        issues,
        cancelled,
    }
}

/// Log the numerical failures of an analysis once
pub(crate) fn log_issue_summary(label: &str, total: usize, issues: &[NumericalIssue]) {
    if issues.is_empty() {
        return;
    }
    let failed: Vec<f64> = issues.iter().filter_map(NumericalIssue::frequency).collect();
    if failed.is_empty() {
        log::warn!("{label}: {}", issues[0]);
    } else {
        log::warn!(
            "{label}: {} of {total} frequency samples failed (first at {} Hz: {})",
            failed.len(),
            failed[0],
            issues[0]
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    fn solution(value: f64) -> SampleSolution {
        SampleSolution {
            field: Array1::from_elem(2, Complex64::new(value, 0.0)),
            prescribed_forces: None,
        }
    }

    #[test]
    fn test_failed_samples_keep_the_others() {
        let frequencies = [10.0, 20.0, 30.0];
        let outcome = run_sweep(&frequencies, true, &CancellationToken::new(), |_, f| {
            if f == 20.0 {
                Ok(Err(NumericalIssue::SingularSystem {
                    frequency: f,
                    detail: "test".into(),
                }))
            } else {
                Ok(Ok(solution(f)))
            }
        })
        .unwrap();

        let collected = collect_field(2, outcome);
        assert_eq!(collected.solved, vec![true, false, true]);
        assert_eq!(collected.issues.len(), 1);
        assert_eq!(collected.field[[0, 2]], Complex64::new(30.0, 0.0));
        assert!(collected.field[[1, 1]].re.is_nan());
        assert!(!collected.cancelled);
    }

    #[test]
    fn test_configuration_error_aborts() {
        let result = run_sweep(&[1.0, 2.0], false, &CancellationToken::new(), |_, _| {
            Err::<std::result::Result<SampleSolution, _>, _>(ConfigError::EmptyMesh)
        });
        assert!(matches!(result, Err(ConfigError::EmptyMesh)));
    }

    #[test]
    fn test_cancellation_between_samples() {
        let cancel = CancellationToken::new();
        let outcome = run_sweep(&[1.0, 2.0, 3.0], false, &cancel, |index, f| {
            if index == 0 {
                cancel.cancel();
            }
            Ok(Ok(solution(f)))
        })
        .unwrap();

        assert!(outcome.cancelled());
        let collected = collect_field(2, outcome);
        assert_eq!(collected.solved, vec![true, false, false]);
        assert!(collected.issues.is_empty());
    }
}
