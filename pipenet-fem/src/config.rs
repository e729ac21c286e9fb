//! JSON configuration of analyses
//!
//! An [`AnalysisRequest`] says what to compute; a [`SolverConfig`] says how.
//! Both deserialize from JSON with every optional field defaulted:
//!
//! ```json
//! {
//!   "kind": "direct_harmonic",
//!   "physics": "acoustic",
//!   "frequencies": { "frequency_min": 10.0, "frequency_max": 500.0, "frequency_step": 10.0 },
//!   "damping": { "beta_h": 0.01 }
//! }
//! ```

use crate::error::{ConfigError, Result};
use crate::mesh::Physics;
use serde::{Deserialize, Serialize};
use solvers::EigenSettings;
use std::fs;
use std::path::Path;

/// Analysis to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// Full complex solve at every frequency
    DirectHarmonic,
    /// Harmonic response projected on a truncated modal basis
    ModeSuperposition,
    /// Natural frequencies and mode shapes
    Modal,
    /// Acoustic sweep feeding pressure loads into a structural sweep
    Coupled,
}

impl AnalysisKind {
    /// Whether the analysis runs over a frequency sweep
    pub fn is_harmonic(&self) -> bool {
        !matches!(self, AnalysisKind::Modal)
    }

    /// Whether the analysis needs a modal basis
    pub fn needs_modes(&self) -> bool {
        matches!(self, AnalysisKind::ModeSuperposition | AnalysisKind::Modal)
    }
}

/// Frequencies of a harmonic analysis (Hz)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrequencySweep {
    /// `frequency_min, frequency_min + step, ...` up to `frequency_max` inclusive
    Range {
        frequency_min: f64,
        frequency_max: f64,
        frequency_step: f64,
    },
    /// Explicit list, solved in the given order
    List(Vec<f64>),
}

impl FrequencySweep {
    pub fn range(frequency_min: f64, frequency_max: f64, frequency_step: f64) -> Self {
        FrequencySweep::Range {
            frequency_min,
            frequency_max,
            frequency_step,
        }
    }

    /// Expand the sweep into its frequency vector
    pub fn frequencies(&self) -> Result<Vec<f64>> {
        let frequencies = match self {
            FrequencySweep::Range {
                frequency_min,
                frequency_max,
                frequency_step,
            } => {
                let (min, max, step) = (*frequency_min, *frequency_max, *frequency_step);
                if !(min.is_finite() && max.is_finite() && step.is_finite()) {
                    return Err(invalid("frequency range bounds must be finite"));
                }
                if step <= 0.0 {
                    return Err(invalid("frequency step must be positive"));
                }
                if max < min {
                    return Err(invalid("frequency_max is below frequency_min"));
                }
                let count = ((max - min) / step + 1e-9).floor() as usize + 1;
                (0..count).map(|i| min + i as f64 * step).collect()
            }
            FrequencySweep::List(values) => values.clone(),
        };
        if frequencies.is_empty() {
            return Err(invalid("empty frequency list"));
        }
        if frequencies.iter().any(|f| !f.is_finite() || *f < 0.0) {
            return Err(invalid("frequencies must be finite and non-negative"));
        }
        Ok(frequencies)
    }
}

impl From<Vec<f64>> for FrequencySweep {
    fn from(values: Vec<f64>) -> Self {
        FrequencySweep::List(values)
    }
}

/// Hysteretic (`_h`) and viscous (`_v`) Rayleigh damping
///
/// The dynamic matrix receives `i[(β_h + ω β_v) K + (α_h + ω α_v) M]`.
/// Plane-wave acoustic elements read `beta_h` as their loss factor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DampingCoefficients {
    pub alpha_h: f64,
    pub beta_h: f64,
    pub alpha_v: f64,
    pub beta_v: f64,
}

impl DampingCoefficients {
    /// Imaginary factor of the stiffness term at `omega`
    pub fn stiffness_factor(&self, omega: f64) -> f64 {
        self.beta_h + omega * self.beta_v
    }

    /// Imaginary factor of the mass term at `omega`
    pub fn mass_factor(&self, omega: f64) -> f64 {
        self.alpha_h + omega * self.alpha_v
    }

    pub fn is_undamped(&self) -> bool {
        *self == Self::default()
    }
}

/// `[α_h, β_h, α_v, β_v]`
impl From<[f64; 4]> for DampingCoefficients {
    fn from([alpha_h, beta_h, alpha_v, beta_v]: [f64; 4]) -> Self {
        Self {
            alpha_h,
            beta_h,
            alpha_v,
            beta_v,
        }
    }
}

/// What to compute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub kind: AnalysisKind,
    /// System solved by harmonic and modal analyses; coupled analyses use both
    #[serde(default)]
    pub physics: Physics,
    /// Required by every kind except modal
    #[serde(default)]
    pub frequencies: Option<FrequencySweep>,
    /// Modes to extract (modal and mode superposition)
    #[serde(default)]
    pub modes: usize,
    /// Eigenvalue shift (rad²/s²): modal analysis keeps the modes closest to it
    #[serde(default)]
    pub sigma: f64,
    #[serde(default)]
    pub damping: DampingCoefficients,
}

impl AnalysisRequest {
    pub fn direct_harmonic(physics: Physics, frequencies: impl Into<FrequencySweep>) -> Self {
        Self {
            kind: AnalysisKind::DirectHarmonic,
            physics,
            frequencies: Some(frequencies.into()),
            modes: 0,
            sigma: 0.0,
            damping: DampingCoefficients::default(),
        }
    }

    pub fn mode_superposition(physics: Physics, frequencies: impl Into<FrequencySweep>, modes: usize) -> Self {
        Self {
            kind: AnalysisKind::ModeSuperposition,
            modes,
            ..Self::direct_harmonic(physics, frequencies)
        }
    }

    pub fn modal(physics: Physics, modes: usize, sigma: f64) -> Self {
        Self {
            kind: AnalysisKind::Modal,
            physics,
            frequencies: None,
            modes,
            sigma,
            damping: DampingCoefficients::default(),
        }
    }

    pub fn coupled(frequencies: impl Into<FrequencySweep>) -> Self {
        Self {
            kind: AnalysisKind::Coupled,
            ..Self::direct_harmonic(Physics::Structural, frequencies)
        }
    }

    pub fn with_damping(mut self, damping: impl Into<DampingCoefficients>) -> Self {
        self.damping = damping.into();
        self
    }

    /// Parse a request from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a request from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Check the request and expand its frequency vector
    ///
    /// Modal requests return an empty vector.
    pub fn validate(&self) -> Result<Vec<f64>> {
        if self.kind.needs_modes() && self.modes == 0 {
            return Err(ConfigError::InvalidRequest(format!(
                "{:?} analysis needs at least one mode",
                self.kind
            )));
        }
        if !self.sigma.is_finite() {
            return Err(ConfigError::InvalidRequest("sigma must be finite".into()));
        }
        let damping = [
            self.damping.alpha_h,
            self.damping.beta_h,
            self.damping.alpha_v,
            self.damping.beta_v,
        ];
        if damping.iter().any(|d| !d.is_finite()) {
            return Err(ConfigError::InvalidRequest("damping coefficients must be finite".into()));
        }
        if !self.kind.is_harmonic() {
            return Ok(Vec::new());
        }
        self.frequencies
            .as_ref()
            .ok_or_else(|| ConfigError::InvalidRequest(format!("{:?} analysis needs frequencies", self.kind)))?
            .frequencies()
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::InvalidRequest(reason.to_string())
}

/// How to compute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Spread frequency samples over the rayon pool
    #[serde(default = "default_parallel_sweep")]
    pub parallel_sweep: bool,
    /// Relative pivot below which a reduced system counts as singular
    #[serde(default = "default_lu_pivot_tolerance")]
    pub lu_pivot_tolerance: f64,
    #[serde(default = "default_eigen_tolerance")]
    pub eigen_tolerance: f64,
    /// 0 means unbounded
    #[serde(default = "default_eigen_max_iterations")]
    pub eigen_max_iterations: usize,
    /// Branches with a length/diameter ratio below this are reported
    #[serde(default = "default_beam_ratio_threshold")]
    pub beam_ratio_threshold: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            parallel_sweep: default_parallel_sweep(),
            lu_pivot_tolerance: default_lu_pivot_tolerance(),
            eigen_tolerance: default_eigen_tolerance(),
            eigen_max_iterations: default_eigen_max_iterations(),
            beam_ratio_threshold: default_beam_ratio_threshold(),
        }
    }
}

impl SolverConfig {
    /// Parse a solver configuration from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a solver configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn eigen_settings(&self) -> EigenSettings {
        EigenSettings {
            tolerance: self.eigen_tolerance,
            max_iterations: self.eigen_max_iterations,
        }
    }
}

fn default_parallel_sweep() -> bool {
    true
}

fn default_lu_pivot_tolerance() -> f64 {
    solvers::direct::DEFAULT_PIVOT_TOLERANCE
}

fn default_eigen_tolerance() -> f64 {
    f64::EPSILON
}

fn default_eigen_max_iterations() -> usize {
    10_000
}

fn default_beam_ratio_threshold() -> f64 {
    10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_includes_both_ends() {
        let sweep = FrequencySweep::range(10.0, 50.0, 10.0);
        assert_eq!(sweep.frequencies().unwrap(), vec![10.0, 20.0, 30.0, 40.0, 50.0]);

        let single = FrequencySweep::range(5.0, 5.0, 1.0);
        assert_eq!(single.frequencies().unwrap(), vec![5.0]);
    }

    #[test]
    fn test_invalid_sweeps_are_rejected() {
        assert!(FrequencySweep::range(10.0, 5.0, 1.0).frequencies().is_err());
        assert!(FrequencySweep::range(0.0, 5.0, 0.0).frequencies().is_err());
        assert!(FrequencySweep::List(vec![]).frequencies().is_err());
        assert!(FrequencySweep::List(vec![-1.0]).frequencies().is_err());
    }

    #[test]
    fn test_request_from_json() {
        let json = r#"{
            "kind": "mode_superposition",
            "frequencies": { "frequency_min": 0.0, "frequency_max": 100.0, "frequency_step": 25.0 },
            "modes": 12,
            "damping": { "beta_h": 0.02 }
        }"#;
        let request = AnalysisRequest::from_json_str(json).unwrap();
        assert_eq!(request.kind, AnalysisKind::ModeSuperposition);
        assert_eq!(request.physics, Physics::Structural);
        assert_eq!(request.damping.beta_h, 0.02);
        assert_eq!(request.damping.alpha_h, 0.0);
        assert_eq!(request.validate().unwrap().len(), 5);

        let list = AnalysisRequest::from_json_str(r#"{"kind": "coupled", "frequencies": [1.0, 2.0]}"#).unwrap();
        assert_eq!(list.frequencies, Some(FrequencySweep::List(vec![1.0, 2.0])));
    }

    #[test]
    fn test_request_validation() {
        assert!(AnalysisRequest::modal(Physics::Structural, 0, 0.0).validate().is_err());
        assert!(AnalysisRequest::modal(Physics::Structural, 4, 0.0).validate().unwrap().is_empty());

        let mut harmonic = AnalysisRequest::direct_harmonic(Physics::Acoustic, vec![100.0]);
        harmonic.frequencies = None;
        assert!(matches!(harmonic.validate(), Err(ConfigError::InvalidRequest(_))));
    }

    #[test]
    fn test_damping_order() {
        let damping = DampingCoefficients::from([1.0, 2.0, 3.0, 4.0]);
        assert_eq!(damping.alpha_h, 1.0);
        assert_eq!(damping.beta_v, 4.0);
        assert_eq!(damping.stiffness_factor(10.0), 42.0);
        assert_eq!(damping.mass_factor(10.0), 31.0);
    }

    #[test]
    fn test_solver_config_defaults() {
        let config = SolverConfig::from_json_str("{}").unwrap();
        assert_eq!(config, SolverConfig::default());
        assert!(config.parallel_sweep);
        assert_eq!(config.beam_ratio_threshold, 10.0);
    }
}
