//! Scalar or tabulated boundary values

use crate::error::{ConfigError, Result};
use crate::mesh::STRUCTURAL_DOFS_PER_NODE;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// A complex value, constant or tabulated over frequency
///
/// Tables are interpolated linearly and clamped to their end values outside
/// the tabulated range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BcValue {
    Scalar(Complex64),
    Table {
        frequencies: Vec<f64>,
        values: Vec<Complex64>,
    },
}

impl BcValue {
    /// Real constant
    pub fn real(value: f64) -> Self {
        BcValue::Scalar(Complex64::new(value, 0.0))
    }

    /// Complex constant
    pub fn complex(re: f64, im: f64) -> Self {
        BcValue::Scalar(Complex64::new(re, im))
    }

    /// Frequency table; frequencies must be strictly increasing
    pub fn table(frequencies: Vec<f64>, values: Vec<Complex64>) -> Result<Self> {
        let table = BcValue::Table { frequencies, values };
        table.validate()?;
        Ok(table)
    }

    /// Check the table layout of deserialized values
    pub fn validate(&self) -> Result<()> {
        let BcValue::Table { frequencies, values } = self else {
            return Ok(());
        };
        let invalid = |reason: &str| ConfigError::InvalidValue {
            what: "frequency table".into(),
            reason: reason.into(),
        };
        if frequencies.is_empty() {
            return Err(invalid("table is empty"));
        }
        if frequencies.len() != values.len() {
            return Err(invalid("frequencies and values differ in length"));
        }
        if frequencies.windows(2).any(|w| w[1] <= w[0]) {
            return Err(invalid("frequencies are not strictly increasing"));
        }
        Ok(())
    }

    pub fn is_table(&self) -> bool {
        matches!(self, BcValue::Table { .. })
    }

    /// Value at `frequency` (Hz)
    pub fn evaluate(&self, frequency: f64) -> Complex64 {
        match self {
            BcValue::Scalar(value) => *value,
            BcValue::Table { frequencies, values } => {
                let n = frequencies.len().min(values.len());
                if n == 0 {
                    return Complex64::new(0.0, 0.0);
                }
                if frequency <= frequencies[0] {
                    return values[0];
                }
                if frequency >= frequencies[n - 1] {
                    return values[n - 1];
                }
                let hi = frequencies[..n].partition_point(|&f| f <= frequency);
                let lo = hi - 1;
                let t = (frequency - frequencies[lo]) / (frequencies[hi] - frequencies[lo]);
                values[lo] + (values[hi] - values[lo]) * t
            }
        }
    }
}

impl From<f64> for BcValue {
    fn from(value: f64) -> Self {
        BcValue::real(value)
    }
}

impl From<Complex64> for BcValue {
    fn from(value: Complex64) -> Self {
        BcValue::Scalar(value)
    }
}

/// Per-DOF values of one structural node attachment
///
/// Order: ux, uy, uz, rx, ry, rz. `None` leaves the DOF untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DofValues(pub [Option<BcValue>; STRUCTURAL_DOFS_PER_NODE]);

impl DofValues {
    pub fn new(values: [Option<BcValue>; STRUCTURAL_DOFS_PER_NODE]) -> Self {
        Self(values)
    }

    /// Same value on every DOF
    pub fn all(value: impl Into<BcValue>) -> Self {
        let value = value.into();
        Self(std::array::from_fn(|_| Some(value.clone())))
    }

    /// Same value on the three translations only
    pub fn translations(value: impl Into<BcValue>) -> Self {
        let value = value.into();
        Self(std::array::from_fn(|i| (i < 3).then(|| value.clone())))
    }

    /// Every DOF held at zero
    pub fn clamped() -> Self {
        Self::all(0.0)
    }

    /// A single DOF set
    pub fn single(dof: usize, value: impl Into<BcValue>) -> Self {
        let mut values = Self::default();
        if dof < STRUCTURAL_DOFS_PER_NODE {
            values.0[dof] = Some(value.into());
        }
        values
    }

    /// Whether no DOF carries a value
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    /// Whether any DOF carries a frequency table
    pub fn has_tables(&self) -> bool {
        self.0.iter().flatten().any(BcValue::is_table)
    }

    /// Local indices of the DOFs that carry a value
    pub fn active_dofs(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|_| i))
    }

    pub fn get(&self, dof: usize) -> Option<&BcValue> {
        self.0.get(dof).and_then(Option::as_ref)
    }

    /// Values at `frequency`
    pub fn evaluate(&self, frequency: f64) -> [Option<Complex64>; STRUCTURAL_DOFS_PER_NODE] {
        std::array::from_fn(|i| self.0[i].as_ref().map(|v| v.evaluate(frequency)))
    }

    pub fn validate(&self) -> Result<()> {
        self.0.iter().flatten().try_for_each(BcValue::validate)
    }
}
