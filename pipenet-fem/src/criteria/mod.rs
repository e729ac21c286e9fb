//! Post-solve validity checks
//!
//! - [`validity_warnings`]: frequency ranges of the acoustic models and of
//!   the radiation impedances
//! - [`beam_ratio_warnings`]: slenderness of straight structural branches
//!
//! Every check is non-fatal; its findings travel with the solution.

mod acoustic;
mod beam;

pub use acoustic::*;
pub use beam::*;

use serde::{Deserialize, Serialize};

/// Closed frequency interval (Hz)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyRange {
    pub min: f64,
    /// `f64::INFINITY` when unbounded
    pub max: f64,
}

impl FrequencyRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn up_to(max: f64) -> Self {
        Self::new(0.0, max)
    }

    pub fn contains(&self, frequency: f64) -> bool {
        self.min <= frequency && frequency <= self.max
    }

    /// Overlap of two ranges, `None` when disjoint
    pub fn intersect(&self, other: &FrequencyRange) -> Option<FrequencyRange> {
        let range = FrequencyRange::new(self.min.max(other.min), self.max.min(other.max));
        (range.min <= range.max).then_some(range)
    }
}
