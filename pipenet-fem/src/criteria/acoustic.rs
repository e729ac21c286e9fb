//! Frequency ranges of the acoustic models
//!
//! | model              | lower bound      | upper bound                |
//! |--------------------|------------------|----------------------------|
//! | plane wave         | none             | cut-on `1.841 c / (2π a)`  |
//! | wide duct          | shear number 10  | cut-on                     |
//! | low reduced freq.  | none             | `ka = 1`                   |
//! | radiation (open)   | none             | `ka = 1`                   |

use super::FrequencyRange;
use crate::assembly::terminating_element;
use crate::attachments::{AcousticTermination, Attachments};
use crate::error::Result;
use crate::mesh::{Element, Mesh};
use crate::properties::AcousticKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fmt;

/// First zero of J1', setting the cut-on of the first transverse mode
const CUT_ON_ROOT: f64 = 1.841;

/// Shear number above which boundary-layer losses are thin
const MIN_SHEAR_NUMBER: f64 = 10.0;

/// Physical model whose range is checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    PlaneWave,
    WideDuct,
    LowReducedFrequency,
    RadiationImpedance,
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Criterion::PlaneWave => "plane-wave propagation",
            Criterion::WideDuct => "wide-duct model",
            Criterion::LowReducedFrequency => "low reduced frequency model",
            Criterion::RadiationImpedance => "radiation impedance",
        };
        f.write_str(name)
    }
}

/// Requested frequencies fall outside the range of a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidityWarning {
    pub criterion: Criterion,
    /// Range shared by every element under this criterion, `None` if empty
    pub valid_range: Option<FrequencyRange>,
    /// Elements whose own range misses a requested frequency; for radiation
    /// impedances, the element closing the terminated node
    pub offending_ids: Vec<usize>,
}

/// Cut-on frequency of the first non-planar mode of a duct
pub fn cut_on_frequency(speed_of_sound: f64, radius: f64) -> f64 {
    CUT_ON_ROOT * speed_of_sound / (2.0 * PI * radius)
}

/// Frequency at which the Helmholtz number reaches `ka`
fn helmholtz_frequency(ka: f64, speed_of_sound: f64, radius: f64) -> f64 {
    ka * speed_of_sound / (2.0 * PI * radius)
}

/// Criterion and range of an acoustic element, if it carries a model
pub fn element_validity(element: &Element) -> Option<(Criterion, FrequencyRange)> {
    let props = &element.properties;
    let kind = props.acoustic_kind?;
    let fluid = props.fluid.as_ref()?;
    let radius = props.inner_radius()?;
    let c = fluid.speed_of_sound;
    Some(match kind {
        AcousticKind::PlaneWave => (Criterion::PlaneWave, FrequencyRange::up_to(cut_on_frequency(c, radius))),
        AcousticKind::WideDuct => {
            // s = a √(ω/ν) ≥ s_min
            let min = MIN_SHEAR_NUMBER.powi(2) * fluid.kinematic_viscosity() / (2.0 * PI * radius * radius);
            (
                Criterion::WideDuct,
                FrequencyRange::new(min, cut_on_frequency(c, radius)),
            )
        }
        AcousticKind::LrfFluidEquivalent | AcousticKind::LrfFull => (
            Criterion::LowReducedFrequency,
            FrequencyRange::up_to(helmholtz_frequency(1.0, c, radius)),
        ),
    })
}

fn radiation_ranges(mesh: &Mesh, attachments: &Attachments) -> Result<Vec<(usize, FrequencyRange)>> {
    let mut ranges = Vec::new();
    for (node_id, termination) in attachments.terminations() {
        let AcousticTermination::Radiation(kind) = termination else {
            continue;
        };
        let Some(max_ka) = kind.max_ka() else {
            continue;
        };
        let Some(element) = terminating_element(mesh, node_id)? else {
            continue;
        };
        let props = &element.properties;
        if let (Some(fluid), Some(radius)) = (props.fluid.as_ref(), props.inner_radius()) {
            let max = helmholtz_frequency(max_ka, fluid.speed_of_sound, radius);
            ranges.push((element.id, FrequencyRange::up_to(max)));
        }
    }
    Ok(ranges)
}

/// One warning per criterion that misses any of `frequencies`
pub fn validity_warnings(mesh: &Mesh, attachments: &Attachments, frequencies: &[f64]) -> Result<Vec<ValidityWarning>> {
    let mut ranges: BTreeMap<Criterion, Vec<(usize, FrequencyRange)>> = BTreeMap::new();
    for (criterion, entry) in mesh
        .acoustic_elements()
        .filter_map(|element| element_validity(element).map(|(criterion, range)| (criterion, (element.id, range))))
    {
        ranges.entry(criterion).or_default().push(entry);
    }
    for entry in radiation_ranges(mesh, attachments)? {
        ranges.entry(Criterion::RadiationImpedance).or_default().push(entry);
    }

    let mut warnings = Vec::new();
    for (criterion, entries) in ranges {
        let mut offending_ids: Vec<usize> = entries
            .iter()
            .filter(|(_, range)| frequencies.iter().any(|&f| !range.contains(f)))
            .map(|&(id, _)| id)
            .collect();
        if offending_ids.is_empty() {
            continue;
        }
        offending_ids.sort_unstable();
        offending_ids.dedup();

        let valid_range = entries
            .iter()
            .try_fold(FrequencyRange::new(0.0, f64::INFINITY), |acc, (_, range)| {
                acc.intersect(range)
            });
        log::warn!(
            "frequencies outside the {criterion} range {valid_range:?} on elements {offending_ids:?}"
        );
        warnings.push(ValidityWarning {
            criterion,
            valid_range,
            offending_ids,
        });
    }
    Ok(warnings)
}
