//! Slenderness of straight structural branches
//!
//! Timoshenko beam theory loses accuracy once a straight run is short
//! compared to its section. Consecutive colinear elements with the same
//! section are merged into one run before the check, since a finely meshed
//! straight pipe behaves as one beam.

use crate::mesh::{Element, Mesh};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tolerance on `|d1 · d2|` for two elements to count as colinear
const COLINEAR_TOLERANCE: f64 = 1e-6;

/// A straight run shorter than `threshold` section dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamRatioWarning {
    /// Elements forming the run, ascending
    pub element_ids: Vec<usize>,
    /// Total length of the run (m)
    pub length: f64,
    /// Length over characteristic section dimension
    pub ratio: f64,
}

/// Disjoint sets over element positions
struct Runs {
    parent: Vec<usize>,
}

impl Runs {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }
}

fn is_checked(element: &Element) -> bool {
    let props = &element.properties;
    props.structural_kind.as_ref().is_some_and(|kind| kind.is_continuous()) && props.section.is_some()
}

fn continues(a: &Element, b: &Element) -> bool {
    a.properties.section == b.properties.section
        && a.direction.dot(&b.direction).abs() >= 1.0 - COLINEAR_TOLERANCE
}

/// Straight runs whose length-to-section ratio is below `threshold`
pub fn beam_ratio_warnings(mesh: &Mesh, threshold: f64) -> Vec<BeamRatioWarning> {
    let elements = mesh.elements();
    let position: BTreeMap<usize, usize> = elements.iter().enumerate().map(|(pos, e)| (e.id, pos)).collect();
    let mut runs = Runs::new(elements.len());

    for node in mesh.nodes() {
        let incident: Vec<&Element> = match mesh.incident_elements(node.id) {
            Ok(list) => list.into_iter().filter(|e| e.properties.structural_kind.is_some()).collect(),
            Err(_) => continue,
        };
        // Junctions and free ends break a run
        if let [a, b] = incident[..] {
            if is_checked(a) && is_checked(b) && continues(a, b) {
                runs.union(position[&a.id], position[&b.id]);
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<&Element>> = BTreeMap::new();
    for (pos, element) in elements.iter().enumerate() {
        if is_checked(element) {
            groups.entry(runs.find(pos)).or_default().push(element);
        }
    }

    let mut warnings = Vec::new();
    for members in groups.values() {
        let Some(dimension) = members[0]
            .properties
            .section
            .as_ref()
            .map(|section| section.characteristic_dimension())
            .filter(|&d| d > 0.0)
        else {
            continue;
        };
        let length: f64 = members.iter().map(|e| e.length).sum();
        let ratio = length / dimension;
        if ratio < threshold {
            let mut element_ids: Vec<usize> = members.iter().map(|e| e.id).collect();
            element_ids.sort_unstable();
            log::warn!("straight run {element_ids:?} has length/section ratio {ratio:.2} below {threshold}");
            warnings.push(BeamRatioWarning {
                element_ids,
                length,
                ratio,
            });
        }
    }
    warnings
}
