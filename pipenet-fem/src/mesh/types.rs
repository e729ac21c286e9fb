//! Mesh entities for 1D piping networks
//!
//! Nodes live in 3D space, elements are straight two-node segments. Every edge
//! produces a single [`Element`] record that acts both as the structural
//! element and as the acoustic element of the same id; which system it joins
//! is decided by its structural and acoustic kinds.

use crate::properties::ElementProperties;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Structural DOFs per node: ux, uy, uz, rx, ry, rz
pub const STRUCTURAL_DOFS_PER_NODE: usize = 6;

/// Acoustic DOFs per node: pressure
pub const ACOUSTIC_DOFS_PER_NODE: usize = 1;

/// A point in 3D space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    /// Create a point
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        other.sub(self).norm()
    }

    /// Component-wise difference `self - other`
    pub fn sub(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    /// Dot product
    pub fn dot(&self, other: &Point) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product
    pub fn cross(&self, other: &Point) -> Point {
        Point::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Scale every component
    pub fn scale(&self, factor: f64) -> Point {
        Point::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// Euclidean norm
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector along `self`, or `None` for the zero vector
    pub fn normalized(&self) -> Option<Point> {
        let n = self.norm();
        (n > 0.0).then(|| self.scale(1.0 / n))
    }

    /// Components as an array
    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<(f64, f64, f64)> for Point {
    fn from(p: (f64, f64, f64)) -> Self {
        Point::new(p.0, p.1, p.2)
    }
}

/// The two physical systems sharing the mesh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Physics {
    #[default]
    Structural,
    Acoustic,
}

impl Physics {
    /// DOFs per node
    pub fn dofs_per_node(&self) -> usize {
        match self {
            Physics::Structural => STRUCTURAL_DOFS_PER_NODE,
            Physics::Acoustic => ACOUSTIC_DOFS_PER_NODE,
        }
    }

    /// DOFs per two-node element
    pub fn dofs_per_element(&self) -> usize {
        2 * self.dofs_per_node()
    }
}

/// Raw node as supplied by geometry preprocessing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    pub id: usize,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl RawNode {
    pub fn new(id: usize, x: f64, y: f64, z: f64) -> Self {
        Self { id, x, y, z }
    }
}

/// Raw edge between two node ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEdge {
    pub id: usize,
    pub first: usize,
    pub last: usize,
}

impl RawEdge {
    pub fn new(id: usize, first: usize, last: usize) -> Self {
        Self { id, first, last }
    }
}

/// Mesh node
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// External id
    pub id: usize,
    /// Position in the depth-first ordering; drives every DOF index
    pub global_index: usize,
    pub coordinates: Point,
}

impl Node {
    /// Global DOF range of this node in the given system
    pub fn dofs(&self, physics: Physics) -> Range<usize> {
        let n = physics.dofs_per_node();
        n * self.global_index..n * (self.global_index + 1)
    }

    /// The six structural DOFs
    pub fn structural_dofs(&self) -> [usize; STRUCTURAL_DOFS_PER_NODE] {
        let base = STRUCTURAL_DOFS_PER_NODE * self.global_index;
        std::array::from_fn(|i| base + i)
    }

    /// The acoustic pressure DOF
    pub fn acoustic_dof(&self) -> usize {
        self.global_index
    }
}

/// Which end of an element a node sits at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndPosition {
    First,
    Last,
}

impl EndPosition {
    /// 0 for the first node, 1 for the last
    pub fn index(&self) -> usize {
        match self {
            EndPosition::First => 0,
            EndPosition::Last => 1,
        }
    }
}

/// Two-node line element
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// External id
    pub id: usize,
    /// External id of the first node
    pub first_node: usize,
    /// External id of the last node
    pub last_node: usize,
    /// Global index of the first node
    pub first_index: usize,
    /// Global index of the last node
    pub last_index: usize,
    pub length: f64,
    /// Unit vector from the first to the last node
    pub direction: Point,
    pub properties: ElementProperties,
}

impl Element {
    /// Global DOFs in local order (first node block, then last node block)
    pub fn dofs(&self, physics: Physics) -> Vec<usize> {
        let n = physics.dofs_per_node();
        (n * self.first_index..n * (self.first_index + 1))
            .chain(n * self.last_index..n * (self.last_index + 1))
            .collect()
    }

    /// Position of `node_id` on this element
    pub fn position_of(&self, node_id: usize) -> Option<EndPosition> {
        if node_id == self.first_node {
            Some(EndPosition::First)
        } else if node_id == self.last_node {
            Some(EndPosition::Last)
        } else {
            None
        }
    }

    /// The node at the opposite end from `node_id`
    pub fn other_node(&self, node_id: usize) -> Option<usize> {
        match self.position_of(node_id)? {
            EndPosition::First => Some(self.last_node),
            EndPosition::Last => Some(self.first_node),
        }
    }

    /// Unit vector pointing from `node_id` into the element
    pub fn inward_direction(&self, node_id: usize) -> Option<Point> {
        match self.position_of(node_id)? {
            EndPosition::First => Some(self.direction),
            EndPosition::Last => Some(self.direction.scale(-1.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_point_algebra() {
        let a = Point::new(1.0, 0.0, 0.0);
        let b = Point::new(0.0, 1.0, 0.0);
        assert_eq!(a.cross(&b), Point::new(0.0, 0.0, 1.0));
        assert_relative_eq!(a.distance(&b), 2.0_f64.sqrt());
        assert!(Point::default().normalized().is_none());
    }

    #[test]
    fn test_node_dofs() {
        let node = Node {
            id: 10,
            global_index: 2,
            coordinates: Point::default(),
        };
        assert_eq!(node.structural_dofs(), [12, 13, 14, 15, 16, 17]);
        assert_eq!(node.dofs(Physics::Structural), 12..18);
        assert_eq!(node.dofs(Physics::Acoustic), 2..3);
    }

    #[test]
    fn test_element_orientation() {
        let element = Element {
            id: 1,
            first_node: 5,
            last_node: 6,
            first_index: 1,
            last_index: 0,
            length: 2.0,
            direction: Point::new(0.0, 0.0, 1.0),
            properties: ElementProperties::default(),
        };
        assert_eq!(element.dofs(Physics::Acoustic), vec![1, 0]);
        assert_eq!(element.dofs(Physics::Structural)[6], 0);
        assert_eq!(element.other_node(5), Some(6));
        assert_eq!(element.position_of(7), None);
        assert_eq!(element.inward_direction(6), Some(Point::new(0.0, 0.0, -1.0)));
    }
}
