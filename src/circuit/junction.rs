//! Junctions and branches, the vertices and edges of the circuit graph.

use geo::Polygon;

use super::types::{BranchId, JunctionId};
use crate::components::BranchKind;
use crate::geometry::{self, Vector2};
use crate::JUNCTION_RADIUS;

/// A connection point.
#[derive(Debug, Clone, PartialEq)]
pub struct Junction {
    pub id: JunctionId,
    pub position: Vector2,
    /// Immovable (e.g. sealed inside a black box)
    pub fixed: bool,
    pub selected: bool,
    /// Voltage from the last solve
    pub voltage: f64,
    /// Optional name, e.g. from a layout file
    pub label: Option<String>,
}

impl Junction {
    /// Create a junction with a fresh id.
    pub fn new(position: Vector2) -> Self {
        Self {
            id: JunctionId::next(),
            position,
            fixed: false,
            selected: false,
            voltage: 0.0,
            label: None,
        }
    }

    /// Mark the junction as fixed.
    pub fn fixed(mut self) -> Self {
        self.fixed = true;
        self
    }

    /// Attach a label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Hit-test shape.
    pub fn shape(&self) -> Polygon<f64> {
        geometry::circle(self.position, JUNCTION_RADIUS)
    }
}

/// An edge between two distinct junctions.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub id: BranchId,
    pub start: JunctionId,
    pub end: JunctionId,
    pub kind: BranchKind,
    pub selected: bool,
    /// Current from the last solve, positive from start to end
    pub current: f64,
    pub label: Option<String>,
}

impl Branch {
    /// Create a branch with a fresh id.
    pub fn new(kind: BranchKind, start: JunctionId, end: JunctionId) -> Self {
        Self {
            id: BranchId::next(),
            start,
            end,
            kind,
            selected: false,
            current: 0.0,
            label: None,
        }
    }

    /// Attach a label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Whether the branch touches `junction`.
    pub fn has_junction(&self, junction: JunctionId) -> bool {
        self.start == junction || self.end == junction
    }

    /// The endpoint across the branch from `junction`.
    pub fn opposite(&self, junction: JunctionId) -> Option<JunctionId> {
        if self.start == junction {
            Some(self.end)
        } else if self.end == junction {
            Some(self.start)
        } else {
            None
        }
    }

    /// Swap every reference to `old` for `new`. Returns whether anything changed.
    pub fn replace_junction(&mut self, old: JunctionId, new: JunctionId) -> bool {
        let mut changed = false;
        if self.start == old {
            self.start = new;
            changed = true;
        }
        if self.end == old {
            self.end = new;
            changed = true;
        }
        changed
    }

    /// Hit-test shape given the endpoint positions.
    pub fn shape(&self, start: Vector2, end: Vector2) -> Polygon<f64> {
        geometry::segment_body(start, end, self.kind.body_half_width())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Resistor;
    use crate::geometry::vec2;

    #[test]
    fn test_fresh_ids_are_unique() {
        let a = Junction::new(vec2(0.0, 0.0));
        let b = Junction::new(vec2(0.0, 0.0));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_replace_and_opposite() {
        let a = JunctionId::next();
        let b = JunctionId::next();
        let c = JunctionId::next();
        let mut branch = Branch::new(BranchKind::Resistor(Resistor::new(1.0)), a, b);
        assert_eq!(branch.opposite(a), Some(b));
        assert_eq!(branch.opposite(c), None);
        assert!(branch.replace_junction(a, c));
        assert!(!branch.replace_junction(a, c));
        assert_eq!(branch.start, c);
        assert!(branch.has_junction(b));
    }
}
