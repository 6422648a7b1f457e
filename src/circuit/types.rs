//! Core identifier and notification types for the topology graph.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_JUNCTION_ID: AtomicUsize = AtomicUsize::new(1);
static NEXT_BRANCH_ID: AtomicUsize = AtomicUsize::new(1);

/// A unique identifier for a junction.
///
/// Ids are process-unique so junctions moved between circuits never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JunctionId(pub usize);

impl JunctionId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        JunctionId(NEXT_JUNCTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for JunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "J{}", self.0)
    }
}

/// A unique identifier for a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchId(pub usize);

impl BranchId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        BranchId(NEXT_BRANCH_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}", self.0)
    }
}

/// Change notification emitted by a [`Circuit`](super::Circuit).
#[derive(Debug, Clone, PartialEq)]
pub enum CircuitEvent {
    /// Electrical topology changed; a re-solve is required.
    /// Always followed by [`CircuitEvent::CircuitChanged`].
    KirchhoffChanged,
    /// Anything visible changed (topology or geometry).
    CircuitChanged,
    /// A junction was split into one junction per adjacent branch.
    JunctionSplit {
        original: JunctionId,
        created: Vec<JunctionId>,
    },
    /// Two coincident junctions were merged.
    JunctionsCollapsed {
        removed: [JunctionId; 2],
        replacement: JunctionId,
    },
    /// Junction or branch selection changed.
    SelectionChanged,
}

/// Receiver of [`CircuitEvent`]s.
///
/// Any `FnMut(&CircuitEvent)` closure is an observer.
pub trait CircuitObserver {
    fn on_event(&mut self, event: &CircuitEvent);
}

impl<F: FnMut(&CircuitEvent)> CircuitObserver for F {
    fn on_event(&mut self, event: &CircuitEvent) {
        self(event)
    }
}

/// Result of a snap-target search while dragging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragMatch {
    /// Dragged junction that would snap.
    pub source: JunctionId,
    /// Stationary junction it would snap onto.
    pub target: JunctionId,
    /// Distance between the translated source and the target.
    pub distance: f64,
}

/// Where a probe touches the circuit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    /// Junction the measurement is taken relative to.
    pub junction: JunctionId,
    /// Extra voltage between the junction and the probe point.
    pub voltage_addon: f64,
}
