//! Circuit topology graph.
//!
//! This module provides the live, editable representation of a circuit.
//! The [`Circuit`] struct owns all junctions and branches and offers the
//! connectivity queries, structural edits (split, collapse, connect), drag
//! snapping, selection, and probe measurements that interactive editing needs.

mod drag;
mod graph;
mod junction;
mod probe;
mod selection;
mod types;
mod validate;

pub use graph::{Circuit, SPLIT_OFFSET};
pub use junction::{Branch, Junction};
pub use types::*;
pub use validate::validate_circuit;
