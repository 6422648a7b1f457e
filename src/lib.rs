//! # Circuit Core
//!
//! The model behind an interactive circuit construction kit.
//!
//! This library provides:
//! - A live topology graph of junctions and branches that supports the edits
//!   a drag-and-drop editor needs (split, collapse, connect, drag snapping)
//! - Modified Nodal Analysis (MNA) of the resulting linear circuit
//! - Voltmeter-style probes and a text format for describing layouts
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`circuit`] - Topology graph, structural edits, selection, probes
//! - [`components`] - Branch kinds (wires, resistors, batteries, switches, ...)
//! - [`solver`] - Companion models, MNA assembly and numerical solving
//! - [`dsl`] - Parser for the layout description language
//! - [`geometry`] - Positions and hit-testing shapes
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! circuitsim flashlight.layout --ticks 10 --dt 0.016 --probe b a
//! ```
//!
//! ### Library
//!
//! ```no_run
//! use circuit_core::{dsl, CircuitSolver};
//!
//! let mut circuit = dsl::load(".junction a 0 0\n.junction b 1 0\nB1 a b 9\nR1 b a 3").unwrap();
//! let mut solver = CircuitSolver::new();
//! solver.solve(&mut circuit, circuit_core::DEFAULT_TIME_STEP).unwrap();
//! ```
//!
//! ## Circuit Simulation Method
//!
//! Each tick, every branch is lowered to linear companion elements:
//! batteries, resistors and current sources. Capacitors use the trapezoidal
//! rule. The resulting system is solved with MNA:
//!
//! 1. Number junctions and pick one reference node per connected component
//! 2. Assemble the system matrix A and source vector z
//! 3. Solve Ax = z by LU decomposition, regularizing if A is singular
//! 4. Write voltages and currents back onto junctions and branches

pub mod circuit;
pub mod components;
pub mod dsl;
pub mod error;
pub mod geometry;
pub mod solver;

// Re-export main types for convenience
pub use circuit::Circuit;
pub use error::{CircuitError, Result};
pub use solver::{CircuitSolver, MnaCircuit, MnaSolution, SolverConfig};

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::WasmCircuitSim;

/// Radius of a junction's hit-testing circle, in model units.
pub const JUNCTION_RADIUS: f64 = 0.16;

/// Largest distance at which a dragged junction snaps onto another.
pub const STICKY_THRESHOLD: f64 = 0.5;

/// Distance below which two positions are treated as coincident.
pub const EPSILON: f64 = 1e-6;

/// Default tick length in seconds (one frame at 60 Hz).
pub const DEFAULT_TIME_STEP: f64 = 1.0 / 60.0;
