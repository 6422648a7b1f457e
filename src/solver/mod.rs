//! MNA (Modified Nodal Analysis) solver.
//!
//! This module provides the numerical engine for circuit simulation.
//!
//! ## Modified Nodal Analysis
//!
//! MNA assembles a system of equations Ax = z where:
//! - x contains node voltages and voltage source currents
//! - A is the conductance/coefficient matrix
//! - z is the source vector
//!
//! The matrix structure is:
//! ```text
//! [ G   B ] [ v ]   [ i ]
//! [ C   D ] [ j ] = [ e ]
//! ```
//!
//! where:
//! - G is the conductance matrix (node equations)
//! - B, C connect voltage sources to nodes
//! - D is 0, or a tiny series resistance when the system is regularized
//! - v is the vector of node voltages
//! - j is the vector of voltage source currents
//! - i is the sum of current sources into each node
//! - e is the vector of voltage source values
//!
//! Every circuit branch is first lowered to companion elements (batteries,
//! resistors, current sources) by [`CompanionBuilder`]; [`CircuitSolver`] drives
//! that lowering, the solve, and the write-back once per tick.

mod circuit_solver;
mod companion;
mod matrix;
mod mna;
mod solution;

pub use circuit_solver::{CircuitSolver, SolverConfig};
pub use companion::{CompanionBuilder, CurrentProbe};
pub use matrix::{solve_linear_system, DenseMatrix, LuDecomposition};
pub use mna::{CompanionBattery, CompanionCurrentSource, CompanionResistor, ElementId, MnaCircuit};
pub use solution::MnaSolution;

/// Minimum conductance to reference used to regularize a singular matrix.
pub const MIN_CONDUCTANCE: f64 = 1e-12;

/// Series resistance given to voltage sources when regularizing (ohms).
pub const DEFAULT_SOURCE_RESISTANCE: f64 = 1e-9;

/// Resistances below this (ohms) are solved as ideal shorts.
pub const SHORT_CIRCUIT_RESISTANCE: f64 = 1e-12;

/// Relative pivot threshold for singularity detection.
pub const PIVOT_TOLERANCE: f64 = 1e-13;
