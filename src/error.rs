//! Error types for the circuit core.
//!
//! This module provides a unified error type [`CircuitError`] that covers
//! layout parsing, structural edits of the topology graph, and simulation.
//! Numeric degeneracies (floating nodes, ideal source loops) are absorbed by
//! the solver and never surface here.

use thiserror::Error;

use crate::circuit::{BranchId, JunctionId};

/// Result type alias using [`CircuitError`].
pub type Result<T> = std::result::Result<T, CircuitError>;

/// Unified error type for all circuit operations.
#[derive(Error, Debug)]
pub enum CircuitError {
    // ============ Layout Parsing Errors ============
    /// Error during lexical analysis
    #[error("Lexer error at line {line}, column {column}: {message}")]
    LexerError {
        line: usize,
        column: usize,
        message: String,
    },

    /// Error during parsing
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// Invalid component definition
    #[error("Invalid component '{name}' at line {line}: {message}")]
    InvalidComponent {
        name: String,
        line: usize,
        message: String,
    },

    /// Unknown component type
    #[error("Unknown component type '{component_type}' at line {line}")]
    UnknownComponentType { component_type: String, line: usize },

    /// Invalid parameter value
    #[error("Invalid parameter '{param}' for component '{component}': {message}")]
    InvalidParameter {
        component: String,
        param: String,
        message: String,
    },

    /// A branch refers to a junction name that was never declared
    #[error("Junction '{name}' referenced at line {line} is not declared (use '.junction {name} <x> <y>')")]
    UndefinedJunction { name: String, line: usize },

    /// Duplicate junction name
    #[error("Duplicate junction name '{name}'")]
    DuplicateJunction { name: String },

    /// Duplicate component name
    #[error("Duplicate component name '{name}'")]
    DuplicateComponent { name: String },

    // ============ Topology Errors ============
    /// Invalid circuit topology
    #[error("Invalid circuit topology: {message}")]
    InvalidTopology { message: String },

    /// Junction id not present in the circuit
    #[error("Junction {0} is not part of the circuit")]
    UnknownJunction(JunctionId),

    /// Branch id not present in the circuit
    #[error("Branch {0} is not part of the circuit")]
    UnknownBranch(BranchId),

    /// Caller violated the precondition of a structural edit
    #[error("Precondition violated: {message}")]
    Precondition { message: String },

    // ============ Simulation Errors ============
    /// Matrix is singular and cannot be solved
    #[error("Singular matrix - circuit may contain a loop of ideal sources or an isolated current source")]
    SingularMatrix,

    /// Invalid simulation parameter
    #[error("Invalid simulation parameter: {message}")]
    InvalidSimulationParam { message: String },

    // ============ I/O Errors ============
    /// Error reading layout file
    #[error("Failed to read layout file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ============ WASM Errors ============
    /// WASM-specific error
    #[cfg(feature = "wasm")]
    #[error("WASM error: {message}")]
    WasmError { message: String },
}

impl CircuitError {
    /// Create a lexer error
    pub fn lexer(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::LexerError {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
        }
    }

    /// Create an invalid component error
    pub fn invalid_component(name: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::InvalidComponent {
            name: name.into(),
            line,
            message: message.into(),
        }
    }

    /// Create an invalid topology error
    pub fn invalid_topology(message: impl Into<String>) -> Self {
        Self::InvalidTopology {
            message: message.into(),
        }
    }

    /// Create a precondition error
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }
}
