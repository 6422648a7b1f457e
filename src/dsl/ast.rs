//! Abstract Syntax Tree types for the layout DSL.

use std::collections::HashMap;

/// Complete AST representation of a parsed layout.
#[derive(Debug, Clone, Default)]
pub struct LayoutAst {
    /// Junction declarations in source order
    pub junctions: Vec<JunctionDef>,
    /// Branch definitions in source order
    pub branches: Vec<BranchDef>,
}

impl LayoutAst {
    /// Create a new empty layout AST.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a junction declaration by name.
    pub fn junction(&self, name: &str) -> Option<&JunctionDef> {
        self.junctions.iter().find(|j| j.name == name)
    }
}

/// A `.junction` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct JunctionDef {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub fixed: bool,
    /// Source line number for error reporting
    pub line: usize,
}

/// A branch definition from the DSL.
#[derive(Debug, Clone)]
pub struct BranchDef {
    /// Branch type (W, R, B, SW, I, C)
    pub branch_type: BranchType,
    /// Unique branch name
    pub name: String,
    /// Start junction name
    pub start: String,
    /// End junction name
    pub end: String,
    /// Primary value (resistance, voltage, current, capacitance)
    pub value: Option<f64>,
    /// Switch position given as `closed`/`open` (or `on`/`off`)
    pub state: Option<bool>,
    /// `key=value` parameters, keys lowercased
    pub params: HashMap<String, f64>,
    /// Source line number for error reporting
    pub line: usize,
}

/// Branch types supported by the DSL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchType {
    Wire,
    Resistor,
    Battery,
    Switch,
    CurrentSource,
    Capacitor,
}

impl BranchType {
    /// Parse a branch type from its single-character prefix.
    pub fn from_prefix(prefix: char) -> Option<Self> {
        match prefix.to_ascii_uppercase() {
            'W' => Some(Self::Wire),
            'R' => Some(Self::Resistor),
            'B' | 'V' => Some(Self::Battery),
            'I' => Some(Self::CurrentSource),
            'C' => Some(Self::Capacitor),
            _ => None,
        }
    }

    /// Parse a branch type from a multi-character prefix.
    pub fn from_keyword(name: &str) -> Option<Self> {
        let upper = name.to_ascii_uppercase();
        if upper.starts_with("SW") {
            Some(Self::Switch)
        } else {
            None
        }
    }

    /// Whether a definition of this type must carry a primary value.
    pub fn requires_value(&self) -> bool {
        !matches!(self, Self::Wire | Self::Switch)
    }
}
