//! DSL (Domain Specific Language) parser for circuit layouts.
//!
//! This module provides a SPICE-inspired text-based language for describing
//! a circuit as it sits on the canvas: junctions with positions, and the
//! branches strung between them. The DSL is line-oriented and human-editable.
//!
//! # Grammar Overview
//!
//! ```text
//! layout      = { line }
//! line        = comment | directive | branch | empty
//! comment     = ('#' | ';') { any_char }
//! directive   = (".junction" | ".j") junction number number ["fixed"]
//! branch      = type_name junction junction { value | state | param }
//!
//! type_name   = ("W" | "R" | "B" | "V" | "I" | "C" | "SW") { ident_char }
//! junction    = identifier | number
//! value       = number [si_prefix]
//! state       = "closed" | "on" | "open" | "off"      (switches only)
//! param       = identifier '=' value
//!
//! number      = ['-' | '+'] decimal [('e'|'E') ['-'|'+'] digit+]
//! si_prefix   = 'p' | 'n' | 'u' | 'm' | 'k' | 'M' | 'G'
//! ```
//!
//! Coordinates are plain numbers; they take no SI prefix. Keywords are
//! case-insensitive and reserved, so `fixed`, `on` or `open` cannot name a
//! junction.
//!
//! # Branch Types
//!
//! | Type | Description | Syntax |
//! |------|-------------|--------|
//! | W | Wire | `W<name> <a> <b> [rho=<ohms per unit>]` |
//! | R | Resistor | `R<name> <a> <b> <value>` |
//! | B, V | Battery | `B<name> <a> <b> <volts> [r=<internal>]` |
//! | SW | Switch | `SW<name> <a> <b> [closed\|open\|state=<1\|0>]` |
//! | I | Current Source | `I<name> <a> <b> <amps>` |
//! | C | Capacitor | `C<name> <a> <b> <farads>` |
//!
//! A battery's end junction is its positive terminal; sources push current
//! from start to end.
//!
//! # Example
//!
//! ```text
//! # Lamp-less flashlight
//! .junction a 0 0
//! .junction b 4 0
//! .junction c 4 3
//!
//! B1  a b 9 r=0.5
//! R1  b c 1k
//! SW1 c a closed
//! ```

mod ast;
mod build;
mod lexer;
mod parser;

pub use ast::*;
pub use build::build_circuit;
pub use lexer::{parse_quantity, Lexer, Token, TokenKind};
pub use parser::Parser;

use crate::circuit::Circuit;
use crate::error::Result;

/// Parse a layout DSL string into an AST.
pub fn parse(input: &str) -> Result<LayoutAst> {
    Parser::new(Lexer::new(input))?.parse()
}

/// Parse a layout DSL string and build the circuit it describes.
pub fn load(input: &str) -> Result<Circuit> {
    build_circuit(&parse(input)?)
}

/// Parse a layout DSL file.
#[cfg(feature = "cli")]
pub fn parse_file(path: &std::path::Path) -> Result<LayoutAst> {
    let content = std::fs::read_to_string(path).map_err(|e| crate::error::CircuitError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse(&content)
}
