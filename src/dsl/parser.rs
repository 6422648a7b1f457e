//! Parser for the layout DSL.

use std::collections::{HashMap, HashSet};

use super::ast::*;
use super::lexer::{Lexer, Token, TokenKind};
use crate::error::{CircuitError, Result};

/// Parser for layout DSL.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    /// Create a new parser, reading the first token from `lexer`.
    pub fn new(mut lexer: Lexer<'a>) -> Result<Self> {
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    /// Parse the entire layout description.
    pub fn parse(&mut self) -> Result<LayoutAst> {
        let mut ast = LayoutAst::new();
        let mut branch_names = HashSet::new();

        while self.current.kind != TokenKind::Eof {
            match self.current.kind {
                TokenKind::Newline => {
                    self.advance()?;
                    continue;
                }
                TokenKind::Junction => self.parse_junction(&mut ast)?,
                TokenKind::Name => {
                    let branch = self.parse_branch()?;
                    if !branch_names.insert(branch.name.clone()) {
                        return Err(CircuitError::DuplicateComponent { name: branch.name });
                    }
                    ast.branches.push(branch);
                }
                _ => {
                    return Err(CircuitError::parse(
                        self.current.line,
                        format!("unexpected token: {:?}", self.current.text),
                    ));
                }
            }

            match self.current.kind {
                TokenKind::Newline => self.advance()?,
                TokenKind::Eof => {}
                _ => {
                    return Err(CircuitError::parse(
                        self.current.line,
                        format!("unexpected trailing token: {:?}", self.current.text),
                    ));
                }
            }
        }

        Ok(ast)
    }

    fn advance(&mut self) -> Result<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    /// Consume a name token. Junction names may be plain numbers.
    fn expect_name(&mut self) -> Result<String> {
        match self.current.kind {
            TokenKind::Name | TokenKind::Number(_) => {
                let text = std::mem::take(&mut self.current.text);
                self.advance()?;
                Ok(text)
            }
            _ => Err(CircuitError::parse(
                self.current.line,
                format!("expected a name, got {:?}", self.current.text),
            )),
        }
    }

    fn expect_coordinate(&mut self) -> Result<f64> {
        match self.current.kind {
            TokenKind::Number(v) => {
                self.advance()?;
                Ok(v)
            }
            TokenKind::Scaled(_) => Err(CircuitError::parse(
                self.current.line,
                format!("coordinate {} takes no unit prefix", self.current.text),
            )),
            _ => Err(CircuitError::parse(
                self.current.line,
                format!("expected a coordinate, got {:?}", self.current.text),
            )),
        }
    }

    fn expect_value(&mut self) -> Result<f64> {
        match self.current.kind {
            TokenKind::Number(v) | TokenKind::Scaled(v) => {
                self.advance()?;
                Ok(v)
            }
            _ => Err(CircuitError::parse(
                self.current.line,
                format!("expected a value, got {:?}", self.current.text),
            )),
        }
    }

    fn parse_junction(&mut self, ast: &mut LayoutAst) -> Result<()> {
        let line = self.current.line;
        self.advance()?;

        let name = self.expect_name()?;
        let x = self.expect_coordinate()?;
        let y = self.expect_coordinate()?;
        let fixed = self.current.kind == TokenKind::Fixed;
        if fixed {
            self.advance()?;
        }
        if ast.junction(&name).is_some() {
            return Err(CircuitError::DuplicateJunction { name });
        }
        ast.junctions.push(JunctionDef {
            name,
            x,
            y,
            fixed,
            line,
        });
        Ok(())
    }

    fn parse_branch(&mut self) -> Result<BranchDef> {
        let line = self.current.line;
        let name = self.expect_name()?;

        // Check multi-char prefixes first so SW isn't taken for something else
        let branch_type = match BranchType::from_keyword(&name) {
            Some(bt) => bt,
            None => name
                .chars()
                .next()
                .and_then(BranchType::from_prefix)
                .ok_or_else(|| CircuitError::UnknownComponentType {
                    component_type: name.clone(),
                    line,
                })?,
        };

        let start = self.expect_endpoint(&name, line)?;
        let end = self.expect_endpoint(&name, line)?;
        let mut value = None;
        let mut state = None;
        let mut params = HashMap::new();

        while !matches!(self.current.kind, TokenKind::Newline | TokenKind::Eof) {
            match self.current.kind {
                TokenKind::Name => {
                    let key = self.expect_name()?.to_lowercase();
                    if self.current.kind != TokenKind::Equals {
                        return Err(CircuitError::invalid_component(
                            &name,
                            line,
                            format!("unknown keyword '{}'", key),
                        ));
                    }
                    self.advance()?;
                    params.insert(key, self.expect_value()?);
                }
                TokenKind::Number(_) | TokenKind::Scaled(_) => {
                    if value.is_some() {
                        return Err(CircuitError::invalid_component(&name, line, "more than one value given"));
                    }
                    value = Some(self.expect_value()?);
                }
                TokenKind::SwitchState(closed) if branch_type == BranchType::Switch => {
                    self.advance()?;
                    state = Some(closed);
                }
                _ => {
                    return Err(CircuitError::parse(
                        line,
                        format!("unexpected token: {:?}", self.current.text),
                    ));
                }
            }
        }

        if branch_type.requires_value() && value.is_none() {
            return Err(CircuitError::invalid_component(&name, line, "missing value"));
        }

        Ok(BranchDef {
            branch_type,
            name,
            start,
            end,
            value,
            state,
            params,
            line,
        })
    }

    fn expect_endpoint(&mut self, branch: &str, line: usize) -> Result<String> {
        if matches!(self.current.kind, TokenKind::Newline | TokenKind::Eof) {
            return Err(CircuitError::invalid_component(branch, line, "expected 2 junctions"));
        }
        self.expect_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<LayoutAst> {
        super::super::parse(input)
    }

    #[test]
    fn test_parse_resistor() {
        let input = ".junction a 0 0\n.junction b 1 0\nR1 a b 10k";
        let ast = parse(input).unwrap();
        assert_eq!(ast.branches.len(), 1);
        assert_eq!(ast.branches[0].branch_type, BranchType::Resistor);
        assert_eq!(ast.branches[0].name, "R1");
        assert_eq!(ast.branches[0].start, "a");
        assert_eq!(ast.branches[0].end, "b");
        assert_eq!(ast.branches[0].value, Some(10_000.0));
    }

    #[test]
    fn test_parse_junctions() {
        let input = ".junction a -1 2.5\n.j 7 3 4 fixed";
        let ast = parse(input).unwrap();
        assert_eq!(
            ast.junctions[0],
            JunctionDef {
                name: "a".to_string(),
                x: -1.0,
                y: 2.5,
                fixed: false,
                line: 1,
            }
        );
        assert_eq!(ast.junctions[1].name, "7");
        assert!(ast.junctions[1].fixed);
    }

    #[test]
    fn test_coordinates_reject_unit_prefix() {
        assert!(matches!(
            parse(".junction a 1k 0"),
            Err(CircuitError::ParseError { line: 1, .. })
        ));
    }

    #[test]
    fn test_parse_battery_switch_and_params() {
        let input = "B1 a b 9 r=0.5\nV2 b c 1.5\nSW1 c d closed\nW1 d a rho=2m";
        let ast = parse(input).unwrap();
        assert_eq!(ast.branches[0].branch_type, BranchType::Battery);
        assert!((ast.branches[0].params["r"] - 0.5).abs() < 1e-15);
        assert_eq!(ast.branches[1].branch_type, BranchType::Battery);
        assert_eq!(ast.branches[2].branch_type, BranchType::Switch);
        assert_eq!(ast.branches[2].state, Some(true));
        assert_eq!(ast.branches[3].branch_type, BranchType::Wire);
        assert!((ast.branches[3].params["rho"] - 2e-3).abs() < 1e-15);
    }

    #[test]
    fn test_switch_state_only_on_switches() {
        assert!(matches!(
            parse("R1 a b 10 closed"),
            Err(CircuitError::ParseError { line: 1, .. })
        ));
        assert!(matches!(
            parse("SW1 a b ajar"),
            Err(CircuitError::InvalidComponent { .. })
        ));
    }

    #[test]
    fn test_parse_with_comments() {
        let input = "# This is a comment\nC1 a b 100u ; inline comment style\n";
        let ast = parse(input).unwrap();
        assert_eq!(ast.branches.len(), 1);
        assert_eq!(ast.branches[0].branch_type, BranchType::Capacitor);
    }

    #[test]
    fn test_missing_value_is_reported() {
        let err = parse("\nR1 a b").unwrap_err();
        assert!(matches!(err, CircuitError::InvalidComponent { line: 2, .. }));
        let err = parse("R1 a").unwrap_err();
        assert!(matches!(err, CircuitError::InvalidComponent { line: 1, .. }));
    }

    #[test]
    fn test_lexer_error_on_first_token_is_reported() {
        assert!(matches!(
            parse("@ junk\n.junction a 0 0"),
            Err(CircuitError::LexerError { line: 1, column: 1, .. })
        ));
        assert!(matches!(
            Parser::new(Lexer::new("@")),
            Err(CircuitError::LexerError { .. })
        ));
    }

    #[test]
    fn test_unknown_type_and_duplicates() {
        assert!(matches!(
            parse("X1 a b 1"),
            Err(CircuitError::UnknownComponentType { .. })
        ));
        assert!(matches!(
            parse("R1 a b 1\nR1 b c 2"),
            Err(CircuitError::DuplicateComponent { .. })
        ));
        assert!(matches!(
            parse(".junction a 0 0\n.junction a 1 1"),
            Err(CircuitError::DuplicateJunction { .. })
        ));
    }
}
