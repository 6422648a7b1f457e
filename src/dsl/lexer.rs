//! Lexer for the layout DSL.
//!
//! Keywords are resolved here, so the parser only sees names, numbers and
//! the handful of words the layout format reserves. Numbers come out already
//! evaluated: a bare decimal is a [`TokenKind::Number`], and a decimal with
//! an SI prefix is a [`TokenKind::Scaled`]. Coordinates only accept the
//! former.

use std::iter::Peekable;
use std::str::Chars;

use crate::error::{CircuitError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token
    pub text: String,
    /// 1-indexed
    pub line: usize,
    /// 1-indexed
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    /// `.junction` or its short form `.j`
    Junction,
    /// `fixed`, pinning a junction in place
    Fixed,
    /// Switch position: `closed`/`on` is true, `open`/`off` is false
    SwitchState(bool),
    /// Branch, junction or parameter name
    Name,
    /// Decimal without a unit prefix
    Number(f64),
    /// Decimal with an SI prefix, already multiplied out
    Scaled(f64),
    Equals,
    Newline,
    Eof,
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Produce the next token, or a [`CircuitError::LexerError`] pointing at
    /// the offending column.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_blanks();
        let (line, column) = (self.line, self.column);
        let token = |kind, text: String| Token {
            kind,
            text,
            line,
            column,
        };

        let Some(ch) = self.chars.peek().copied() else {
            return Ok(token(TokenKind::Eof, String::new()));
        };

        match ch {
            '\n' | '=' => {
                self.bump();
                let kind = if ch == '=' { TokenKind::Equals } else { TokenKind::Newline };
                Ok(token(kind, ch.to_string()))
            }
            '.' => {
                self.bump();
                if self.chars.peek().is_some_and(|c| c.is_ascii_digit()) {
                    let word = format!(".{}", self.read_while(is_number_char));
                    let kind = classify_number(&word).ok_or_else(|| malformed(line, column, &word))?;
                    return Ok(token(kind, word));
                }
                let word = self.read_while(is_name_char);
                match word.to_ascii_lowercase().as_str() {
                    "junction" | "j" => Ok(token(TokenKind::Junction, format!(".{}", word))),
                    _ => Err(CircuitError::lexer(line, column, format!("unknown directive '.{}'", word))),
                }
            }
            '-' | '+' | '0'..='9' => {
                let word = self.read_while(is_number_char);
                let kind = classify_number(&word).ok_or_else(|| malformed(line, column, &word))?;
                Ok(token(kind, word))
            }
            _ if ch.is_alphabetic() || ch == '_' => {
                let word = self.read_while(is_name_char);
                let kind = match word.to_ascii_lowercase().as_str() {
                    "fixed" => TokenKind::Fixed,
                    "closed" | "on" => TokenKind::SwitchState(true),
                    "open" | "off" => TokenKind::SwitchState(false),
                    _ => TokenKind::Name,
                };
                Ok(token(kind, word))
            }
            _ => Err(CircuitError::lexer(line, column, format!("unexpected character '{}'", ch))),
        }
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn read_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let mut word = String::new();
        while let Some(&ch) = self.chars.peek() {
            if !keep(ch) {
                break;
            }
            word.push(ch);
            self.bump();
        }
        word
    }

    /// Skip spaces and `#`/`;` comments, stopping at a newline.
    fn skip_blanks(&mut self) {
        let mut in_comment = false;
        while let Some(&ch) = self.chars.peek() {
            match ch {
                '\n' => break,
                '#' | ';' => in_comment = true,
                _ if in_comment || ch.is_whitespace() => {}
                _ => break,
            }
            self.bump();
        }
    }
}

fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn is_number_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '.' | '+' | '-')
}

fn malformed(line: usize, column: usize, word: &str) -> CircuitError {
    CircuitError::lexer(line, column, format!("malformed number '{}'", word))
}

fn classify_number(word: &str) -> Option<TokenKind> {
    if let Ok(value) = word.parse::<f64>() {
        return value.is_finite().then_some(TokenKind::Number(value));
    }
    parse_quantity(word).map(TokenKind::Scaled)
}

fn si_prefix(ch: char) -> Option<f64> {
    Some(match ch {
        'p' => 1e-12,
        'n' => 1e-9,
        'u' => 1e-6,
        'm' => 1e-3,
        'k' => 1e3,
        'M' => 1e6,
        'G' => 1e9,
        _ => return None,
    })
}

/// Evaluate a decimal with one trailing SI prefix, such as `4.7u` or `10k`.
///
/// Returns `None` without a recognised prefix or for non-finite results.
pub fn parse_quantity(text: &str) -> Option<f64> {
    let prefix = text.chars().last()?;
    let multiplier = si_prefix(prefix)?;
    let mantissa = text[..text.len() - prefix.len_utf8()].parse::<f64>().ok()?;
    let value = mantissa * multiplier;
    value.is_finite().then_some(value)
}
