//! Boolean formula language for gates and stop rules.
//!
//! Formulas reference only signal identifiers, never detector internals:
//! `S1 & S2`, `S5 & (S6 | S7)`. `&` binds tighter than `|`; parentheses
//! group. Adding or changing a gate is a config change, not a code change.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ExprError;
use crate::types::SignalId;

/// Expression tree over signal ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateExpr {
    Signal(SignalId),
    And(Box<GateExpr>, Box<GateExpr>),
    Or(Box<GateExpr>, Box<GateExpr>),
}

impl GateExpr {
    /// Parse a formula such as `S8 & (S1 | S3)`.
    pub fn parse(input: &str) -> Result<Self, ExprError> {
        let mut parser = Parser::new(input);
        let expr = parser.parse_or()?;
        parser.skip_ws();
        if parser.pos < parser.bytes.len() {
            return Err(ExprError::TrailingInput { pos: parser.pos });
        }
        Ok(expr)
    }

    /// Evaluate against the set of fired signal ids.
    pub fn eval(&self, fired: &rustc_hash::FxHashSet<SignalId>) -> bool {
        match self {
            Self::Signal(id) => fired.contains(id),
            Self::And(a, b) => a.eval(fired) && b.eval(fired),
            Self::Or(a, b) => a.eval(fired) || b.eval(fired),
        }
    }

    /// All signal ids referenced by the formula, deduplicated, in id order.
    pub fn signals(&self) -> Vec<SignalId> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out.sort();
        out.dedup();
        out
    }

    fn collect(&self, out: &mut Vec<SignalId>) {
        match self {
            Self::Signal(id) => out.push(*id),
            Self::And(a, b) | Self::Or(a, b) => {
                a.collect(out);
                b.collect(out);
            }
        }
    }
}

impl fmt::Display for GateExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal(id) => write!(f, "{id}"),
            Self::And(a, b) => write!(f, "({a} & {b})"),
            Self::Or(a, b) => write!(f, "({a} | {b})"),
        }
    }
}

/// Recursive-descent parser. Grammar:
///   or   := and ('|' and)*
///   and  := atom ('&' atom)*
///   atom := SIGNAL | '(' or ')'
struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.bytes.get(self.pos).copied()
    }

    fn parse_or(&mut self) -> Result<GateExpr, ExprError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(b'|') {
            self.pos += 1;
            let right = self.parse_and()?;
            left = GateExpr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<GateExpr, ExprError> {
        let mut left = self.parse_atom()?;
        while self.peek() == Some(b'&') {
            self.pos += 1;
            let right = self.parse_atom()?;
            left = GateExpr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_atom(&mut self) -> Result<GateExpr, ExprError> {
        match self.peek() {
            None => Err(ExprError::UnexpectedEnd),
            Some(b'(') => {
                self.pos += 1;
                let inner = self.parse_or()?;
                if self.peek() != Some(b')') {
                    return Err(ExprError::UnexpectedToken {
                        pos: self.pos,
                        found: self
                            .bytes
                            .get(self.pos)
                            .map(|b| (*b as char).to_string())
                            .unwrap_or_else(|| "<end>".to_string()),
                    });
                }
                self.pos += 1;
                Ok(inner)
            }
            Some(c) if c.is_ascii_alphanumeric() => {
                let start = self.pos;
                while self.pos < self.bytes.len()
                    && self.bytes[self.pos].is_ascii_alphanumeric()
                {
                    self.pos += 1;
                }
                // Slicing on ASCII boundaries established above.
                let word = std::str::from_utf8(&self.bytes[start..self.pos])
                    .unwrap_or_default();
                SignalId::parse(word)
                    .map(GateExpr::Signal)
                    .ok_or_else(|| ExprError::UnknownSignal {
                        id: word.to_string(),
                    })
            }
            Some(c) => Err(ExprError::UnexpectedToken {
                pos: self.pos,
                found: (c as char).to_string(),
            }),
        }
    }
}
