//! Arithmetic calculator.
//!
//! Expressions are parsed by a small recursive-descent parser over a closed
//! grammar; nothing is ever handed to an interpreter.
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '%') unary)*
//! unary   := ('+' | '-') unary | power
//! power   := primary ('^' unary)?
//! primary := number | '(' expr ')'
//! ```
//!
//! `^` is right-associative and binds tighter than unary minus, so
//! `-2^2` is `-4`.

use serde_json::{json, Value};
use thiserror::Error;

use crate::registry::{ParamSpec, Tool, ToolError, ToolSchema, ValidatedArgs};

/// Longest expression accepted.
const MAX_EXPRESSION_LEN: usize = 256;

/// Deepest nesting of parentheses and unary operators accepted.
const MAX_DEPTH: usize = 64;

/// Why an expression could not be evaluated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalcError {
    /// Nothing to evaluate.
    #[error("expression is empty")]
    Empty,

    /// Expression exceeds the length limit.
    #[error("expression is longer than {MAX_EXPRESSION_LEN} characters")]
    TooLong,

    /// Nesting exceeds the depth limit.
    #[error("expression is nested deeper than {MAX_DEPTH} levels")]
    TooDeep,

    /// A character outside the grammar.
    #[error("unexpected '{found}' at position {pos}")]
    Unexpected {
        /// The offending character.
        found: char,
        /// Zero-based character offset.
        pos: usize,
    },

    /// Input ended where an operand or `)` was expected.
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// A malformed numeric literal.
    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    /// Division or remainder by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// The result overflowed or is not a number.
    #[error("result is not a finite number")]
    NotFinite,
}

/// Evaluates an arithmetic expression.
///
/// # Errors
///
/// Returns a [`CalcError`] if the expression is outside the grammar or its
/// value is not a finite number.
pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
    if expression.chars().count() > MAX_EXPRESSION_LEN {
        return Err(CalcError::TooLong);
    }
    if expression.trim().is_empty() {
        return Err(CalcError::Empty);
    }

    let mut parser = Parser {
        chars: expression.chars().collect(),
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;

    parser.skip_whitespace();
    if let Some(&found) = parser.chars.get(parser.pos) {
        return Err(CalcError::Unexpected {
            found,
            pos: parser.pos,
        });
    }

    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::NotFinite)
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn skip_whitespace(&mut self) {
        while self.chars.get(self.pos).is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.chars.get(self.pos).copied()
    }

    fn descend(&mut self) -> Result<(), CalcError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CalcError::TooDeep);
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        while let Some(op @ ('+' | '-')) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.unary()?;
        while let Some(op @ ('*' | '/' | '%')) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            value = match op {
                '*' => value * rhs,
                _ if rhs == 0.0 => return Err(CalcError::DivisionByZero),
                '/' => value / rhs,
                _ => value % rhs,
            };
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            Some(op @ ('+' | '-')) => {
                self.pos += 1;
                self.descend()?;
                let value = self.unary()?;
                self.depth -= 1;
                Ok(if op == '-' { -value } else { value })
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64, CalcError> {
        let base = self.primary()?;
        if self.peek() == Some('^') {
            self.pos += 1;
            self.descend()?;
            let exponent = self.unary()?;
            self.depth -= 1;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            Some('(') => {
                self.pos += 1;
                self.descend()?;
                let value = self.expr()?;
                self.depth -= 1;
                match self.peek() {
                    Some(')') => {
                        self.pos += 1;
                        Ok(value)
                    }
                    Some(found) => Err(CalcError::Unexpected {
                        found,
                        pos: self.pos,
                    }),
                    None => Err(CalcError::UnexpectedEnd),
                }
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(found) => Err(CalcError::Unexpected {
                found,
                pos: self.pos,
            }),
            None => Err(CalcError::UnexpectedEnd),
        }
    }

    fn number(&mut self) -> Result<f64, CalcError> {
        let start = self.pos;
        while self
            .chars
            .get(self.pos)
            .is_some_and(|c| c.is_ascii_digit() || *c == '.')
        {
            self.pos += 1;
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        literal
            .parse::<f64>()
            .map_err(|_| CalcError::InvalidNumber(literal))
    }
}

/// `calculate`: evaluates an arithmetic expression.
pub struct Calculator {
    schema: ToolSchema,
}

impl Calculator {
    /// Creates the tool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            schema: ToolSchema::new().required(
                "expression",
                ParamSpec::string(
                    "Arithmetic expression using numbers, + - * / % ^ and parentheses",
                ),
            ),
        }
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for Calculator {
    fn name(&self) -> &str {
        "calculate"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression"
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    fn execute(&self, args: &ValidatedArgs) -> Result<Value, ToolError> {
        let expression = args.require_str("expression")?;
        let result = evaluate(expression).map_err(|e| match e {
            CalcError::DivisionByZero | CalcError::NotFinite => ToolError::Failed(e.to_string()),
            _ => ToolError::InvalidArguments(e.to_string()),
        })?;

        Ok(json!({
            "expression": expression,
            "result": result,
        }))
    }
}
