//! County formulas: `y = <expression>` strings evaluated at a supercharger
//! count.
//!
//! ```text
//! y = 0.014*x^3 - 0.01*x^2 + 50
//! y = 1 / (1 + exp(-(0.003*x - 2.5)))
//! ```

pub mod ast;
mod evaluator;
pub mod parser;

use std::fmt;

use ast::Expr;

pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

#[derive(Debug, Clone, PartialEq)]
pub enum FormulaError {
    /// The cell held no text.
    NotText,
    /// No `=` separating `y` from the expression.
    MissingEquals,
    Parse(String),
    /// Identifier outside `x`, `exp`, `log`, `sqrt`.
    UnknownName(String),
    ArgumentCount {
        function: &'static str,
        expected: &'static str,
        actual: usize,
    },
    DivisionByZero,
    /// Math domain violation, e.g. `log(-1)` or `sqrt(-4)`.
    Domain(String),
    Overflow(String),
}

impl fmt::Display for FormulaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaError::NotText => write!(f, "Formula is not text"),
            FormulaError::MissingEquals => write!(f, "Formula has no '='"),
            FormulaError::Parse(msg) => write!(f, "Parse error: {}", msg),
            FormulaError::UnknownName(name) => write!(f, "Unknown name: {}", name),
            FormulaError::ArgumentCount {
                function,
                expected,
                actual,
            } => write!(
                f,
                "Wrong number of arguments for {}: expected {}, got {}",
                function, expected, actual
            ),
            FormulaError::DivisionByZero => write!(f, "Division by zero"),
            FormulaError::Domain(msg) => write!(f, "Math domain error: {}", msg),
            FormulaError::Overflow(msg) => write!(f, "Overflow: {}", msg),
        }
    }
}

impl std::error::Error for FormulaError {}

/// A parsed formula, ready to be evaluated at any `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    expr: Expr,
}

impl Formula {
    /// Parse a full `y = ...` formula. Only the text between the first and
    /// second `=` is used.
    pub fn parse(formula: &str) -> FormulaResult<Self> {
        let rhs = formula.split('=').nth(1).ok_or(FormulaError::MissingEquals)?;
        Self::parse_expression(rhs.trim())
    }

    /// Parse a bare right-hand side such as `2*x + 1`.
    pub fn parse_expression(expression: &str) -> FormulaResult<Self> {
        let expr = parser::parse_expression(expression)?;
        Ok(Self { expr })
    }

    pub fn eval(&self, x: f64) -> FormulaResult<f64> {
        evaluator::evaluate(&self.expr, x)
    }
}

/// Detailed form of [`evaluate_formula`].
pub fn try_evaluate_formula(formula: Option<&str>, x: f64) -> FormulaResult<f64> {
    let formula = formula.ok_or(FormulaError::NotText)?;
    Formula::parse(formula)?.eval(x)
}

/// Evaluate a formula cell at `x`; any failure yields `None`.
pub fn evaluate_formula(formula: Option<&str>, x: f64) -> Option<f64> {
    match try_evaluate_formula(formula, x) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::debug!(error = %err, formula = ?formula, x, "Formula evaluation failed");
            None
        }
    }
}
