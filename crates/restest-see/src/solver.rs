//! Solver abstraction: the constraint interface the driver depends on.

use restest_lang::Expr;
use std::collections::BTreeMap;
use thiserror::Error;

/// Solver bridge error. Fatal for the current solve.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("unsupported function: {name} with {arity} args")]
    UnsupportedOperator { name: String, arity: usize },

    #[error("unsupported literal: {0}")]
    UnsupportedLiteral(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("solver error: {0}")]
    Solver(String),
}

/// Result type for solver operations.
pub type SolverResult<T> = Result<T, SolverError>;

/// A value extracted from a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultValue {
    Bool(bool),
    Int(i64),
    Str(String),
    /// Arrays (sets and maps) are rendered as the solver's textual form.
    Array(String),
}

/// Outcome of a satisfiability check. The model maps each registered
/// variable's textual name to its value; iteration is in name order.
#[derive(Debug, Default)]
pub struct SolveResult {
    pub sat: bool,
    pub model: BTreeMap<String, ResultValue>,
}

impl SolveResult {
    /// An unsatisfiable (or unknown) outcome.
    pub fn unsat() -> SolveResult {
        SolveResult {
            sat: false,
            model: BTreeMap::new(),
        }
    }
}

/// A satisfiability solver over path-constraint formulas.
pub trait Solver {
    fn solve(&self, formula: &Expr) -> SolverResult<SolveResult>;
}
