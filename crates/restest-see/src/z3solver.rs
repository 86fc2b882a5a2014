//! Z3-backed implementation of the [`Solver`] trait.

use crate::encoder::{EncoderCtx, Term};
use crate::solver::{ResultValue, SolveResult, Solver, SolverError, SolverResult};
use restest_lang::pretty::pretty_print_expr;
use restest_lang::{Expr, TypeMap};
use std::collections::BTreeMap;
use tracing::{debug, info};
use z3::{Model, SatResult};

/// A satisfiability solver over path constraints, optionally informed by
/// a variable-to-type map for sort selection.
#[derive(Default)]
pub struct Z3Solver {
    type_map: Option<TypeMap>,
}

impl Z3Solver {
    pub fn new() -> Z3Solver {
        Z3Solver { type_map: None }
    }

    pub fn with_type_map(type_map: TypeMap) -> Z3Solver {
        Z3Solver {
            type_map: Some(type_map),
        }
    }
}

impl Solver for Z3Solver {
    fn solve(&self, formula: &Expr) -> SolverResult<SolveResult> {
        debug!(formula = %pretty_print_expr(formula), "checking satisfiability");

        let mut encoder = EncoderCtx::new(self.type_map.as_ref());
        let encoded = encoder.encode_bool(formula)?;

        let solver = z3::Solver::new();
        solver.assert(&encoded);

        match solver.check() {
            SatResult::Sat => {
                let model = solver
                    .get_model()
                    .ok_or_else(|| SolverError::Solver("sat result without a model".into()))?;
                let values = extract_model(&model, encoder.registered());
                info!(variables = values.len(), "path constraint satisfiable");
                Ok(SolveResult {
                    sat: true,
                    model: values,
                })
            }
            SatResult::Unsat => {
                info!("path constraint unsatisfiable");
                Ok(SolveResult::unsat())
            }
            SatResult::Unknown => {
                // A solver timeout or incompleteness gives no model to
                // make progress with; the driver treats it like unsat.
                info!("solver returned unknown, treating as no progress");
                Ok(SolveResult::unsat())
            }
        }
    }
}

/// Evaluate every registered variable against the model. Values that do
/// not reduce to a scalar are rendered textually.
fn extract_model(model: &Model, registered: &[(String, Term)]) -> BTreeMap<String, ResultValue> {
    let mut values = BTreeMap::new();
    for (name, term) in registered {
        let value = match term {
            Term::Int(ast) => model
                .eval(ast, true)
                .and_then(|v| v.as_i64())
                .map(ResultValue::Int),
            Term::Bool(ast) => model
                .eval(ast, true)
                .and_then(|v| v.as_bool())
                .map(ResultValue::Bool),
            Term::Str(ast) => model
                .eval(ast, true)
                .and_then(|v| v.as_string())
                .map(ResultValue::Str),
            Term::Set { ast, .. } => model
                .eval(ast, true)
                .map(|v| ResultValue::Array(v.to_string())),
            Term::Map { ast, .. } => model
                .eval(ast, true)
                .map(|v| ResultValue::Array(v.to_string())),
        };
        if let Some(value) = value {
            debug!(name = %name, value = ?value, "model value");
            values.insert(name.clone(), value);
        }
    }
    values
}
