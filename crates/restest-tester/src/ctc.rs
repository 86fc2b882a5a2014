//! The concrete-test-case driver.
//!
//! An abstract test case still contains input statements
//! (`v := input()`). The driver repeatedly rewrites the program with
//! the concrete values at hand, symbolically executes the rewrite, and
//! asks the solver for values satisfying the collected path constraint.
//! Every round either finishes or strictly reduces the number of input
//! statements, so the loop runs at most one round more than the initial
//! input count.

use restest_lang::pretty::pretty_print_expr;
use restest_lang::{ConcreteEnv, Expr, Program, Stmt};
use restest_see::{Executor, FunctionFactory, ResultValue, SeeError, Solver, SolverError};
use thiserror::Error;
use tracing::{debug, info};

/// Driver error. Unsatisfiable path constraints are not errors; the
/// driver returns the partially rewritten program instead.
#[derive(Debug, Error)]
pub enum TesterError {
    #[error("empty test case but concrete values provided")]
    EmptyProgramWithValues,

    #[error("malformed statement: {0}")]
    MalformedIr(String),

    #[error(transparent)]
    See(#[from] SeeError),

    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// Result type for driver operations.
pub type TesterResult<T> = Result<T, TesterError>;

/// Whether a statement assigns the input marker to a variable.
pub fn is_input_stmt(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Assign { right, .. } => right.is_input_marker(),
        _ => false,
    }
}

/// Whether a program still contains an input statement.
pub fn is_abstract(program: &Program) -> bool {
    program.statements.iter().any(is_input_stmt)
}

/// The rewrite-execute-solve loop.
pub struct Tester {
    executor: Executor,
    solver: Box<dyn Solver>,
}

impl Tester {
    pub fn new(factory: Box<dyn FunctionFactory>, solver: Box<dyn Solver>) -> Tester {
        Tester {
            executor: Executor::new(factory),
            solver,
        }
    }

    /// Concretize an abstract test case. Returns a program free of
    /// input statements when the path constraint stays satisfiable, or
    /// the best-effort partial rewrite when it does not.
    pub fn generate_ctc(
        &mut self,
        atc: Program,
        initial_values: Vec<Expr>,
        concrete_env: &mut ConcreteEnv,
    ) -> TesterResult<Program> {
        let mut program = atc;
        let mut values = initial_values;
        let mut round = 0usize;

        loop {
            if !is_abstract(&program) {
                info!(round, "program is concrete");
                return Ok(program);
            }

            info!(round, values = values.len(), "rewriting abstract test case");
            let rewritten = rewrite_atc(&program, &values, concrete_env)?;

            let executed = self.executor.execute(&rewritten)?;
            debug!(executed, total = rewritten.len(), "symbolic execution stopped");

            let formula = self.executor.path_formula();
            let result = self.solver.solve(&formula)?;
            if !result.sat {
                info!(round, "path constraint unsatisfiable, returning partial rewrite");
                return Ok(rewritten);
            }

            // Integer model values, in the solver's iteration order,
            // feed the next rewrite.
            let new_values: Vec<Expr> = result
                .model
                .values()
                .filter_map(|v| match v {
                    ResultValue::Int(n) => Some(Expr::Num(*n)),
                    _ => None,
                })
                .collect();
            if new_values.is_empty() {
                info!(round, "no integer values in model, returning rewrite");
                return Ok(rewritten);
            }

            program = rewritten;
            values = new_values;
            round += 1;
        }
    }
}

/// Substitute concrete values for input statements, in program order.
/// Statements beyond the supplied values are kept; everything else is
/// cloned unchanged. Each substitution is recorded in the concrete
/// environment.
pub fn rewrite_atc(
    program: &Program,
    values: &[Expr],
    concrete_env: &mut ConcreteEnv,
) -> TesterResult<Program> {
    if program.is_empty() && !values.is_empty() {
        return Err(TesterError::EmptyProgramWithValues);
    }

    let mut next_value = values.iter();
    let mut statements = Vec::with_capacity(program.len());

    for stmt in &program.statements {
        if is_input_stmt(stmt) {
            let Stmt::Assign { left, .. } = stmt else {
                unreachable!("input statements are assignments");
            };
            let Expr::Var(name) = left else {
                return Err(TesterError::MalformedIr(format!(
                    "input statement target must be a variable, got {}",
                    pretty_print_expr(left),
                )));
            };
            if let Some(value) = next_value.next() {
                debug!(name = %name, value = %pretty_print_expr(value), "substituting input");
                concrete_env.update(name.clone(), value.clone());
                statements.push(Stmt::Assign {
                    left: left.clone(),
                    right: value.clone(),
                });
                continue;
            }
        }
        statements.push(stmt.clone());
    }

    Ok(Program::new(statements))
}
