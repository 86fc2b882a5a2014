//! The symbolic executor.
//!
//! Statements execute in program order over a persistent symbolic sigma.
//! Execution stops at the first statement that is not ready, returning
//! control to the driver so that a solver pass can materialize concrete
//! inputs. Assumes are collected into the path-constraint list; asserts
//! are never executed here, they remain runtime checks of the emitted
//! program.

use crate::builtins::is_builtin;
use crate::factory::{FactoryError, FunctionFactory};
use restest_lang::pretty::{pretty_print_expr, pretty_print_stmt};
use restest_lang::{Expr, Program, Stmt, ValueEnv};
use thiserror::Error;
use tracing::{debug, info};

/// Symbolic execution error.
#[derive(Debug, Error)]
pub enum SeeError {
    #[error(transparent)]
    Factory(#[from] FactoryError),

    #[error("malformed statement: {0}")]
    MalformedIr(String),
}

/// Result type for symbolic execution.
pub type SeeResult<T> = Result<T, SeeError>;

/// The symbolic execution engine. Sigma persists across [`Executor::execute`]
/// calls; the path-constraint list is rebuilt on each call.
pub struct Executor {
    sigma: ValueEnv,
    path_constraint: Vec<Expr>,
    factory: Box<dyn FunctionFactory>,
}

impl Executor {
    pub fn new(factory: Box<dyn FunctionFactory>) -> Executor {
        Executor {
            sigma: ValueEnv::new(),
            path_constraint: Vec::new(),
            factory,
        }
    }

    /// The current symbolic sigma.
    pub fn sigma(&self) -> &ValueEnv {
        &self.sigma
    }

    /// Constraints collected by the most recent [`Executor::execute`] call,
    /// in assume-execution order.
    pub fn path_constraint(&self) -> &[Expr] {
        &self.path_constraint
    }

    /// Execute statements in order until one is not ready. Returns the
    /// number of statements executed.
    pub fn execute(&mut self, program: &Program) -> SeeResult<usize> {
        self.path_constraint.clear();

        for (i, stmt) in program.statements.iter().enumerate() {
            if !self.stmt_ready(stmt) {
                info!(
                    statement = i,
                    form = %pretty_print_stmt(stmt),
                    "statement not ready, interrupting execution"
                );
                return Ok(i);
            }
            self.exec_stmt(stmt)?;
        }

        Ok(program.statements.len())
    }

    /// The conjunction of the collected constraints, as a
    /// right-associated `And` chain. An empty list yields the trivial
    /// `Eq(1, 1)`; a single constraint is returned as-is.
    pub fn path_formula(&self) -> Expr {
        match self.path_constraint.as_slice() {
            [] => Expr::binop("Eq", Expr::Num(1), Expr::Num(1)),
            [single] => single.clone(),
            [init @ .., last] => {
                let mut formula = last.clone();
                for c in init.iter().rev() {
                    formula = Expr::binop("And", c.clone(), formula);
                }
                formula
            }
        }
    }

    // === Readiness ===

    fn stmt_ready(&self, stmt: &Stmt) -> bool {
        match stmt {
            Stmt::Assign { right, .. } => match right {
                Expr::Call { name, args } if !is_builtin(name) => {
                    // Real API call: every argument must be concrete
                    // before the implementation can be invoked.
                    args.iter().all(|a| !self.is_symbolic(a))
                }
                _ => self.expr_ready(right),
            },
            Stmt::Assume(e) => self.expr_ready(e),
            Stmt::Decl { .. } => true,
            // Asserts are runtime checks of the emitted program.
            Stmt::Assert(_) => false,
        }
    }

    fn expr_ready(&self, expr: &Expr) -> bool {
        match expr {
            Expr::Num(_) | Expr::Str(_) => true,
            Expr::Input => true,
            Expr::SymVar(_) => false,
            Expr::Var(name) => match self.sigma.get(name) {
                Some(value) => !self.is_symbolic(value),
                None => false,
            },
            Expr::Call { name, args } => {
                if expr.is_input_marker() {
                    return true;
                }
                if is_builtin(name) {
                    // Operators work on symbolic operands.
                    true
                } else {
                    args.iter().all(|a| !self.is_symbolic(a))
                }
            }
            Expr::SetLit(elements) | Expr::TupleLit(elements) => {
                elements.iter().all(|e| self.expr_ready(e))
            }
            Expr::MapLit(pairs) => pairs.iter().all(|(_, v)| self.expr_ready(v)),
        }
    }

    /// Whether an expression contains a symbolic variable, directly or
    /// through a sigma binding.
    pub fn is_symbolic(&self, expr: &Expr) -> bool {
        match expr {
            Expr::SymVar(_) => true,
            Expr::Num(_) | Expr::Str(_) | Expr::Input => false,
            Expr::Var(name) => match self.sigma.get(name) {
                Some(value) => self.is_symbolic(value),
                None => false,
            },
            Expr::Call { args, .. } => args.iter().any(|a| self.is_symbolic(a)),
            Expr::SetLit(elements) | Expr::TupleLit(elements) => {
                elements.iter().any(|e| self.is_symbolic(e))
            }
            Expr::MapLit(pairs) => pairs.iter().any(|(_, v)| self.is_symbolic(v)),
        }
    }

    // === Statement execution ===

    fn exec_stmt(&mut self, stmt: &Stmt) -> SeeResult<()> {
        match stmt {
            Stmt::Assign { left, right } => {
                debug!(form = %pretty_print_stmt(stmt), "executing assignment");
                match right {
                    Expr::Call { name, args } if !is_builtin(name) => {
                        let concrete: Vec<Expr> = args.iter().map(|a| self.eval(a)).collect();
                        debug!(
                            api = %name,
                            args = %join_pretty(&concrete),
                            "invoking real API through factory"
                        );
                        let mut callable = self.factory.get(name, &concrete)?;
                        let result = callable.execute()?;
                        debug!(api = %name, result = %pretty_print_expr(&result), "API returned");
                        self.bind(left, result)
                    }
                    _ => {
                        let value = self.eval(right);
                        self.bind(left, value)
                    }
                }
            }
            Stmt::Assume(e) => {
                let constraint = self.eval(e);
                debug!(constraint = %pretty_print_expr(&constraint), "collecting assume");
                self.path_constraint.push(constraint);
                Ok(())
            }
            Stmt::Decl { name, .. } => {
                let fresh = Expr::fresh_sym_var();
                debug!(name = %name, value = %pretty_print_expr(&fresh), "declaring symbolic variable");
                self.sigma.update(name.clone(), fresh);
                Ok(())
            }
            // Unreachable through execute(); kept total for direct use.
            Stmt::Assert(_) => Ok(()),
        }
    }

    fn bind(&mut self, left: &Expr, value: Expr) -> SeeResult<()> {
        match left {
            Expr::Var(name) => {
                self.sigma.update(name.clone(), value);
                Ok(())
            }
            Expr::TupleLit(vars) => match value {
                Expr::TupleLit(values) if values.len() == vars.len() => {
                    for (var, v) in vars.iter().zip(values) {
                        self.bind(var, v)?;
                    }
                    Ok(())
                }
                other => Err(SeeError::MalformedIr(format!(
                    "cannot destructure {} into {}",
                    pretty_print_expr(&other),
                    pretty_print_expr(left),
                ))),
            },
            other => Err(SeeError::MalformedIr(format!(
                "assignment target must be a variable or tuple of variables, got {}",
                pretty_print_expr(other),
            ))),
        }
    }

    // === Symbolic evaluation ===

    /// Evaluate an expression over sigma. Operators are rebuilt with
    /// evaluated operands; folding is left to the solver.
    fn eval(&mut self, expr: &Expr) -> Expr {
        match expr {
            Expr::Num(_) | Expr::Str(_) | Expr::SymVar(_) => expr.clone(),
            Expr::Input => Expr::fresh_sym_var(),
            Expr::Var(name) => match self.sigma.get(name) {
                Some(value) => value.clone(),
                None => expr.clone(),
            },
            Expr::Call { name, args } => {
                if expr.is_input_marker() {
                    return Expr::fresh_sym_var();
                }
                Expr::Call {
                    name: name.clone(),
                    args: args.iter().map(|a| self.eval(a)).collect(),
                }
            }
            Expr::SetLit(elements) => {
                Expr::SetLit(elements.iter().map(|e| self.eval(e)).collect())
            }
            Expr::MapLit(pairs) => Expr::MapLit(
                pairs
                    .iter()
                    .map(|(k, v)| (k.clone(), self.eval(v)))
                    .collect(),
            ),
            Expr::TupleLit(elements) => {
                Expr::TupleLit(elements.iter().map(|e| self.eval(e)).collect())
            }
        }
    }
}

fn join_pretty(exprs: &[Expr]) -> String {
    exprs
        .iter()
        .map(pretty_print_expr)
        .collect::<Vec<_>>()
        .join(", ")
}
