//! The function-factory extension point.
//!
//! Real API names are resolved to implementations through a factory
//! supplied by the caller. A callable's `execute` returns an expression
//! describing the call's effect, typically a literal produced by the
//! implementation under test.

use restest_lang::Expr;
use thiserror::Error;

/// Failure raised by a factory or by an executing callable. Fatal for
/// the current test case.
#[derive(Debug, Error)]
#[error("function factory failed for '{name}': {message}")]
pub struct FactoryError {
    pub name: String,
    pub message: String,
}

impl FactoryError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> FactoryError {
        FactoryError {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// A resolved API implementation, ready to run against concrete
/// arguments.
pub trait Callable {
    fn execute(&mut self) -> Result<Expr, FactoryError>;
}

/// Dispatch from a real API name and concrete argument list to a
/// callable implementation.
pub trait FunctionFactory {
    fn get(&self, name: &str, args: &[Expr]) -> Result<Box<dyn Callable>, FactoryError>;
}

/// A factory that knows no functions. Useful for programs whose real
/// API calls are never reached during symbolic execution.
#[derive(Debug, Default)]
pub struct EmptyFactory;

impl FunctionFactory for EmptyFactory {
    fn get(&self, name: &str, _args: &[Expr]) -> Result<Box<dyn Callable>, FactoryError> {
        Err(FactoryError::new(name, "no implementation registered"))
    }
}
