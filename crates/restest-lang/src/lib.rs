//! Core language for generated API test cases.
//!
//! The intermediate representation is a strict owned tree: a [`Program`]
//! owns its statements, statements own their expressions, and compound
//! expressions own their children. Shared substructure is always
//! materialized with `clone()`, which copies deeply and preserves
//! symbolic-variable numbers.

pub mod ast;
pub mod env;
pub mod pretty;
pub mod spec;
pub mod sym;

pub use ast::{Expr, Program, Stmt, TypeExpr};
pub use env::{ConcreteEnv, EnvError, ScopeId, SymbolTable, TypeMap, ValueEnv};
pub use spec::{Api, ApiCall, ApiFuncDecl, Decl, HttpResponseCode, Init, Response, Spec};
