//! Scoped name-to-payload environments.
//!
//! Four specializations share the same lookup discipline (nearest
//! enclosing binding wins): the symbol table (name to type,
//! re-declaration forbidden, with ordered child scopes per API block),
//! the type map (name to type, update allowed), and the symbolic and
//! concrete value environments (name to expression, update allowed).

use crate::ast::{Expr, TypeExpr};
use std::collections::BTreeMap;
use thiserror::Error;

/// Environment error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    #[error("name not found: {name}")]
    NotFound { name: String },

    #[error("repeat declaration for name: {name}")]
    Redeclared { name: String },
}

/// Result type for environment operations.
pub type EnvResult<T> = Result<T, EnvError>;

/// Handle to a scope inside a [`SymbolTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

#[derive(Debug, Default)]
struct Scope {
    parent: Option<usize>,
    bindings: BTreeMap<String, TypeExpr>,
    children: Vec<usize>,
}

/// A tree of declaration scopes, arena-backed. Scope 0 is the global
/// scope; each API block gets one child scope holding its formal
/// parameters, in specification order.
#[derive(Debug, Default)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    /// Create a table containing only the global scope.
    pub fn new() -> SymbolTable {
        SymbolTable {
            scopes: vec![Scope::default()],
        }
    }

    /// The global scope.
    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Attach a fresh child scope under `parent` and return its handle.
    pub fn add_child(&mut self, parent: ScopeId) -> ScopeId {
        let id = self.scopes.len();
        self.scopes.push(Scope {
            parent: Some(parent.0),
            ..Scope::default()
        });
        self.scopes[parent.0].children.push(id);
        ScopeId(id)
    }

    /// The `index`-th child of `scope`, in attachment order.
    pub fn child_at(&self, scope: ScopeId, index: usize) -> Option<ScopeId> {
        self.scopes[scope.0].children.get(index).copied().map(ScopeId)
    }

    /// Number of children attached to `scope`.
    pub fn child_count(&self, scope: ScopeId) -> usize {
        self.scopes[scope.0].children.len()
    }

    /// Bind `name` to `ty` in `scope`. A second declaration of the same
    /// name in the same scope is rejected.
    pub fn declare(&mut self, scope: ScopeId, name: &str, ty: TypeExpr) -> EnvResult<()> {
        let bindings = &mut self.scopes[scope.0].bindings;
        if bindings.contains_key(name) {
            return Err(EnvError::Redeclared { name: name.into() });
        }
        bindings.insert(name.into(), ty);
        Ok(())
    }

    /// Look up `name` starting at `scope` and walking the parent chain.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> EnvResult<&TypeExpr> {
        let mut current = Some(scope.0);
        while let Some(idx) = current {
            if let Some(ty) = self.scopes[idx].bindings.get(name) {
                return Ok(ty);
            }
            current = self.scopes[idx].parent;
        }
        Err(EnvError::NotFound { name: name.into() })
    }

    /// Whether `name` is declared in `scope` itself. The renaming pass
    /// uses this to decide locality, so it deliberately does not walk
    /// the parent chain.
    pub fn binds(&self, scope: ScopeId, name: &str) -> bool {
        self.scopes[scope.0].bindings.contains_key(name)
    }
}

/// A scoped value environment: name to payload, update allowed, lookup
/// walks the parent chain.
#[derive(Debug, Default)]
pub struct Env<V> {
    table: BTreeMap<String, V>,
    parent: Option<Box<Env<V>>>,
}

impl<V> Env<V> {
    pub fn new() -> Env<V> {
        Env {
            table: BTreeMap::new(),
            parent: None,
        }
    }

    /// A child environment owning its parent.
    pub fn with_parent(parent: Env<V>) -> Env<V> {
        Env {
            table: BTreeMap::new(),
            parent: Some(Box::new(parent)),
        }
    }

    /// Bind or rebind `name` in the current scope.
    pub fn update(&mut self, name: impl Into<String>, value: V) {
        self.table.insert(name.into(), value);
    }

    /// Nearest enclosing binding, if any.
    pub fn get(&self, name: &str) -> Option<&V> {
        match self.table.get(name) {
            Some(v) => Some(v),
            None => self.parent.as_ref().and_then(|p| p.get(name)),
        }
    }

    /// Like [`Env::get`], but failing with [`EnvError::NotFound`].
    pub fn lookup(&self, name: &str) -> EnvResult<&V> {
        self.get(name).ok_or_else(|| EnvError::NotFound { name: name.into() })
    }

    /// Whether `name` is bound here or in an enclosing scope.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Bindings of the current scope, in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.table.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// The symbolic sigma: variable to (possibly symbolic) expression.
pub type ValueEnv = Env<Expr>;

/// The concrete sigma used by the driver: variable to concrete value.
pub type ConcreteEnv = Env<Expr>;

/// Variable to declared type, update allowed.
pub type TypeMap = Env<TypeExpr>;
