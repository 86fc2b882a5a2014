//! The abstract-test-case generator.
//!
//! Lowering first emits the specification's initializers in order, then
//! walks the scenario; each matching API block contributes its input
//! statements, precondition assume, primed snapshots, the API call
//! itself, and the postcondition assert. Local names are alpha-renamed
//! with the block's index as suffix, so no two blocks share an input
//! name while globals stay shared.

use restest_lang::{Expr, Program, ScopeId, Spec, Stmt, SymbolTable};
use std::collections::BTreeSet;
use tracing::debug;

/// Generator over one specification and its caller-supplied symbol
/// table. The table's i-th child scope declares the formal parameters
/// of the i-th API block.
pub struct AtcGenerator<'s> {
    spec: &'s Spec,
    symbols: &'s SymbolTable,
}

impl<'s> AtcGenerator<'s> {
    pub fn new(spec: &'s Spec, symbols: &'s SymbolTable) -> AtcGenerator<'s> {
        AtcGenerator { spec, symbols }
    }

    /// Lower the specification against an ordered scenario of API-block
    /// names. Names matching no block are skipped.
    pub fn generate(&self, scenario: &[String]) -> Program {
        let mut statements = self.gen_init();

        for name in scenario {
            let mut matched = false;
            for (index, block) in self.spec.blocks.iter().enumerate() {
                if &block.name != name {
                    continue;
                }
                matched = true;
                if let Some(scope) = self.symbols.child_at(self.symbols.global(), index) {
                    statements.extend(self.gen_block(block, scope, index));
                }
            }
            if !matched {
                debug!(name = %name, "scenario name matches no block, skipping");
            }
        }

        Program::new(statements)
    }

    /// One assignment per initializer, in specification order.
    fn gen_init(&self) -> Vec<Stmt> {
        self.spec
            .init
            .iter()
            .map(|init| Stmt::assign(init.var_name.clone(), self.rename(&init.expr, None, "")))
            .collect()
    }

    /// The statements of one API block.
    fn gen_block(&self, block: &restest_lang::Api, scope: ScopeId, index: usize) -> Vec<Stmt> {
        let suffix = index.to_string();
        let mut stmts = Vec::new();

        // Input statements: locals mentioned by the call arguments and
        // the precondition, first-seen order, deduplicated.
        let mut input_vars = Vec::new();
        for arg in &block.call.args {
            self.collect_input_vars(arg, scope, &mut input_vars);
        }
        self.collect_input_vars(&block.pre, scope, &mut input_vars);
        for var in &input_vars {
            stmts.push(Stmt::input(format!("{var}{suffix}")));
        }

        // Precondition.
        stmts.push(Stmt::Assume(self.rename(&block.pre, Some(scope), &suffix)));

        // Snapshots for globals that occur primed in the postcondition.
        let mut primed = BTreeSet::new();
        if let Some(post) = &block.response.expr {
            collect_primed_vars(post, &mut primed);
        }
        for global in &primed {
            stmts.push(Stmt::Assign {
                left: Expr::var(format!("{global}_old")),
                right: Expr::var(global.clone()),
            });
        }

        // The API call. The left-hand side comes from the call's
        // response expression, defaulting to a single result variable.
        let call = Expr::Call {
            name: block.call.name.clone(),
            args: block
                .call
                .args
                .iter()
                .map(|a| self.rename(a, Some(scope), &suffix))
                .collect(),
        };
        let left = match &block.call.response.expr {
            Some(response) => self.rename(response, Some(scope), &suffix),
            None => Expr::var(format!("_result{suffix}")),
        };
        stmts.push(Stmt::Assign { left, right: call });

        // Postcondition, renamed and with primes stripped.
        if let Some(post) = &block.response.expr {
            let renamed = self.rename(post, Some(scope), &suffix);
            stmts.push(Stmt::Assert(strip_primes(&renamed, &primed, false)));
        }

        stmts
    }

    /// Structural renaming: a variable declared in `scope` itself gets
    /// the suffix appended; everything else is rebuilt unchanged. The
    /// prime operator is preserved (stripping happens separately).
    fn rename(&self, expr: &Expr, scope: Option<ScopeId>, suffix: &str) -> Expr {
        let is_local =
            |name: &str| scope.is_some_and(|s| self.symbols.binds(s, name));
        match expr {
            Expr::Var(name) if is_local(name) => Expr::var(format!("{name}{suffix}")),
            Expr::Var(_) | Expr::Num(_) | Expr::Str(_) | Expr::SymVar(_) | Expr::Input => {
                expr.clone()
            }
            Expr::Call { name, args } => Expr::Call {
                name: name.clone(),
                args: args.iter().map(|a| self.rename(a, scope, suffix)).collect(),
            },
            Expr::SetLit(elements) => Expr::SetLit(
                elements
                    .iter()
                    .map(|e| self.rename(e, scope, suffix))
                    .collect(),
            ),
            Expr::MapLit(pairs) => Expr::MapLit(
                pairs
                    .iter()
                    .map(|(key, value)| {
                        let key = if is_local(key) {
                            format!("{key}{suffix}")
                        } else {
                            key.clone()
                        };
                        (key, self.rename(value, scope, suffix))
                    })
                    .collect(),
            ),
            Expr::TupleLit(elements) => Expr::TupleLit(
                elements
                    .iter()
                    .map(|e| self.rename(e, scope, suffix))
                    .collect(),
            ),
        }
    }

    /// Collect variables declared in the block's own scope, in
    /// first-seen order without duplicates. These become the block's
    /// input statements.
    fn collect_input_vars(&self, expr: &Expr, scope: ScopeId, found: &mut Vec<String>) {
        match expr {
            Expr::Var(name) => {
                if self.symbols.binds(scope, name) && !found.iter().any(|v| v == name) {
                    found.push(name.clone());
                }
            }
            Expr::Call { args, .. } => {
                for arg in args {
                    self.collect_input_vars(arg, scope, found);
                }
            }
            Expr::SetLit(elements) | Expr::TupleLit(elements) => {
                for e in elements {
                    self.collect_input_vars(e, scope, found);
                }
            }
            Expr::MapLit(pairs) => {
                for (key, value) in pairs {
                    if self.symbols.binds(scope, key) && !found.iter().any(|v| v == key) {
                        found.push(key.clone());
                    }
                    self.collect_input_vars(value, scope, found);
                }
            }
            Expr::Num(_) | Expr::Str(_) | Expr::SymVar(_) | Expr::Input => {}
        }
    }
}

/// Collect `G` for every `'(G)` occurrence. Only direct variable
/// arguments of the prime operator name a snapshot.
fn collect_primed_vars(expr: &Expr, primed: &mut BTreeSet<String>) {
    match expr {
        Expr::Call { name, args } if name == "'" && !args.is_empty() => {
            if let Expr::Var(var) = &args[0] {
                primed.insert(var.clone());
            }
        }
        Expr::Call { args, .. } => {
            for arg in args {
                collect_primed_vars(arg, primed);
            }
        }
        Expr::SetLit(elements) | Expr::TupleLit(elements) => {
            for e in elements {
                collect_primed_vars(e, primed);
            }
        }
        Expr::MapLit(pairs) => {
            for (_, value) in pairs {
                collect_primed_vars(value, primed);
            }
        }
        Expr::Num(_) | Expr::Str(_) | Expr::Var(_) | Expr::SymVar(_) | Expr::Input => {}
    }
}

/// Strip prime notation from a postcondition: `'(E)` becomes `E`, and a
/// reference to a global that occurs primed elsewhere becomes its
/// `_old` snapshot. The snapshot replacement does not apply inside the
/// body of a prime.
fn strip_primes(expr: &Expr, primed: &BTreeSet<String>, inside_prime: bool) -> Expr {
    match expr {
        Expr::Var(name) => {
            if !inside_prime && primed.contains(name) {
                Expr::var(format!("{name}_old"))
            } else {
                expr.clone()
            }
        }
        Expr::Call { name, args } if name == "'" && !args.is_empty() => {
            strip_primes(&args[0], primed, true)
        }
        Expr::Call { name, args } => Expr::Call {
            name: name.clone(),
            args: args
                .iter()
                .map(|a| strip_primes(a, primed, inside_prime))
                .collect(),
        },
        Expr::SetLit(elements) => Expr::SetLit(
            elements
                .iter()
                .map(|e| strip_primes(e, primed, inside_prime))
                .collect(),
        ),
        Expr::MapLit(pairs) => Expr::MapLit(
            pairs
                .iter()
                .map(|(key, value)| {
                    let key = if !inside_prime && primed.contains(key) {
                        format!("{key}_old")
                    } else {
                        key.clone()
                    };
                    (key, strip_primes(value, primed, inside_prime))
                })
                .collect(),
        ),
        Expr::TupleLit(elements) => Expr::TupleLit(
            elements
                .iter()
                .map(|e| strip_primes(e, primed, inside_prime))
                .collect(),
        ),
        Expr::Num(_) | Expr::Str(_) | Expr::SymVar(_) | Expr::Input => expr.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primed_vars_are_collected_from_nested_positions() {
        let post = Expr::binop(
            "Eq",
            Expr::call("'", vec![Expr::var("U")]),
            Expr::binop("union", Expr::var("U"), Expr::SetLit(vec![Expr::var("u")])),
        );
        let mut primed = BTreeSet::new();
        collect_primed_vars(&post, &mut primed);
        assert_eq!(primed.into_iter().collect::<Vec<_>>(), vec!["U"]);
    }

    #[test]
    fn strip_primes_rewrites_both_occurrences() {
        let mut primed = BTreeSet::new();
        primed.insert("U".to_string());
        let post = Expr::binop(
            "Eq",
            Expr::call("'", vec![Expr::var("U")]),
            Expr::binop("union", Expr::var("U"), Expr::var("x")),
        );
        let stripped = strip_primes(&post, &primed, false);
        assert_eq!(
            stripped,
            Expr::binop(
                "Eq",
                Expr::var("U"),
                Expr::binop("union", Expr::var("U_old"), Expr::var("x")),
            )
        );
    }

    #[test]
    fn snapshot_replacement_stops_at_prime_boundaries() {
        let mut primed = BTreeSet::new();
        primed.insert("U".to_string());
        // '(union(U, x)): the U inside the prime body stays U.
        let post = Expr::call(
            "'",
            vec![Expr::binop("union", Expr::var("U"), Expr::var("x"))],
        );
        let stripped = strip_primes(&post, &primed, false);
        assert_eq!(
            stripped,
            Expr::binop("union", Expr::var("U"), Expr::var("x"))
        );
    }
}
