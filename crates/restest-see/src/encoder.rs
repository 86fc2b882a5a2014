//! Expression encoder: translates path-constraint expressions to Z3
//! terms.
//!
//! Sets are arrays from element sort to bool, maps are arrays from key
//! sort to value sort, and sequence operators run over Z3's string
//! theory. Symbolic variables are integer constants named `X<n>`;
//! named variables take their sort from the optional type map and
//! default to integer.

use crate::solver::{SolverError, SolverResult};
use restest_lang::pretty::pretty_print_expr;
use restest_lang::{Expr, TypeExpr, TypeMap};
use std::collections::HashMap;
use z3::ast::{Array, Bool, Dynamic, Int, Set as ZSet, String as ZString};
use z3::Sort;

/// Solver sort selected for a term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortSpec {
    Int,
    Bool,
    Str,
    Set(Box<SortSpec>),
    Map(Box<SortSpec>, Box<SortSpec>),
}

impl SortSpec {
    /// Infer the sort for a declared type. Unknown named types and
    /// unsupported constructs default to integer.
    pub fn of_type(ty: &TypeExpr) -> SortSpec {
        match ty {
            TypeExpr::Const(name) => match name.as_str() {
                "int" | "integer" => SortSpec::Int,
                "bool" | "boolean" => SortSpec::Bool,
                "string" => SortSpec::Str,
                _ => SortSpec::Int,
            },
            TypeExpr::Set(element) => SortSpec::Set(Box::new(SortSpec::of_type(element))),
            TypeExpr::Map { domain, range } => SortSpec::Map(
                Box::new(SortSpec::of_type(domain)),
                Box::new(SortSpec::of_type(range)),
            ),
            TypeExpr::Func { .. } | TypeExpr::Tuple(_) => SortSpec::Int,
        }
    }

    fn z3(&self) -> Sort {
        match self {
            SortSpec::Int => Sort::int(),
            SortSpec::Bool => Sort::bool(),
            SortSpec::Str => Sort::string(),
            SortSpec::Set(element) => Sort::set(&element.z3()),
            SortSpec::Map(key, value) => Sort::array(&key.z3(), &value.z3()),
        }
    }
}

/// A translated term, tagged with enough sort information to keep array
/// reads and writes well-formed.
#[derive(Clone)]
pub enum Term {
    Bool(Bool),
    Int(Int),
    Str(ZString),
    Set { ast: ZSet, elem: SortSpec },
    Map { ast: Array, key: SortSpec, val: SortSpec },
}

impl Term {
    fn dynamic(&self) -> Dynamic {
        match self {
            Term::Bool(b) => Dynamic::from_ast(b),
            Term::Int(i) => Dynamic::from_ast(i),
            Term::Str(s) => Dynamic::from_ast(s),
            Term::Set { ast, .. } => Dynamic::from_ast(ast),
            Term::Map { ast, .. } => Dynamic::from_ast(ast),
        }
    }

    fn spec(&self) -> SortSpec {
        match self {
            Term::Bool(_) => SortSpec::Bool,
            Term::Int(_) => SortSpec::Int,
            Term::Str(_) => SortSpec::Str,
            Term::Set { elem, .. } => SortSpec::Set(Box::new(elem.clone())),
            Term::Map { key, val, .. } => {
                SortSpec::Map(Box::new(key.clone()), Box::new(val.clone()))
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Term::Bool(_) => "bool",
            Term::Int(_) => "int",
            Term::Str(_) => "string",
            Term::Set { .. } => "set",
            Term::Map { .. } => "map",
        }
    }
}

/// Encoding context for one translation. Variables are deduplicated per
/// context and collected for model extraction.
pub struct EncoderCtx<'a> {
    type_map: Option<&'a TypeMap>,
    sym_vars: HashMap<u32, Term>,
    named_vars: HashMap<String, Term>,
    /// Registration order of every variable the formula mentions.
    registered: Vec<(String, Term)>,
}

impl<'a> EncoderCtx<'a> {
    pub fn new(type_map: Option<&'a TypeMap>) -> EncoderCtx<'a> {
        EncoderCtx {
            type_map,
            sym_vars: HashMap::new(),
            named_vars: HashMap::new(),
            registered: Vec::new(),
        }
    }

    /// Every variable registered while encoding, in first-seen order.
    pub fn registered(&self) -> &[(String, Term)] {
        &self.registered
    }

    /// Encode an expression expected to be a boolean formula.
    pub fn encode_bool(&mut self, expr: &Expr) -> SolverResult<Bool> {
        match self.encode(expr)? {
            Term::Bool(b) => Ok(b),
            other => Err(SolverError::Encoding(format!(
                "expected boolean formula, got {} for {}",
                other.kind(),
                pretty_print_expr(expr),
            ))),
        }
    }

    /// Encode an expression to a Z3 term.
    pub fn encode(&mut self, expr: &Expr) -> SolverResult<Term> {
        match expr {
            Expr::Num(n) => Ok(Term::Int(Int::from_i64(*n))),
            Expr::Str(s) => {
                let ast = ZString::from_str(s)
                    .map_err(|e| SolverError::Encoding(format!("string literal: {e}")))?;
                Ok(Term::Str(ast))
            }
            Expr::Var(name) => Ok(self.named_var(name)),
            Expr::SymVar(n) => Ok(self.sym_var(*n)),
            Expr::Input => Err(SolverError::UnsupportedLiteral("input()".into())),
            Expr::Call { name, args } => self.encode_call(name, args),
            Expr::SetLit(elements) => self.encode_set_literal(elements),
            Expr::MapLit(pairs) => self.encode_map_literal(pairs),
            Expr::TupleLit(_) => Err(SolverError::UnsupportedLiteral(format!(
                "tuple {}",
                pretty_print_expr(expr)
            ))),
        }
    }

    // === Variables ===

    fn sym_var(&mut self, n: u32) -> Term {
        if let Some(term) = self.sym_vars.get(&n) {
            return term.clone();
        }
        let name = format!("X{n}");
        let term = Term::Int(Int::new_const(name.clone()));
        self.sym_vars.insert(n, term.clone());
        self.registered.push((name, term.clone()));
        term
    }

    fn named_var(&mut self, name: &str) -> Term {
        if let Some(term) = self.named_vars.get(name) {
            return term.clone();
        }
        let spec = self
            .type_map
            .and_then(|tm| tm.get(name))
            .map(SortSpec::of_type)
            .unwrap_or(SortSpec::Int);
        let term = self.make_const(name, &spec);
        self.named_vars.insert(name.into(), term.clone());
        self.registered.push((name.into(), term.clone()));
        term
    }

    fn make_const(&self, name: &str, spec: &SortSpec) -> Term {
        match spec {
            SortSpec::Int => Term::Int(Int::new_const(name)),
            SortSpec::Bool => Term::Bool(Bool::new_const(name)),
            SortSpec::Str => Term::Str(ZString::new_const(name)),
            SortSpec::Set(elem) => Term::Set {
                ast: ZSet::new_const(name, &elem.z3()),
                elem: (**elem).clone(),
            },
            SortSpec::Map(key, val) => Term::Map {
                ast: Array::new_const(name, &key.z3(), &val.z3()),
                key: (**key).clone(),
                val: (**val).clone(),
            },
        }
    }

    // === Literals ===

    fn encode_set_literal(&mut self, elements: &[Expr]) -> SolverResult<Term> {
        // Empty set defaults to integer elements.
        let Some((first, rest)) = elements.split_first() else {
            return Ok(Term::Set {
                ast: ZSet::empty(&Sort::int()),
                elem: SortSpec::Int,
            });
        };
        let first = self.encode(first)?;
        let elem = first.spec();
        let mut ast = ZSet::empty(&elem.z3()).add(&first.dynamic());
        for e in rest {
            let term = self.encode(e)?;
            if term.spec() != elem {
                return Err(SolverError::Encoding(format!(
                    "set literal mixes element sorts: {}",
                    pretty_print_expr(e),
                )));
            }
            ast = ast.add(&term.dynamic());
        }
        Ok(Term::Set { ast, elem })
    }

    fn encode_map_literal(&mut self, pairs: &[(String, Expr)]) -> SolverResult<Term> {
        // Empty map defaults to string keys and values.
        let Some(((first_key, first_val), rest)) = pairs.split_first() else {
            let key = SortSpec::Str;
            let val = SortSpec::Str;
            let default = self.make_const("_default", &val);
            return Ok(Term::Map {
                ast: Array::const_array(&key.z3(), &default.dynamic()),
                key,
                val,
            });
        };
        let k = self.named_var(first_key);
        let v = self.encode(first_val)?;
        let (key, val) = (k.spec(), v.spec());
        let default = self.make_const("_default", &val);
        let mut ast = Array::const_array(&key.z3(), &default.dynamic())
            .store(&k.dynamic(), &v.dynamic());
        for (key_name, value) in rest {
            let k = self.named_var(key_name);
            let v = self.encode(value)?;
            if k.spec() != key || v.spec() != val {
                return Err(SolverError::Encoding(format!(
                    "map literal mixes sorts at key {key_name}",
                )));
            }
            ast = ast.store(&k.dynamic(), &v.dynamic());
        }
        Ok(Term::Map { ast, key, val })
    }

    // === Operators ===

    fn encode_call(&mut self, name: &str, args: &[Expr]) -> SolverResult<Term> {
        let unsupported = || SolverError::UnsupportedOperator {
            name: name.into(),
            arity: args.len(),
        };

        match (name, args.len()) {
            // Arithmetic
            ("Add", 2) => {
                let (l, r) = self.encode_ints(args)?;
                Ok(Term::Int(Int::add(&[l, r])))
            }
            ("Sub", 2) => {
                let (l, r) = self.encode_ints(args)?;
                Ok(Term::Int(Int::sub(&[l, r])))
            }
            ("Mul", 2) => {
                let (l, r) = self.encode_ints(args)?;
                Ok(Term::Int(Int::mul(&[l, r])))
            }

            // Equality
            ("Eq" | "=" | "==", 2) => {
                let l = self.encode(&args[0])?;
                let r = self.encode(&args[1])?;
                Ok(Term::Bool(self.eq_terms(&l, &r)?))
            }
            ("Neq" | "!=" | "<>", 2) => {
                let l = self.encode(&args[0])?;
                let r = self.encode(&args[1])?;
                Ok(Term::Bool(self.eq_terms(&l, &r)?.not()))
            }

            // Ordering
            ("Lt" | "<", 2) => {
                let (l, r) = self.encode_ints(args)?;
                Ok(Term::Bool(l.lt(&r)))
            }
            ("Gt" | ">", 2) => {
                let (l, r) = self.encode_ints(args)?;
                Ok(Term::Bool(l.gt(&r)))
            }
            ("Le" | "<=", 2) => {
                let (l, r) = self.encode_ints(args)?;
                Ok(Term::Bool(l.le(&r)))
            }
            ("Ge" | ">=", 2) => {
                let (l, r) = self.encode_ints(args)?;
                Ok(Term::Bool(l.ge(&r)))
            }

            // Boolean connectives
            ("And" | "and" | "&&", 2) => {
                let (l, r) = self.encode_bools(args)?;
                Ok(Term::Bool(Bool::and(&[l, r])))
            }
            ("Or" | "or" | "||", 2) => {
                let (l, r) = self.encode_bools(args)?;
                Ok(Term::Bool(Bool::or(&[l, r])))
            }
            ("Not" | "not" | "!", 1) => {
                let b = self.encode_bool(&args[0])?;
                Ok(Term::Bool(b.not()))
            }
            ("Implies", 2) => {
                let (l, r) = self.encode_bools(args)?;
                Ok(Term::Bool(l.implies(&r)))
            }

            // Membership
            ("in" | "member" | "contains", 2) => {
                let member = self.membership(&args[0], &args[1])?;
                Ok(Term::Bool(member))
            }
            ("not_in" | "not_member" | "not_contains", 2) => {
                let member = self.membership(&args[0], &args[1])?;
                Ok(Term::Bool(member.not()))
            }

            // Set operations
            ("union", 2) => {
                let ((l, elem), (r, _)) = self.encode_sets(args)?;
                Ok(Term::Set {
                    ast: ZSet::set_union(&[l, r]),
                    elem,
                })
            }
            ("intersection" | "intersect", 2) => {
                let ((l, elem), (r, _)) = self.encode_sets(args)?;
                Ok(Term::Set {
                    ast: ZSet::intersect(&[l, r]),
                    elem,
                })
            }
            ("difference" | "diff" | "minus", 2) => {
                let ((l, elem), (r, _)) = self.encode_sets(args)?;
                Ok(Term::Set {
                    ast: l.difference(&r),
                    elem,
                })
            }
            ("subset" | "is_subset", 2) => {
                let ((l, _), (r, _)) = self.encode_sets(args)?;
                Ok(Term::Bool(l.set_subset(&r)))
            }
            ("add_to_set", 2) => {
                let (set, elem_spec) = self.expect_set(&args[0])?;
                let elem = self.encode_elem(&args[1], &elem_spec)?;
                Ok(Term::Set {
                    ast: set.add(&elem.dynamic()),
                    elem: elem_spec,
                })
            }
            ("remove_from_set", 2) => {
                let (set, elem_spec) = self.expect_set(&args[0])?;
                let elem = self.encode_elem(&args[1], &elem_spec)?;
                Ok(Term::Set {
                    ast: set.del(&elem.dynamic()),
                    elem: elem_spec,
                })
            }
            ("is_empty_set", 1) => {
                let (set, elem) = self.expect_set(&args[0])?;
                let empty = ZSet::empty(&elem.z3());
                Ok(Term::Bool(
                    Dynamic::from_ast(&set).eq(&Dynamic::from_ast(&empty)),
                ))
            }

            // Map operations
            ("get" | "lookup" | "select", 2) => {
                let (map, key, val) = self.expect_map(&args[0])?;
                let k = self.encode_elem(&args[1], &key)?;
                self.read_array(map.select(&k.dynamic()), &val)
            }
            ("put" | "store" | "update", 3) => {
                let (map, key, val) = self.expect_map(&args[0])?;
                let k = self.encode_elem(&args[1], &key)?;
                let v = self.encode_elem(&args[2], &val)?;
                Ok(Term::Map {
                    ast: map.store(&k.dynamic(), &v.dynamic()),
                    key,
                    val,
                })
            }
            ("contains_key" | "has_key", 2) => {
                // Map domains are not tracked separately, so key lookups
                // answer true. The operands are still encoded so their
                // variables register.
                self.encode(&args[0])?;
                self.encode(&args[1])?;
                Ok(Term::Bool(Bool::from_bool(true)))
            }

            // Sequence operations, over the string theory.
            ("concat" | "append_list", 2) => {
                let (l, r) = self.encode_strs(args)?;
                Ok(Term::Str(ZString::concat(&[l, r])))
            }
            ("length", 1) => {
                let s = self.expect_str(&args[0])?;
                Ok(Term::Int(s.length()))
            }
            ("at" | "nth", 2) => {
                let s = self.expect_str(&args[0])?;
                let i = self.expect_int(&args[1])?;
                Ok(Term::Str(s.at(&i)))
            }
            ("prefix", 2) => {
                let (l, r) = self.encode_strs(args)?;
                Ok(Term::Bool(l.prefix(&r)))
            }
            ("suffix", 2) => {
                let (l, r) = self.encode_strs(args)?;
                Ok(Term::Bool(l.suffix(&r)))
            }
            ("contains_seq", 2) => {
                let (l, r) = self.encode_strs(args)?;
                Ok(Term::Bool(l.contains(&r)))
            }

            // Tautology whose purpose is to register its variable.
            ("Any" | "any", 1) => {
                self.encode(&args[0])?;
                Ok(Term::Bool(Bool::from_bool(true)))
            }

            _ => Err(unsupported()),
        }
    }

    // === Typed operand helpers ===

    fn expect_int(&mut self, expr: &Expr) -> SolverResult<Int> {
        match self.encode(expr)? {
            Term::Int(i) => Ok(i),
            other => Err(SolverError::Encoding(format!(
                "expected integer operand, got {} for {}",
                other.kind(),
                pretty_print_expr(expr),
            ))),
        }
    }

    fn expect_str(&mut self, expr: &Expr) -> SolverResult<ZString> {
        match self.encode(expr)? {
            Term::Str(s) => Ok(s),
            other => Err(SolverError::Encoding(format!(
                "expected string operand, got {} for {}",
                other.kind(),
                pretty_print_expr(expr),
            ))),
        }
    }

    fn expect_set(&mut self, expr: &Expr) -> SolverResult<(ZSet, SortSpec)> {
        match self.encode(expr)? {
            Term::Set { ast, elem } => Ok((ast, elem)),
            other => Err(SolverError::Encoding(format!(
                "expected set operand, got {} for {}",
                other.kind(),
                pretty_print_expr(expr),
            ))),
        }
    }

    fn expect_map(&mut self, expr: &Expr) -> SolverResult<(Array, SortSpec, SortSpec)> {
        match self.encode(expr)? {
            Term::Map { ast, key, val } => Ok((ast, key, val)),
            other => Err(SolverError::Encoding(format!(
                "expected map operand, got {} for {}",
                other.kind(),
                pretty_print_expr(expr),
            ))),
        }
    }

    fn encode_ints(&mut self, args: &[Expr]) -> SolverResult<(Int, Int)> {
        Ok((self.expect_int(&args[0])?, self.expect_int(&args[1])?))
    }

    fn encode_bools(&mut self, args: &[Expr]) -> SolverResult<(Bool, Bool)> {
        Ok((self.encode_bool(&args[0])?, self.encode_bool(&args[1])?))
    }

    fn encode_strs(&mut self, args: &[Expr]) -> SolverResult<(ZString, ZString)> {
        Ok((self.expect_str(&args[0])?, self.expect_str(&args[1])?))
    }

    fn encode_sets(&mut self, args: &[Expr]) -> SolverResult<((ZSet, SortSpec), (ZSet, SortSpec))> {
        let l = self.expect_set(&args[0])?;
        let r = self.expect_set(&args[1])?;
        if l.1 != r.1 {
            return Err(SolverError::Encoding(format!(
                "set operands have different element sorts: {} and {}",
                pretty_print_expr(&args[0]),
                pretty_print_expr(&args[1]),
            )));
        }
        Ok((l, r))
    }

    /// Encode an element expected to land in `spec`.
    fn encode_elem(&mut self, expr: &Expr, spec: &SortSpec) -> SolverResult<Term> {
        let term = self.encode(expr)?;
        if term.spec() != *spec {
            return Err(SolverError::Encoding(format!(
                "operand {} has sort {}, container expects another",
                pretty_print_expr(expr),
                term.kind(),
            )));
        }
        Ok(term)
    }

    fn eq_terms(&self, l: &Term, r: &Term) -> SolverResult<Bool> {
        match (l, r) {
            (Term::Int(a), Term::Int(b)) => Ok(a.eq(b)),
            (Term::Bool(a), Term::Bool(b)) => Ok(a.eq(b)),
            (Term::Str(a), Term::Str(b)) => Ok(a.eq(b)),
            (Term::Set { .. }, Term::Set { .. }) | (Term::Map { .. }, Term::Map { .. })
                if l.spec() == r.spec() =>
            {
                Ok(l.dynamic().eq(&r.dynamic()))
            }
            _ => Err(SolverError::Encoding(format!(
                "cannot compare {} with {}",
                l.kind(),
                r.kind(),
            ))),
        }
    }

    fn membership(&mut self, element: &Expr, collection: &Expr) -> SolverResult<Bool> {
        match self.encode(collection)? {
            Term::Set { ast, elem } => {
                let e = self.encode_elem(element, &elem)?;
                Ok(ast.member(&e.dynamic()))
            }
            Term::Map { ast, key, val } => {
                let k = self.encode_elem(element, &key)?;
                match self.read_array(ast.select(&k.dynamic()), &val)? {
                    Term::Bool(b) => Ok(b),
                    other => Err(SolverError::Encoding(format!(
                        "membership over a map with {} values: {}",
                        other.kind(),
                        pretty_print_expr(collection),
                    ))),
                }
            }
            other => Err(SolverError::Encoding(format!(
                "membership needs a set or map, got {} for {}",
                other.kind(),
                pretty_print_expr(collection),
            ))),
        }
    }

    /// Re-tag an array read with the array's declared value sort.
    fn read_array(&self, value: Dynamic, val: &SortSpec) -> SolverResult<Term> {
        match val {
            SortSpec::Int => value
                .as_int()
                .map(Term::Int)
                .ok_or_else(|| SolverError::Encoding("array read is not an integer".into())),
            SortSpec::Bool => value
                .as_bool()
                .map(Term::Bool)
                .ok_or_else(|| SolverError::Encoding("array read is not a boolean".into())),
            SortSpec::Str => value
                .as_string()
                .map(Term::Str)
                .ok_or_else(|| SolverError::Encoding("array read is not a string".into())),
            SortSpec::Set(_) | SortSpec::Map(_, _) => Err(SolverError::Encoding(
                "array reads of nested collections are not modeled".into(),
            )),
        }
    }
}
