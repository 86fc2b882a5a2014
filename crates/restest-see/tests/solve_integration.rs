//! Integration tests for the Z3 bridge: sort selection, the operator
//! table, model extraction, and unsat handling.

use restest_lang::{Expr, TypeExpr, TypeMap};
use restest_see::{ResultValue, Solver, SolverError, Z3Solver};

fn sym(n: u32) -> Expr {
    Expr::SymVar(n)
}

#[test]
fn arithmetic_constraint_is_satisfiable() {
    // And(Gt(X0, 0), Gt(X1, 0))
    let formula = Expr::binop(
        "And",
        Expr::binop("Gt", sym(0), Expr::Num(0)),
        Expr::binop("Gt", sym(1), Expr::Num(0)),
    );
    let result = Z3Solver::new().solve(&formula).unwrap();
    assert!(result.sat);

    let x0 = result.model.get("X0").unwrap();
    let x1 = result.model.get("X1").unwrap();
    for v in [x0, x1] {
        match v {
            ResultValue::Int(n) => assert!(*n > 0),
            other => panic!("expected integer, got {other:?}"),
        }
    }
}

#[test]
fn contradictory_product_is_unsat() {
    // Eq(Mul(X0, X1), 3) conjoined with Eq(X0, 5) has no integer model.
    let formula = Expr::binop(
        "And",
        Expr::binop("Eq", Expr::binop("Mul", sym(0), sym(1)), Expr::Num(3)),
        Expr::binop("Eq", sym(0), Expr::Num(5)),
    );
    let result = Z3Solver::new().solve(&formula).unwrap();
    assert!(!result.sat);
    assert!(result.model.is_empty());
}

#[test]
fn set_membership_picks_an_element() {
    let formula = Expr::binop(
        "in",
        sym(0),
        Expr::SetLit(vec![Expr::Num(10), Expr::Num(20), Expr::Num(30)]),
    );
    let result = Z3Solver::new().solve(&formula).unwrap();
    assert!(result.sat);
    match result.model.get("X0").unwrap() {
        ResultValue::Int(n) => assert!([10, 20, 30].contains(n)),
        other => panic!("expected integer, got {other:?}"),
    }
}

#[test]
fn negated_membership_avoids_the_elements() {
    let formula = Expr::binop(
        "not_in",
        sym(0),
        Expr::SetLit(vec![Expr::Num(1), Expr::Num(2)]),
    );
    let result = Z3Solver::new().solve(&formula).unwrap();
    assert!(result.sat);
    match result.model.get("X0").unwrap() {
        ResultValue::Int(n) => assert!(![1, 2].contains(n)),
        other => panic!("expected integer, got {other:?}"),
    }
}

#[test]
fn set_algebra_constraints_solve() {
    // X0 in ({1,2} ∪ {3}) \ {2}, X0 ≠ 1, X0 ≠ 3 is unsat.
    let lhs = Expr::binop(
        "difference",
        Expr::binop(
            "union",
            Expr::SetLit(vec![Expr::Num(1), Expr::Num(2)]),
            Expr::SetLit(vec![Expr::Num(3)]),
        ),
        Expr::SetLit(vec![Expr::Num(2)]),
    );
    let formula = Expr::binop(
        "And",
        Expr::binop("in", sym(0), lhs),
        Expr::binop(
            "And",
            Expr::binop("Neq", sym(0), Expr::Num(1)),
            Expr::binop("Neq", sym(0), Expr::Num(3)),
        ),
    );
    let result = Z3Solver::new().solve(&formula).unwrap();
    assert!(!result.sat);
}

#[test]
fn subset_and_add_to_set() {
    let formula = Expr::binop(
        "subset",
        Expr::SetLit(vec![Expr::Num(1)]),
        Expr::binop(
            "add_to_set",
            Expr::SetLit(vec![Expr::Num(2)]),
            Expr::Num(1),
        ),
    );
    let result = Z3Solver::new().solve(&formula).unwrap();
    assert!(result.sat);
}

#[test]
fn typed_variables_use_the_type_map() {
    let mut type_map = TypeMap::new();
    type_map.update("flag", TypeExpr::named("bool"));
    type_map.update("name", TypeExpr::named("string"));

    let formula = Expr::binop(
        "And",
        Expr::var("flag"),
        Expr::binop("Eq", Expr::var("name"), Expr::Str("alice".into())),
    );
    let result = Z3Solver::with_type_map(type_map).solve(&formula).unwrap();
    assert!(result.sat);
    assert_eq!(result.model.get("flag"), Some(&ResultValue::Bool(true)));
    assert_eq!(
        result.model.get("name"),
        Some(&ResultValue::Str("alice".into()))
    );
}

#[test]
fn map_store_then_select_round_trips() {
    let mut type_map = TypeMap::new();
    type_map.update(
        "m",
        TypeExpr::map(TypeExpr::named("int"), TypeExpr::named("int")),
    );

    // Eq(get(put(m, 1, X0), 1), 42)
    let formula = Expr::binop(
        "Eq",
        Expr::binop(
            "get",
            Expr::call("put", vec![Expr::var("m"), Expr::Num(1), sym(0)]),
            Expr::Num(1),
        ),
        Expr::Num(42),
    );
    let result = Z3Solver::with_type_map(type_map).solve(&formula).unwrap();
    assert!(result.sat);
    assert_eq!(result.model.get("X0"), Some(&ResultValue::Int(42)));
}

#[test]
fn contains_key_answers_true() {
    let mut type_map = TypeMap::new();
    type_map.update(
        "m",
        TypeExpr::map(TypeExpr::named("int"), TypeExpr::named("int")),
    );
    let formula = Expr::binop("contains_key", Expr::var("m"), Expr::Num(5));
    let result = Z3Solver::with_type_map(type_map).solve(&formula).unwrap();
    assert!(result.sat);
}

#[test]
fn any_registers_its_variable() {
    let formula = Expr::call("Any", vec![sym(3)]);
    let result = Z3Solver::new().solve(&formula).unwrap();
    assert!(result.sat);
    assert!(result.model.contains_key("X3"));
}

#[test]
fn string_concat_and_length() {
    let mut type_map = TypeMap::new();
    type_map.update("s", TypeExpr::named("string"));
    // length(concat(s, "ab")) == 5
    let formula = Expr::binop(
        "Eq",
        Expr::call(
            "length",
            vec![Expr::binop("concat", Expr::var("s"), Expr::Str("ab".into()))],
        ),
        Expr::Num(5),
    );
    let result = Z3Solver::with_type_map(type_map).solve(&formula).unwrap();
    assert!(result.sat);
    match result.model.get("s").unwrap() {
        ResultValue::Str(s) => assert_eq!(s.chars().count(), 3),
        other => panic!("expected string, got {other:?}"),
    }
}

#[test]
fn prefix_of_a_known_string() {
    let mut type_map = TypeMap::new();
    type_map.update("s", TypeExpr::named("string"));
    // prefix(s, "abc") with length(s) == 2 forces s = "ab".
    let formula = Expr::binop(
        "And",
        Expr::binop("prefix", Expr::var("s"), Expr::Str("abc".into())),
        Expr::binop("Eq", Expr::call("length", vec![Expr::var("s")]), Expr::Num(2)),
    );
    let result = Z3Solver::with_type_map(type_map).solve(&formula).unwrap();
    assert!(result.sat);
    assert_eq!(result.model.get("s"), Some(&ResultValue::Str("ab".into())));
}

#[test]
fn prefix_composes_under_negation() {
    // "ab" is a prefix of "abc", so the positive form is satisfiable
    // and its negation is not.
    let holds = Expr::binop("prefix", Expr::Str("ab".into()), Expr::Str("abc".into()));
    assert!(Z3Solver::new().solve(&holds).unwrap().sat);

    let negated = Expr::call("Not", vec![holds]);
    assert!(!Z3Solver::new().solve(&negated).unwrap().sat);

    // A genuine non-prefix stays satisfiable when negated.
    let fails = Expr::call(
        "Not",
        vec![Expr::binop(
            "prefix",
            Expr::Str("b".into()),
            Expr::Str("abc".into()),
        )],
    );
    assert!(Z3Solver::new().solve(&fails).unwrap().sat);
}

#[test]
fn prefix_drives_an_implication_antecedent() {
    // Implies(prefix("ab", "abc"), 1 == 2): true antecedent, false
    // conclusion.
    let formula = Expr::binop(
        "Implies",
        Expr::binop("prefix", Expr::Str("ab".into()), Expr::Str("abc".into())),
        Expr::binop("Eq", Expr::Num(1), Expr::Num(2)),
    );
    assert!(!Z3Solver::new().solve(&formula).unwrap().sat);
}

#[test]
fn suffix_composes_under_negation() {
    let holds = Expr::binop("suffix", Expr::Str("bc".into()), Expr::Str("abc".into()));
    assert!(Z3Solver::new().solve(&holds).unwrap().sat);

    let negated = Expr::call("Not", vec![holds]);
    assert!(!Z3Solver::new().solve(&negated).unwrap().sat);

    let fails = Expr::call(
        "Not",
        vec![Expr::binop(
            "suffix",
            Expr::Str("ab".into()),
            Expr::Str("abc".into()),
        )],
    );
    assert!(Z3Solver::new().solve(&fails).unwrap().sat);
}

#[test]
fn suffix_of_an_unknown_string() {
    let mut type_map = TypeMap::new();
    type_map.update("s", TypeExpr::named("string"));
    // suffix(s, "abc") with length(s) == 2 forces s = "bc".
    let formula = Expr::binop(
        "And",
        Expr::binop("suffix", Expr::var("s"), Expr::Str("abc".into())),
        Expr::binop("Eq", Expr::call("length", vec![Expr::var("s")]), Expr::Num(2)),
    );
    let result = Z3Solver::with_type_map(type_map).solve(&formula).unwrap();
    assert!(result.sat);
    assert_eq!(result.model.get("s"), Some(&ResultValue::Str("bc".into())));
}

#[test]
fn contains_seq_composes_under_negation() {
    let holds = Expr::binop(
        "contains_seq",
        Expr::Str("abc".into()),
        Expr::Str("b".into()),
    );
    assert!(Z3Solver::new().solve(&holds).unwrap().sat);

    let negated = Expr::call("Not", vec![holds]);
    assert!(!Z3Solver::new().solve(&negated).unwrap().sat);

    let fails = Expr::call(
        "Not",
        vec![Expr::binop(
            "contains_seq",
            Expr::Str("abc".into()),
            Expr::Str("z".into()),
        )],
    );
    assert!(Z3Solver::new().solve(&fails).unwrap().sat);
}

#[test]
fn indexed_reads_of_known_strings() {
    let holds = Expr::binop(
        "Eq",
        Expr::binop("at", Expr::Str("hi".into()), Expr::Num(1)),
        Expr::Str("i".into()),
    );
    assert!(Z3Solver::new().solve(&holds).unwrap().sat);

    let negated = Expr::call("Not", vec![holds]);
    assert!(!Z3Solver::new().solve(&negated).unwrap().sat);
}

#[test]
fn repeated_indexed_reads_denote_the_same_value() {
    // at and nth are the same read: two occurrences over the same
    // string and index cannot disagree.
    let mut type_map = TypeMap::new();
    type_map.update("s", TypeExpr::named("string"));
    let formula = Expr::binop(
        "And",
        Expr::binop(
            "Eq",
            Expr::binop("at", Expr::var("s"), Expr::Num(1)),
            Expr::Str("x".into()),
        ),
        Expr::binop(
            "Eq",
            Expr::binop("nth", Expr::var("s"), Expr::Num(1)),
            Expr::Str("y".into()),
        ),
    );
    let result = Z3Solver::with_type_map(type_map).solve(&formula).unwrap();
    assert!(!result.sat);
}

#[test]
fn indexed_reads_constrain_unknown_strings() {
    let mut type_map = TypeMap::new();
    type_map.update("s", TypeExpr::named("string"));
    let formula = Expr::binop(
        "And",
        Expr::binop("Eq", Expr::call("length", vec![Expr::var("s")]), Expr::Num(2)),
        Expr::binop(
            "And",
            Expr::binop(
                "Eq",
                Expr::binop("at", Expr::var("s"), Expr::Num(0)),
                Expr::Str("h".into()),
            ),
            Expr::binop(
                "Eq",
                Expr::binop("at", Expr::var("s"), Expr::Num(1)),
                Expr::Str("i".into()),
            ),
        ),
    );
    let result = Z3Solver::with_type_map(type_map).solve(&formula).unwrap();
    assert!(result.sat);
    assert_eq!(result.model.get("s"), Some(&ResultValue::Str("hi".into())));
}

#[test]
fn unknown_function_is_rejected() {
    let formula = Expr::call("get_y", Vec::new());
    let err = Z3Solver::new().solve(&formula).unwrap_err();
    assert!(matches!(err, SolverError::UnsupportedOperator { .. }));
}

#[test]
fn arity_mismatch_is_rejected() {
    let formula = Expr::call("Add", vec![Expr::Num(1)]);
    let err = Z3Solver::new().solve(&formula).unwrap_err();
    match err {
        SolverError::UnsupportedOperator { name, arity } => {
            assert_eq!(name, "Add");
            assert_eq!(arity, 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn tuple_literals_are_rejected() {
    let formula = Expr::binop(
        "Eq",
        Expr::TupleLit(vec![Expr::Num(1)]),
        Expr::TupleLit(vec![Expr::Num(1)]),
    );
    let err = Z3Solver::new().solve(&formula).unwrap_err();
    assert!(matches!(err, SolverError::UnsupportedLiteral(_)));
}

#[test]
fn trivial_formula_solves_with_empty_model() {
    let formula = Expr::binop("Eq", Expr::Num(1), Expr::Num(1));
    let result = Z3Solver::new().solve(&formula).unwrap();
    assert!(result.sat);
    assert!(result.model.is_empty());
}
