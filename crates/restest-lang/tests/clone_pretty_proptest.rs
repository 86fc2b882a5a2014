//! Structural properties of the IR: cloning is deep and faithful, and
//! printing is a pure function of structure.

use proptest::prelude::*;
use restest_lang::pretty::pretty_print_expr;
use restest_lang::Expr;

fn arb_expr() -> impl Strategy<Value = Expr> {
    let leaf = prop_oneof![
        any::<i64>().prop_map(Expr::Num),
        "[a-z][a-z0-9]{0,6}".prop_map(Expr::Str),
        "[a-z][a-z0-9]{0,6}".prop_map(Expr::Var),
        (0u32..1000).prop_map(Expr::SymVar),
        Just(Expr::Input),
    ];
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            ("[A-Za-z_][a-z_]{0,8}", prop::collection::vec(inner.clone(), 0..4))
                .prop_map(|(name, args)| Expr::Call { name, args }),
            prop::collection::vec(inner.clone(), 0..4).prop_map(Expr::SetLit),
            prop::collection::vec(("[a-z][a-z0-9]{0,4}".prop_map(String::from), inner.clone()), 0..3)
                .prop_map(Expr::MapLit),
            prop::collection::vec(inner, 0..4).prop_map(Expr::TupleLit),
        ]
    })
}

proptest! {
    #[test]
    fn clone_is_structurally_equal(e in arb_expr()) {
        let c = e.clone();
        prop_assert_eq!(&e, &c);
    }

    #[test]
    fn clone_prints_identically(e in arb_expr()) {
        let c = e.clone();
        prop_assert_eq!(pretty_print_expr(&e), pretty_print_expr(&c));
    }

    #[test]
    fn printing_is_deterministic(e in arb_expr()) {
        prop_assert_eq!(pretty_print_expr(&e), pretty_print_expr(&e));
    }
}
