//! Classification of function names.
//!
//! A call whose name appears here is a built-in operator; every other
//! call is a real API call dispatched through the function factory. The
//! executor and the solver bridge both consult this one list.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Built-in operator names, including every accepted symbol form.
pub static BUILTINS: &[&str] = &[
    // Arithmetic
    "Add", "Sub", "Mul", "Div",
    // Comparison
    "Eq", "Lt", "Gt", "Le", "Ge", "Neq",
    "=", "==", "!=", "<>", "<", ">", "<=", ">=",
    // Logical
    "And", "Or", "Not", "Implies",
    "and", "or", "not", "&&", "||", "!",
    // Input marker
    "input",
    // Set operations
    "in", "not_in", "member", "not_member", "contains", "not_contains",
    "union", "intersection", "intersect", "difference", "diff", "minus",
    "subset", "is_subset", "add_to_set", "remove_from_set", "is_empty_set",
    // Map operations
    "get", "put", "lookup", "select", "store", "update",
    "contains_key", "has_key",
    // Sequence operations
    "concat", "append_list", "length", "at", "nth",
    "prefix", "suffix", "contains_seq",
    // Unconstrained-variable marker
    "Any", "any",
    // Prime notation (postconditions only)
    "'",
];

static BUILTIN_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| BUILTINS.iter().copied().collect());

/// Whether `name` is a built-in operator (as opposed to a real API).
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_SET.contains(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_operators_and_apis() {
        assert!(is_builtin("Add"));
        assert!(is_builtin("=="));
        assert!(is_builtin("input"));
        assert!(is_builtin("'"));
        assert!(is_builtin("Any"));
        assert!(is_builtin("contains_key"));

        assert!(!is_builtin("signup"));
        assert!(!is_builtin("f1"));
        assert!(!is_builtin("get_y"));
        assert!(!is_builtin("set_y"));
    }
}
