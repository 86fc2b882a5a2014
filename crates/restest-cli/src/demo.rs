//! A built-in demo application: an adder endpoint and a counter store.
//!
//! The specification mirrors a tiny service with one numeric global.
//! `f1(x, z)` returns the sum of its arguments; `bump(d)` adds `d` to
//! the stored counter and returns the new value.

use restest_lang::{
    Api, ApiCall, Decl, Expr, HttpResponseCode, Init, Response, Spec, SymbolTable, TypeExpr,
    TypeMap,
};
use restest_see::{Callable, FactoryError, FunctionFactory};
use std::sync::Mutex;

/// API blocks the demo specification declares.
pub const BLOCK_NAMES: &[&str] = &["f1", "bump"];

/// Demo specification plus the matching symbol table.
pub fn demo_spec() -> (Spec, SymbolTable) {
    let spec = Spec {
        globals: vec![Decl::new("y", TypeExpr::named("int"))],
        init: vec![Init::new("y", Expr::Num(0))],
        functions: Vec::new(),
        blocks: vec![
            Api {
                name: "f1".into(),
                pre: Expr::binop(
                    "And",
                    Expr::binop("Gt", Expr::var("x"), Expr::Num(0)),
                    Expr::binop("Gt", Expr::var("z"), Expr::Num(0)),
                ),
                call: ApiCall {
                    name: "f1".into(),
                    args: vec![Expr::var("x"), Expr::var("z")],
                    response: Response::new(HttpResponseCode::Ok200, Some(Expr::var("r"))),
                },
                response: Response::new(
                    HttpResponseCode::Ok200,
                    Some(Expr::binop(
                        "Eq",
                        Expr::var("r"),
                        Expr::binop("Add", Expr::var("x"), Expr::var("z")),
                    )),
                ),
            },
            Api {
                name: "bump".into(),
                pre: Expr::binop("Gt", Expr::var("d"), Expr::Num(0)),
                call: ApiCall {
                    name: "bump".into(),
                    args: vec![Expr::var("d")],
                    response: Response::new(HttpResponseCode::Ok200, Some(Expr::var("c"))),
                },
                response: Response::new(
                    HttpResponseCode::Ok200,
                    Some(Expr::binop(
                        "Eq",
                        Expr::call("'", vec![Expr::var("y")]),
                        Expr::binop("Add", Expr::var("y"), Expr::var("d")),
                    )),
                ),
            },
        ],
    };

    let mut symbols = SymbolTable::new();
    let global = symbols.global();
    symbols
        .declare(global, "y", TypeExpr::named("int"))
        .expect("fresh symbol table");

    let f1 = symbols.add_child(global);
    symbols.declare(f1, "x", TypeExpr::named("int")).expect("fresh scope");
    symbols.declare(f1, "z", TypeExpr::named("int")).expect("fresh scope");

    let bump = symbols.add_child(global);
    symbols.declare(bump, "d", TypeExpr::named("int")).expect("fresh scope");

    (spec, symbols)
}

/// Variable types for the solver bridge.
pub fn demo_type_map() -> TypeMap {
    let mut type_map = TypeMap::new();
    type_map.update("y", TypeExpr::named("int"));
    type_map.update("y_old", TypeExpr::named("int"));
    type_map
}

/// In-process implementations for the demo endpoints.
pub struct DemoFactory {
    counter: Mutex<i64>,
}

impl DemoFactory {
    pub fn new() -> DemoFactory {
        DemoFactory {
            counter: Mutex::new(0),
        }
    }
}

struct Ready(Expr);

impl Callable for Ready {
    fn execute(&mut self) -> Result<Expr, FactoryError> {
        Ok(self.0.clone())
    }
}

impl FunctionFactory for DemoFactory {
    fn get(&self, name: &str, args: &[Expr]) -> Result<Box<dyn Callable>, FactoryError> {
        let int_arg = |i: usize| match args.get(i) {
            Some(Expr::Num(n)) => Ok(*n),
            other => Err(FactoryError::new(
                name,
                format!("argument {i} is not a concrete integer: {other:?}"),
            )),
        };
        match name {
            "f1" => {
                let sum = int_arg(0)? + int_arg(1)?;
                Ok(Box::new(Ready(Expr::Num(sum))))
            }
            "bump" => {
                let mut counter = self
                    .counter
                    .lock()
                    .map_err(|_| FactoryError::new(name, "counter poisoned"))?;
                *counter += int_arg(0)?;
                Ok(Box::new(Ready(Expr::Num(*counter))))
            }
            _ => Err(FactoryError::new(name, "no implementation registered")),
        }
    }
}
