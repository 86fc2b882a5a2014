//! Pretty printer for the test-case IR.
//!
//! The printed form is consumed by humans (diagnostics, logs, tests);
//! no component parses it back.

use crate::ast::{Expr, Program, Stmt, TypeExpr};
use crate::spec::{Api, Spec};

/// Pretty print a program, one statement per line.
pub fn pretty_print(program: &Program) -> String {
    let mut printer = PrettyPrinter::new();
    printer.print_program(program);
    printer.output
}

/// Pretty print an expression to a string.
pub fn pretty_print_expr(expr: &Expr) -> String {
    let mut printer = PrettyPrinter::new();
    printer.print_expr(expr);
    printer.output
}

/// Pretty print a statement to a string.
pub fn pretty_print_stmt(stmt: &Stmt) -> String {
    let mut printer = PrettyPrinter::new();
    printer.print_stmt(stmt);
    printer.output
}

/// Pretty print a type expression to a string.
pub fn pretty_print_type(ty: &TypeExpr) -> String {
    let mut printer = PrettyPrinter::new();
    printer.print_type(ty);
    printer.output
}

/// Pretty print a specification (diagnostics only).
pub fn pretty_print_spec(spec: &Spec) -> String {
    let mut printer = PrettyPrinter::new();
    printer.print_spec(spec);
    printer.output
}

struct PrettyPrinter {
    output: String,
}

impl PrettyPrinter {
    fn new() -> Self {
        Self {
            output: String::new(),
        }
    }

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn newline(&mut self) {
        self.output.push('\n');
    }

    fn print_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Num(n) => self.write(&n.to_string()),
            Expr::Str(s) => {
                self.write("\"");
                self.write(s);
                self.write("\"");
            }
            Expr::Var(name) => self.write(name),
            Expr::SymVar(n) => {
                self.write("X");
                self.write(&n.to_string());
            }
            Expr::Input => self.write("input()"),
            Expr::Call { name, args } => {
                self.write(name);
                self.write("(");
                self.print_comma_separated(args);
                self.write(")");
            }
            Expr::SetLit(elements) => {
                self.write("{");
                self.print_comma_separated(elements);
                self.write("}");
            }
            Expr::MapLit(pairs) => {
                self.write("{");
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.write(key);
                    self.write(" -> ");
                    self.print_expr(value);
                }
                self.write("}");
            }
            Expr::TupleLit(elements) => {
                self.write("(");
                self.print_comma_separated(elements);
                self.write(")");
            }
        }
    }

    fn print_comma_separated(&mut self, exprs: &[Expr]) {
        for (i, e) in exprs.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.print_expr(e);
        }
    }

    fn print_type(&mut self, ty: &TypeExpr) {
        match ty {
            TypeExpr::Const(name) => self.write(name),
            TypeExpr::Func { params, ret } => {
                self.write("(");
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.print_type(p);
                }
                self.write(") -> ");
                self.print_type(ret);
            }
            TypeExpr::Map { domain, range } => {
                self.write("map<");
                self.print_type(domain);
                self.write(", ");
                self.print_type(range);
                self.write(">");
            }
            TypeExpr::Tuple(elements) => {
                self.write("(");
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.print_type(e);
                }
                self.write(")");
            }
            TypeExpr::Set(element) => {
                self.write("set<");
                self.print_type(element);
                self.write(">");
            }
        }
    }

    fn print_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Assign { left, right } => {
                self.print_expr(left);
                self.write(" := ");
                self.print_expr(right);
            }
            Stmt::Assume(e) => {
                self.write("assume(");
                self.print_expr(e);
                self.write(")");
            }
            Stmt::Assert(e) => {
                self.write("assert(");
                self.print_expr(e);
                self.write(")");
            }
            Stmt::Decl { name, ty } => {
                self.write(name);
                self.write(": ");
                self.print_type(ty);
            }
        }
    }

    fn print_program(&mut self, program: &Program) {
        for stmt in &program.statements {
            self.print_stmt(stmt);
            self.newline();
        }
    }

    fn print_api(&mut self, api: &Api) {
        self.write(&api.name);
        self.write(": pre ");
        self.print_expr(&api.pre);
        self.write("; call ");
        self.write(&api.call.name);
        self.write("(");
        self.print_comma_separated(&api.call.args);
        self.write(")");
        if let Some(post) = &api.response.expr {
            self.write("; post ");
            self.print_expr(post);
        }
    }

    fn print_spec(&mut self, spec: &Spec) {
        for g in &spec.globals {
            self.write(&g.name);
            self.write(": ");
            self.print_type(&g.ty);
            self.newline();
        }
        for init in &spec.init {
            self.write(&init.var_name);
            self.write(" := ");
            self.print_expr(&init.expr);
            self.newline();
        }
        for block in &spec.blocks {
            self.print_api(block);
            self.newline();
        }
    }
}
