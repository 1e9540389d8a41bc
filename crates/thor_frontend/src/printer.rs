//! Prints an AST back as source text.
//!
//! The output is canonical rather than faithful: every binary and
//! unary expression is fully parenthesized and indentation is
//! normalized, so printing a parsed program and reparsing the result
//! yields the same tree. Mostly useful in tests and for inspecting
//! what the import resolver produced.

use std::fmt::Write;

use crate::ast::*;

pub fn print(program: &Program) -> String {
    let mut printer = Printer::default();
    printer.print_program(program);
    printer.output
}

#[derive(Default)]
struct Printer {
    output: String,
    indent: usize,
}

impl Printer {
    fn print_program(&mut self, program: &Program) {
        if let Some(package) = &program.package {
            self.line(&format!("package {package};"));
        }

        for import in &program.imports {
            self.line(&format!("import \"{}\";", escape(&import.module)));
        }

        for stmt in &program.statements {
            self.print_stmt(stmt);
        }
    }

    fn print_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(expr) => {
                let expr = print_expr(expr);
                self.line(&format!("{expr};"));
            }

            Stmt::VarDecl { name, ty, init } => match init {
                Some(init) => {
                    let init = print_expr(init);
                    self.line(&format!("{ty} {name} = {init};"));
                }
                None => self.line(&format!("{ty} {name};")),
            },

            Stmt::ConstDecl { name, ty, init } => {
                let init = print_expr(init);
                self.line(&format!("const {ty} {name} = {init};"));
            }

            Stmt::Block(statements) => {
                self.line("{");
                self.indented(|printer| {
                    for stmt in statements {
                        printer.print_stmt(stmt);
                    }
                });
                self.line("}");
            }

            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = print_expr(cond);
                self.line(&format!("if ({cond})"));
                self.indented(|printer| printer.print_stmt(then_branch));
                if let Some(else_branch) = else_branch {
                    self.line("else");
                    self.indented(|printer| printer.print_stmt(else_branch));
                }
            }

            Stmt::While { cond, body } => {
                let cond = print_expr(cond);
                self.line(&format!("while ({cond})"));
                self.indented(|printer| printer.print_stmt(body));
            }

            Stmt::Return(value) => match value {
                Some(value) => {
                    let value = print_expr(value);
                    self.line(&format!("return {value};"));
                }
                None => self.line("return;"),
            },

            Stmt::Func(func) => self.print_func(func),

            Stmt::Extern { name, params, ret } => {
                let params = print_params(params);
                self.line(&format!("extern {ret} {name}({params});"));
            }
        }
    }

    fn print_func(&mut self, func: &FuncDecl) {
        let params = print_params(&func.params);
        let header = format!("{} {}({params})", func.ret, func.name);

        match &func.body {
            Some(body) => {
                self.line(&format!("{header} {{"));
                self.indented(|printer| {
                    for stmt in body {
                        printer.print_stmt(stmt);
                    }
                });
                self.line("}");
            }
            None => self.line(&format!("{header};")),
        }
    }

    fn indented(&mut self, f: impl FnOnce(&mut Self)) {
        self.indent += 1;
        f(self);
        self.indent -= 1;
    }

    fn line(&mut self, line: &str) {
        for _ in 0..self.indent {
            self.output.push_str("    ");
        }
        self.output.push_str(line);
        self.output.push('\n');
    }
}

fn print_params(params: &[Param]) -> String {
    let mut out = String::new();
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        match &param.ty {
            Type::Reference(inner) => {
                let _ = write!(out, "ref {inner} {}", param.name);
            }
            ty => {
                let _ = write!(out, "{ty} {}", param.name);
            }
        }
    }
    out
}

pub fn print_expr(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Int(n) => n.to_string(),
        ExprKind::Float(n) => {
            // Keep a trailing `.0` so the literal still lexes as a
            // float.
            if n.fract() == 0.0 && n.is_finite() {
                format!("{n:.1}")
            } else {
                n.to_string()
            }
        }
        ExprKind::Str(s) => format!("\"{}\"", escape(s)),
        ExprKind::Bool(b) => b.to_string(),

        ExprKind::Var(name) => name.clone(),

        ExprKind::Unary { op, expr } => format!("({op}{})", print_expr(expr)),

        ExprKind::Binary { op, lhs, rhs } => {
            format!("({} {op} {})", print_expr(lhs), print_expr(rhs))
        }

        ExprKind::Call { callee, args } => {
            format!("{}({})", print_expr(callee), print_exprs(args))
        }

        ExprKind::Member { object, property } => {
            format!("{}.{property}", print_expr(object))
        }

        ExprKind::Array(elements) => format!("[{}]", print_exprs(elements)),

        ExprKind::FormatStr { template, args } => {
            format!("\"{}\" % [{}]", escape(template), print_exprs(args))
        }
    }
}

fn print_exprs(exprs: &[Expr]) -> String {
    let mut out = String::new();
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&print_expr(expr));
    }
    out
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            ch => out.push(ch),
        }
    }
    out
}
