//! Lowering a merged program to C source text.
//!
//! Generation runs in two passes. The first collects every function
//! and extern signature so calls can be resolved (and reference
//! parameters rewritten) regardless of declaration order; the second
//! emits declarations, globals and bodies. Runtime helpers are
//! recorded as bodies reference them, and only those end up in the
//! output.

use std::collections::{BTreeSet, HashMap};

use thor_frontend::ast::*;
use thor_frontend::{ResolvedModule, ResolvedProgram};
use thor_session::diagnostics::{Diagnostic, IntoDiagnostic};

use crate::runtime::Helper;

#[derive(thiserror::Error, Debug)]
pub enum CodegenError {
    #[error("format string expects {expected} arguments, found {found}")]
    FormatArityMismatch {
        expected: usize,
        found: usize,
        line: u32,
    },

    #[error("cannot determine the type of this format argument")]
    UnknownType { line: u32 },

    #[error("{builtin} expects {expected} argument(s), found {found}")]
    BuiltinArity {
        builtin: &'static str,
        expected: usize,
        found: usize,
        line: u32,
    },

    /// An AST shape that earlier stages should have rejected.
    #[error("internal invariant violated during code generation: {message}")]
    InternalInvariant { message: String },

    /// Valid syntax with no C lowering, such as member access on a
    /// value or a call whose target is itself an expression.
    #[error("unsupported construct: {construct}")]
    Unsupported { construct: &'static str, line: u32 },
}

impl IntoDiagnostic<()> for CodegenError {
    fn into_diagnostic(self, &(): &()) -> Diagnostic {
        let line = match &self {
            CodegenError::FormatArityMismatch { line, .. }
            | CodegenError::UnknownType { line }
            | CodegenError::BuiltinArity { line, .. }
            | CodegenError::Unsupported { line, .. } => Some(*line),
            CodegenError::InternalInvariant { .. } => None,
        };

        let mut diagnostic = Diagnostic::error(self.to_string());
        if let Some(line) = line {
            diagnostic = diagnostic.with_line(line);
        }
        diagnostic
    }
}

fn invariant(message: impl Into<String>) -> CodegenError {
    CodegenError::InternalInvariant {
        message: message.into(),
    }
}

/// A generated translation unit. The helper set is exposed so callers
/// can see which runtime shims were synthesized.
#[derive(Debug, Clone)]
pub struct CUnit {
    pub source: String,
    pub helpers: BTreeSet<Helper>,
}

pub fn generate(program: &ResolvedProgram) -> Result<CUnit, CodegenError> {
    Codegen::new(program).run(program)
}

const PREAMBLE: &str = "#include <stdio.h>\n\
                        #include <stdlib.h>\n\
                        #include <string.h>\n\
                        #include <stdarg.h>\n";

/// How a value formats and compares; coarser than [`Type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Str,
    Int,
    Float,
    Bool,
}

#[derive(Clone)]
struct FuncInfo {
    c_name: String,
    params: Vec<Type>,
    ret: Type,
}

struct ModuleFuncs {
    /// Import name; `None` for the main program.
    key: Option<String>,
    package: Option<String>,
    funcs: HashMap<String, FuncInfo>,
}

impl ModuleFuncs {
    fn matches(&self, path: &str) -> bool {
        self.key.as_deref() == Some(path) || self.package.as_deref() == Some(path)
    }
}

struct FuncTable {
    /// Indexed in step with the resolved program's modules.
    modules: Vec<ModuleFuncs>,
}

enum BuiltinFn {
    Println,
    Print,
    Input,
}

fn builtin_fn(name: &str) -> Option<BuiltinFn> {
    let name = name.strip_prefix("std::io::").unwrap_or(name);
    match name {
        "println" => Some(BuiltinFn::Println),
        "print" => Some(BuiltinFn::Print),
        "input" => Some(BuiltinFn::Input),
        _ => None,
    }
}

struct Codegen {
    table: FuncTable,
    helpers: BTreeSet<Helper>,

    decls: String,
    globals: String,
    bodies: String,

    indent: usize,
    scopes: Vec<HashMap<String, Type>>,
    current_module: usize,
}

impl Codegen {
    fn new(program: &ResolvedProgram) -> Self {
        Self {
            table: collect_signatures(program),
            helpers: BTreeSet::new(),

            decls: String::new(),
            globals: String::new(),
            bodies: String::new(),

            indent: 0,
            // The global scope.
            scopes: vec![HashMap::new()],
            current_module: 0,
        }
    }

    fn run(mut self, program: &ResolvedProgram) -> Result<CUnit, CodegenError> {
        // Globals first so every function body can see them.
        for (index, module) in program.modules.iter().enumerate() {
            if module.builtin {
                continue;
            }
            self.current_module = index;
            self.emit_globals(module)?;
        }

        for (index, module) in program.modules.iter().enumerate() {
            if module.builtin {
                continue;
            }
            self.current_module = index;
            self.emit_module(module)?;
        }

        let mut source = String::from(PREAMBLE);
        source.push('\n');

        for helper in &self.helpers {
            source.push_str(helper.source());
            source.push('\n');
        }

        if !self.decls.is_empty() {
            source.push_str(&self.decls);
            source.push('\n');
        }

        if !self.globals.is_empty() {
            source.push_str(&self.globals);
            source.push('\n');
        }

        source.push_str(&self.bodies);

        Ok(CUnit {
            source,
            helpers: self.helpers,
        })
    }

    fn emit_globals(&mut self, module: &ResolvedModule) -> Result<(), CodegenError> {
        for stmt in &module.statements {
            match stmt {
                Stmt::VarDecl { name, ty, init } => {
                    let code = self.var_decl_code(name, ty, init.as_ref(), false)?;
                    self.globals.push_str(&code);
                    self.globals.push('\n');
                    self.declare(name, ty);
                }

                Stmt::ConstDecl { name, ty, init } => {
                    let code = self.var_decl_code(name, ty, Some(init), true)?;
                    self.globals.push_str(&code);
                    self.globals.push('\n');
                    self.declare(name, ty);
                }

                _ => {}
            }
        }
        Ok(())
    }

    fn emit_module(&mut self, module: &ResolvedModule) -> Result<(), CodegenError> {
        for stmt in &module.statements {
            match stmt {
                // Globals were emitted up front.
                Stmt::VarDecl { .. } | Stmt::ConstDecl { .. } => {}

                Stmt::Func(func) => {
                    let info = self.table.modules[self.current_module]
                        .funcs
                        .get(&func.name)
                        .cloned()
                        .ok_or_else(|| invariant("function missing from signature table"))?;

                    let header = self.func_header(&info.c_name, &func.params, &func.ret)?;
                    self.decls.push_str(&header);
                    self.decls.push_str(";\n");

                    self.emit_func(func, &header)?;
                }

                Stmt::Extern { name, params, ret } => {
                    let header = self.func_header(name, params, ret)?;
                    self.decls.push_str("extern ");
                    self.decls.push_str(&header);
                    self.decls.push_str(";\n");
                }

                stmt => {
                    return Err(invariant(format!(
                        "statement outside a function: {}",
                        stmt_name(stmt)
                    )))
                }
            }
        }
        Ok(())
    }

    fn func_header(
        &mut self,
        c_name: &str,
        params: &[Param],
        ret: &Type,
    ) -> Result<String, CodegenError> {
        let params = if params.is_empty() {
            "void".to_owned()
        } else {
            let mut out = String::new();
            for (i, param) in params.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&lower_type(&param.ty)?);
                out.push(' ');
                out.push_str(&param.name);
            }
            out
        };

        Ok(format!("{} {c_name}({params})", lower_type(ret)?))
    }

    fn emit_func(&mut self, func: &FuncDecl, header: &str) -> Result<(), CodegenError> {
        let Some(body) = &func.body else {
            // A bodyless declaration; its prototype already went out.
            return Ok(());
        };

        self.push_scope();
        for param in &func.params {
            self.declare(&param.name, &param.ty);
        }

        self.line(&format!("{header} {{"));
        self.indent += 1;
        for stmt in body {
            self.emit_stmt(stmt)?;
        }
        self.indent -= 1;
        self.line("}");
        self.line("");

        self.pop_scope();
        Ok(())
    }

    fn emit_stmt(&mut self, stmt: &Stmt) -> Result<(), CodegenError> {
        match stmt {
            Stmt::Expr(expr) => {
                // An assignment at statement position reads as plain
                // C, without the parentheses nested ones keep.
                let code = match &expr.kind {
                    ExprKind::Binary {
                        op: BinOp::Assign,
                        lhs,
                        rhs,
                    } => format!("{} = {}", self.expr(lhs)?, self.expr(rhs)?),

                    _ => self.expr(expr)?,
                };
                self.line(&format!("{code};"));
            }

            Stmt::VarDecl { name, ty, init } => {
                let code = self.var_decl_code(name, ty, init.as_ref(), false)?;
                self.line(&code);
                self.declare(name, ty);
            }

            Stmt::ConstDecl { name, ty, init } => {
                let code = self.var_decl_code(name, ty, Some(init), true)?;
                self.line(&code);
                self.declare(name, ty);
            }

            Stmt::Block(statements) => {
                self.line("{");
                self.push_scope();
                self.indent += 1;
                for stmt in statements {
                    self.emit_stmt(stmt)?;
                }
                self.indent -= 1;
                self.pop_scope();
                self.line("}");
            }

            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.expr(cond)?;
                self.line(&format!("if ({cond}) {{"));
                self.emit_branch(then_branch)?;
                match else_branch {
                    Some(else_branch) => {
                        self.line("} else {");
                        self.emit_branch(else_branch)?;
                        self.line("}");
                    }
                    None => self.line("}"),
                }
            }

            Stmt::While { cond, body } => {
                let cond = self.expr(cond)?;
                self.line(&format!("while ({cond}) {{"));
                self.emit_branch(body)?;
                self.line("}");
            }

            Stmt::Return(value) => match value {
                Some(value) => {
                    let value = self.expr(value)?;
                    self.line(&format!("return {value};"));
                }
                None => self.line("return;"),
            },

            Stmt::Func(_) | Stmt::Extern { .. } => {
                return Err(invariant("nested function declaration"));
            }
        }
        Ok(())
    }

    /// Emits a branch body that the caller has already wrapped in
    /// braces, so single-statement branches stay brace-balanced.
    fn emit_branch(&mut self, stmt: &Stmt) -> Result<(), CodegenError> {
        self.push_scope();
        self.indent += 1;

        match stmt {
            Stmt::Block(statements) => {
                for stmt in statements {
                    self.emit_stmt(stmt)?;
                }
            }
            stmt => self.emit_stmt(stmt)?,
        }

        self.indent -= 1;
        self.pop_scope();
        Ok(())
    }

    fn var_decl_code(
        &mut self,
        name: &str,
        ty: &Type,
        init: Option<&Expr>,
        is_const: bool,
    ) -> Result<String, CodegenError> {
        let prefix = if is_const { "const " } else { "" };

        // An array initializer uses C's brace syntax directly; other
        // positions go through `array_literal`.
        if let (Type::Array(elem), Some(init)) = (ty, init) {
            if let ExprKind::Array(items) = &init.kind {
                let elem = lower_type(elem)?;
                let mut values = String::new();
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        values.push_str(", ");
                    }
                    values.push_str(&self.expr(item)?);
                }
                return Ok(format!("{prefix}{elem} {name}[] = {{{values}}};"));
            }
        }

        let ty = lower_type(ty)?;
        Ok(match init {
            Some(init) => format!("{prefix}{ty} {name} = {};", self.expr(init)?),
            None => format!("{prefix}{ty} {name};"),
        })
    }

    fn expr(&mut self, expr: &Expr) -> Result<String, CodegenError> {
        match &expr.kind {
            ExprKind::Int(n) => Ok(n.to_string()),
            ExprKind::Float(n) => Ok(float_literal(*n)),
            ExprKind::Str(s) => Ok(c_string(s)),
            ExprKind::Bool(b) => Ok(if *b { "1" } else { "0" }.to_owned()),

            ExprKind::Var(name) => Ok(self.var(name)),

            ExprKind::Unary { op, expr } => Ok(format!("({op}{})", self.expr(expr)?)),

            ExprKind::Binary { op, lhs, rhs } => self.binary(*op, lhs, rhs),

            ExprKind::Call { callee, args } => self.call(expr.line, callee, args),

            ExprKind::Member { .. } => Err(CodegenError::Unsupported {
                construct: "member access",
                line: expr.line,
            }),

            ExprKind::Array(items) => self.array_literal(items, expr.line),

            ExprKind::FormatStr { template, args } => {
                self.format_call(template, args, expr.line)
            }
        }
    }

    fn var(&self, name: &str) -> String {
        if name.contains("::") {
            // A qualified name in value position refers to a function.
            return match self.resolve_call(name) {
                Some(info) => info.c_name,
                None => sanitize(name),
            };
        }

        // Reference parameters read and write through the pointer.
        match self.lookup(name) {
            Some(Type::Reference(_)) => format!("(*{name})"),
            _ => name.to_owned(),
        }
    }

    /// An array literal in expression position becomes a compound
    /// literal. The element type comes from the first element, so an
    /// empty literal has nowhere to take it from.
    fn array_literal(&mut self, items: &[Expr], line: u32) -> Result<String, CodegenError> {
        let elem = match items.first().and_then(|item| self.infer(item)) {
            Some(ValueKind::Int | ValueKind::Bool) => "int",
            Some(ValueKind::Float) => "float",
            Some(ValueKind::Str) => "char*",
            None => {
                return Err(CodegenError::Unsupported {
                    construct: "an array literal with no inferable element type",
                    line,
                })
            }
        };

        let mut values = String::new();
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                values.push_str(", ");
            }
            values.push_str(&self.expr(item)?);
        }

        Ok(format!("({elem}[]){{{values}}}"))
    }

    fn binary(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr) -> Result<String, CodegenError> {
        // String comparison is by content, never by pointer.
        if matches!(op, BinOp::Eq | BinOp::NotEq) {
            let is_string = self.infer(lhs) == Some(ValueKind::Str)
                || self.infer(rhs) == Some(ValueKind::Str);

            if is_string {
                self.helpers.insert(Helper::StrEq);
                let call = format!("thor_str_eq({}, {})", self.expr(lhs)?, self.expr(rhs)?);
                return Ok(match op {
                    BinOp::Eq => call,
                    _ => format!("!{call}"),
                });
            }
        }

        Ok(format!("({} {op} {})", self.expr(lhs)?, self.expr(rhs)?))
    }

    fn call(&mut self, line: u32, callee: &Expr, args: &[Expr]) -> Result<String, CodegenError> {
        let ExprKind::Var(name) = &callee.kind else {
            return Err(CodegenError::Unsupported {
                construct: "a computed call target",
                line,
            });
        };

        if let Some(builtin) = builtin_fn(name) {
            return self.builtin_call(&builtin, args, line);
        }

        match self.resolve_call(name) {
            Some(info) => {
                let mut lowered = Vec::with_capacity(args.len());
                for (i, arg) in args.iter().enumerate() {
                    if matches!(info.params.get(i), Some(Type::Reference(_))) {
                        lowered.push(self.ref_arg(arg)?);
                    } else {
                        lowered.push(self.expr(arg)?);
                    }
                }
                Ok(format!("{}({})", info.c_name, lowered.join(", ")))
            }

            // Unknown callees go through untouched; the C compiler
            // will complain if they don't exist.
            None => {
                let mut lowered = Vec::with_capacity(args.len());
                for arg in args {
                    lowered.push(self.expr(arg)?);
                }
                Ok(format!("{}({})", sanitize(name), lowered.join(", ")))
            }
        }
    }

    /// An argument bound to a reference parameter: plain variables are
    /// passed by address, reference parameters forward as-is.
    fn ref_arg(&mut self, arg: &Expr) -> Result<String, CodegenError> {
        let ExprKind::Var(name) = &arg.kind else {
            return Err(CodegenError::Unsupported {
                construct: "a non-variable reference argument",
                line: arg.line,
            });
        };

        match self.lookup(name) {
            Some(Type::Reference(_)) => Ok(name.clone()),
            _ => Ok(format!("&{name}")),
        }
    }

    fn builtin_call(
        &mut self,
        builtin: &BuiltinFn,
        args: &[Expr],
        line: u32,
    ) -> Result<String, CodegenError> {
        match builtin {
            BuiltinFn::Input => {
                if args.len() != 1 {
                    return Err(CodegenError::BuiltinArity {
                        builtin: "input",
                        expected: 1,
                        found: args.len(),
                        line,
                    });
                }

                self.helpers.insert(Helper::Input);
                let prompt = self.expr(&args[0])?;
                Ok(format!("thor_input({prompt})"))
            }

            BuiltinFn::Println | BuiltinFn::Print => {
                let (name, helper) = match builtin {
                    BuiltinFn::Println => ("println", Helper::Println),
                    _ => ("print", Helper::Print),
                };

                if args.len() != 1 {
                    return Err(CodegenError::BuiltinArity {
                        builtin: name,
                        expected: 1,
                        found: args.len(),
                        line,
                    });
                }

                self.helpers.insert(helper);

                let arg = &args[0];
                let lowered = match self.infer(arg) {
                    // Unknown kinds are assumed to be strings.
                    Some(ValueKind::Str) | None => self.expr(arg)?,

                    Some(ValueKind::Int | ValueKind::Bool) => {
                        self.helpers.insert(Helper::Format);
                        format!("thor_format(\"%ld\", (long)({}))", self.expr(arg)?)
                    }

                    Some(ValueKind::Float) => {
                        self.helpers.insert(Helper::Format);
                        format!("thor_format(\"%f\", (double)({}))", self.expr(arg)?)
                    }
                };

                Ok(format!("{}({lowered})", helper.symbol()))
            }
        }
    }

    /// Lowers `"template" % [args]` to a `thor_format` call. Each `%s`
    /// placeholder takes the specifier of its argument's inferred
    /// kind; any other `%` is doubled so C's printf sees it literally.
    fn format_call(
        &mut self,
        template: &str,
        args: &[Expr],
        line: u32,
    ) -> Result<String, CodegenError> {
        let expected = count_placeholders(template);
        if expected != args.len() {
            return Err(CodegenError::FormatArityMismatch {
                expected,
                found: args.len(),
                line,
            });
        }

        self.helpers.insert(Helper::Format);

        let mut fmt = String::new();
        let mut lowered = vec![];
        let mut next_arg = 0;

        let mut chars = template.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch != '%' {
                fmt.push(ch);
                continue;
            }

            if chars.peek() == Some(&'s') {
                chars.next();
                let arg = &args[next_arg];
                next_arg += 1;

                match self.infer(arg) {
                    Some(ValueKind::Str) => {
                        fmt.push_str("%s");
                        lowered.push(self.expr(arg)?);
                    }
                    Some(ValueKind::Int | ValueKind::Bool) => {
                        fmt.push_str("%ld");
                        lowered.push(format!("(long)({})", self.expr(arg)?));
                    }
                    Some(ValueKind::Float) => {
                        fmt.push_str("%f");
                        lowered.push(format!("(double)({})", self.expr(arg)?));
                    }
                    None => return Err(CodegenError::UnknownType { line }),
                }
            } else {
                fmt.push_str("%%");
            }
        }

        let mut call = format!("thor_format({}", c_string(&fmt));
        for arg in lowered {
            call.push_str(", ");
            call.push_str(&arg);
        }
        call.push(')');
        Ok(call)
    }

    /// Resolution order: a qualified name picks its module directly;
    /// a bare name tries the current module, then a unique export
    /// from any module.
    fn resolve_call(&self, name: &str) -> Option<FuncInfo> {
        if let Some((module_path, func)) = name.rsplit_once("::") {
            let module_path = module_path.replace("::", ".");
            return self
                .table
                .modules
                .iter()
                .find(|module| module.matches(&module_path))
                .and_then(|module| module.funcs.get(func))
                .cloned();
        }

        if let Some(info) = self.table.modules[self.current_module].funcs.get(name) {
            return Some(info.clone());
        }

        let mut candidates = self
            .table
            .modules
            .iter()
            .filter_map(|module| module.funcs.get(name));

        let first = candidates.next()?;
        candidates.next().is_none().then(|| first.clone())
    }

    fn infer(&self, expr: &Expr) -> Option<ValueKind> {
        match &expr.kind {
            ExprKind::Int(_) => Some(ValueKind::Int),
            ExprKind::Float(_) => Some(ValueKind::Float),
            ExprKind::Str(_) => Some(ValueKind::Str),
            ExprKind::Bool(_) => Some(ValueKind::Bool),

            ExprKind::Var(name) => self.lookup(name).and_then(kind_of_type),

            ExprKind::Unary { op: UnOp::Not, .. } => Some(ValueKind::Bool),
            ExprKind::Unary {
                op: UnOp::Negate,
                expr,
            } => self.infer(expr),

            ExprKind::Binary { op, lhs, rhs } => match op {
                BinOp::Assign => self.infer(rhs),

                BinOp::LogicalOr
                | BinOp::LogicalAnd
                | BinOp::Eq
                | BinOp::NotEq
                | BinOp::Lt
                | BinOp::LtEq
                | BinOp::Gt
                | BinOp::GtEq => Some(ValueKind::Bool),

                BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
                    match (self.infer(lhs), self.infer(rhs)) {
                        (Some(ValueKind::Float), _) | (_, Some(ValueKind::Float)) => {
                            Some(ValueKind::Float)
                        }
                        (Some(_), _) | (_, Some(_)) => Some(ValueKind::Int),
                        (None, None) => None,
                    }
                }
            },

            ExprKind::Call { callee, .. } => {
                let ExprKind::Var(name) = &callee.kind else {
                    return None;
                };
                if let Some(builtin) = builtin_fn(name) {
                    return match builtin {
                        BuiltinFn::Input => Some(ValueKind::Str),
                        _ => None,
                    };
                }
                self.resolve_call(name)
                    .and_then(|info| kind_of_type(&info.ret))
            }

            ExprKind::Member { .. } | ExprKind::Array(_) => None,

            ExprKind::FormatStr { .. } => Some(ValueKind::Str),
        }
    }

    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &str, ty: &Type) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_owned(), ty.clone());
        }
    }

    fn lookup(&self, name: &str) -> Option<&Type> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn line(&mut self, line: &str) {
        if !line.is_empty() {
            for _ in 0..self.indent {
                self.bodies.push_str("    ");
            }
            self.bodies.push_str(line);
        }
        self.bodies.push('\n');
    }
}

fn collect_signatures(program: &ResolvedProgram) -> FuncTable {
    let mut modules = Vec::with_capacity(program.modules.len());

    for module in &program.modules {
        let mut funcs = HashMap::new();

        // Built-in declarations never reach the output; calls to them
        // resolve to runtime helpers instead.
        if !module.builtin {
            let prefix = module
                .name
                .as_deref()
                .map(|name| sanitize(module.package.as_deref().unwrap_or(name)));

            for stmt in &module.statements {
                match stmt {
                    Stmt::Func(func) => {
                        let c_name = match &prefix {
                            Some(prefix) => format!("{prefix}_{}", func.name),
                            None => func.name.clone(),
                        };
                        funcs.insert(
                            func.name.clone(),
                            FuncInfo {
                                c_name,
                                params: func.params.iter().map(|p| p.ty.clone()).collect(),
                                ret: func.ret.clone(),
                            },
                        );
                    }

                    // Externs name C symbols directly; no prefix.
                    Stmt::Extern { name, params, ret } => {
                        funcs.insert(
                            name.clone(),
                            FuncInfo {
                                c_name: name.clone(),
                                params: params.iter().map(|p| p.ty.clone()).collect(),
                                ret: ret.clone(),
                            },
                        );
                    }

                    _ => {}
                }
            }
        }

        modules.push(ModuleFuncs {
            key: module.name.clone(),
            package: module.package.clone(),
            funcs,
        });
    }

    FuncTable { modules }
}

fn lower_type(ty: &Type) -> Result<String, CodegenError> {
    Ok(match ty {
        Type::Void => "void".to_owned(),
        Type::Int => "int".to_owned(),
        Type::Float => "float".to_owned(),
        Type::String => "char*".to_owned(),
        Type::Bool => "int".to_owned(),
        Type::Array(elem) | Type::Reference(elem) => format!("{}*", lower_type(elem)?),
        Type::Function { .. } => {
            return Err(invariant("function types have no C lowering"));
        }
    })
}

fn kind_of_type(ty: &Type) -> Option<ValueKind> {
    match ty {
        Type::Int => Some(ValueKind::Int),
        Type::Float => Some(ValueKind::Float),
        Type::String => Some(ValueKind::Str),
        Type::Bool => Some(ValueKind::Bool),
        Type::Reference(inner) => kind_of_type(inner),
        Type::Void | Type::Array(_) | Type::Function { .. } => None,
    }
}

fn count_placeholders(template: &str) -> usize {
    let mut count = 0;
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '%' && chars.peek() == Some(&'s') {
            chars.next();
            count += 1;
        }
    }
    count
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect()
}

fn c_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
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
    out.push('"');
    out
}

fn float_literal(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{n:.1}")
    } else {
        n.to_string()
    }
}

fn stmt_name(stmt: &Stmt) -> &'static str {
    match stmt {
        Stmt::Expr(_) => "expression",
        Stmt::VarDecl { .. } => "variable declaration",
        Stmt::ConstDecl { .. } => "constant declaration",
        Stmt::Block(_) => "block",
        Stmt::If { .. } => "if",
        Stmt::While { .. } => "while",
        Stmt::Return(_) => "return",
        Stmt::Func(_) => "function",
        Stmt::Extern { .. } => "extern",
    }
}

#[cfg(test)]
mod tests;
