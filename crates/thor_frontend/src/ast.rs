//! The abstract syntax tree produced by parsing.
//!
//! Nodes own their children exclusively; the import resolver moves
//! top-level statements between programs but never mutates a
//! statement's fields. Imports and the package declaration live on
//! [`Program`] itself, so the "imports precede all other statements"
//! invariant holds by construction.

use std::fmt;

use crate::{Node, NodeCopy};

#[derive(Node!, Default)]
pub struct Program {
    pub package: Option<String>,
    pub imports: Vec<Import>,
    pub statements: Vec<Stmt>,
}

#[derive(Node!)]
pub struct Import {
    pub module: String,
    pub line: u32,
}

#[derive(Node!)]
pub enum Stmt {
    Expr(Expr),
    VarDecl {
        name: String,
        ty: Type,
        init: Option<Expr>,
    },
    ConstDecl {
        name: String,
        ty: Type,
        init: Expr,
    },
    Block(Vec<Stmt>),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    Return(Option<Expr>),
    Func(FuncDecl),
    Extern {
        name: String,
        params: Vec<Param>,
        ret: Type,
    },
}

#[derive(Node!)]
pub struct FuncDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub ret: Type,
    /// `None` marks a forward declaration.
    pub body: Option<Vec<Stmt>>,
}

#[derive(Node!)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

#[derive(Node!)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: u32,
}

impl Expr {
    pub fn new(kind: ExprKind, line: u32) -> Self {
        Self { kind, line }
    }
}

#[derive(Node!)]
pub enum ExprKind {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),

    Var(String),

    Unary {
        op: UnOp,
        expr: Box<Expr>,
    },

    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },

    Member {
        object: Box<Expr>,
        property: String,
    },

    Array(Vec<Expr>),

    FormatStr {
        template: String,
        args: Vec<Expr>,
    },
}

#[derive(NodeCopy!)]
pub enum UnOp {
    Not,
    Negate,
}

#[derive(NodeCopy!)]
pub enum BinOp {
    Assign,

    LogicalOr,
    LogicalAnd,

    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl fmt::Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            UnOp::Not => "!",
            UnOp::Negate => "-",
        };
        f.write_str(s)
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            BinOp::Assign => "=",
            BinOp::LogicalOr => "||",
            BinOp::LogicalAnd => "&&",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Lt => "<",
            BinOp::LtEq => "<=",
            BinOp::Gt => ">",
            BinOp::GtEq => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
        };
        f.write_str(s)
    }
}

/// Thor types, compared structurally.
#[derive(Node!)]
pub enum Type {
    Void,
    Int,
    Float,
    String,
    Bool,
    Array(Box<Type>),
    /// An out/in-out parameter; lowered to pointer passing.
    Reference(Box<Type>),
    Function {
        params: Vec<Type>,
        ret: Box<Type>,
    },
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Type::Void => f.write_str("void"),
            Type::Int => f.write_str("int"),
            Type::Float => f.write_str("float"),
            Type::String => f.write_str("string"),
            Type::Bool => f.write_str("bool"),
            Type::Array(elem) => write!(f, "{elem}[]"),
            Type::Reference(elem) => write!(f, "ref {elem}"),
            Type::Function { params, ret } => {
                f.write_str("func(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, ") -> {ret}")
            }
        }
    }
}
