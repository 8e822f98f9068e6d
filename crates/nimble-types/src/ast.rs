//! Syntax tree for the Nimble language.
//!
//! Every node carries a [`NodeId`], unique within one tree, and a [`Span`].
//! Semantic analysis keys its results (types, scopes, diagnostics) by
//! `NodeId`; the tree itself is never mutated after parsing.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Span;

/// Identity of a node within one syntax tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

/// A complete program: function definitions followed by `main`.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub id: NodeId,
    pub funcs: Vec<FuncDef>,
    pub main: Main,
    pub span: Span,
}

/// `func name(params) [-> Type] { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDef {
    pub id: NodeId,
    pub name: Ident,
    pub params: Vec<Param>,
    /// `None` when the function returns nothing.
    pub ret: Option<TypeName>,
    pub body: Body,
    pub span: Span,
}

/// A parameter: `name: Type`
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub id: NodeId,
    pub name: Ident,
    pub ty: TypeName,
    pub span: Span,
}

/// The entry block of the script.
#[derive(Debug, Clone, PartialEq)]
pub struct Main {
    pub id: NodeId,
    pub body: Body,
    pub span: Span,
}

/// Variable declarations followed by statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub vars: Vec<VarDecl>,
    pub stmts: Vec<Stmt>,
}

/// `{ statements... }` under `if` / `while`.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// The primitive type names that may appear in source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeName {
    Int,
    String,
    Bool,
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeName::Int => write!(f, "Int"),
            TypeName::String => write!(f, "String"),
            TypeName::Bool => write!(f, "Bool"),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Declarations & Statements
// ══════════════════════════════════════════════════════════════════════════════

/// `var name: Type [= init]`
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub id: NodeId,
    pub name: Ident,
    pub ty: TypeName,
    pub init: Option<Expr>,
    pub span: Span,
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub id: NodeId,
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `name = expr`
    Assign { target: Ident, value: Expr },
    /// `while cond { ... }`
    While { cond: Expr, body: Block },
    /// `if cond { ... } [else { ... }]`
    If {
        cond: Expr,
        then_block: Block,
        else_block: Option<Block>,
    },
    /// `print expr`
    Print(Expr),
    /// `return [expr]`
    Return(Option<Expr>),
    /// A call evaluated for its effect.
    Call(Expr),
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    IntLit(i64),
    StringLit(String),
    BoolLit(bool),
    /// `(expr)`
    Paren(Box<Expr>),
    /// `-x`, `!x`
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// A variable (or function name) reference.
    Var(String),
    /// `f(args...)`
    Call { callee: Ident, args: Vec<Expr> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `!`
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Mul,
    Div,
    Add,
    Sub,
    Eq,
    Lt,
    Le,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Eq => "==",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
