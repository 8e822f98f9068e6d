//! Construction of syntax trees with unique node ids.
//!
//! Parsers and tests build trees through [`AstBuilder`] so that every node
//! gets a fresh [`NodeId`]. Methods take `&self`, which lets calls nest:
//!
//! ```
//! use nimble_types::ast::{BinOp, TypeName};
//! use nimble_types::AstBuilder;
//!
//! let b = AstBuilder::new();
//! let sum = b.binary(b.int(1), BinOp::Add, b.int(2));
//! let x = b.var_decl("x", TypeName::Int, Some(sum));
//! let script = b.script(vec![], b.main(vec![x], vec![]));
//! assert_eq!(script.main.body.vars.len(), 1);
//! ```

use std::cell::Cell;

use crate::ast::*;
use crate::Span;

/// Allocates node ids and stamps nodes with the current span.
#[derive(Debug, Default)]
pub struct AstBuilder {
    next_id: Cell<u32>,
    span: Cell<Span>,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the span given to every node built from now on.
    pub fn at(&self, line: u32, col: u32) -> &Self {
        self.span.set(Span::point(line, col));
        self
    }

    /// Number of ids handed out so far.
    pub fn node_count(&self) -> u32 {
        self.next_id.get()
    }

    fn id(&self) -> NodeId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        NodeId(id)
    }

    fn ident(&self, name: &str) -> Ident {
        Ident::new(name, self.span.get())
    }

    fn expr(&self, kind: ExprKind) -> Expr {
        Expr {
            id: self.id(),
            kind,
            span: self.span.get(),
        }
    }

    fn stmt(&self, kind: StmtKind) -> Stmt {
        Stmt {
            id: self.id(),
            kind,
            span: self.span.get(),
        }
    }

    fn block(&self, stmts: Vec<Stmt>) -> Block {
        Block {
            stmts,
            span: self.span.get(),
        }
    }

    // ── Expressions ───────────────────────────────────────────────────────

    pub fn int(&self, value: i64) -> Expr {
        self.expr(ExprKind::IntLit(value))
    }

    pub fn string(&self, value: &str) -> Expr {
        self.expr(ExprKind::StringLit(value.to_string()))
    }

    pub fn boolean(&self, value: bool) -> Expr {
        self.expr(ExprKind::BoolLit(value))
    }

    pub fn paren(&self, inner: Expr) -> Expr {
        self.expr(ExprKind::Paren(Box::new(inner)))
    }

    pub fn unary(&self, op: UnaryOp, operand: Expr) -> Expr {
        self.expr(ExprKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn neg(&self, operand: Expr) -> Expr {
        self.unary(UnaryOp::Neg, operand)
    }

    pub fn not(&self, operand: Expr) -> Expr {
        self.unary(UnaryOp::Not, operand)
    }

    pub fn binary(&self, left: Expr, op: BinOp, right: Expr) -> Expr {
        self.expr(ExprKind::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    pub fn var(&self, name: &str) -> Expr {
        self.expr(ExprKind::Var(name.to_string()))
    }

    pub fn call(&self, callee: &str, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Call {
            callee: self.ident(callee),
            args,
        })
    }

    // ── Statements ────────────────────────────────────────────────────────

    pub fn assign(&self, target: &str, value: Expr) -> Stmt {
        self.stmt(StmtKind::Assign {
            target: self.ident(target),
            value,
        })
    }

    pub fn while_loop(&self, cond: Expr, body: Vec<Stmt>) -> Stmt {
        self.stmt(StmtKind::While {
            cond,
            body: self.block(body),
        })
    }

    pub fn if_stmt(
        &self,
        cond: Expr,
        then_stmts: Vec<Stmt>,
        else_stmts: Option<Vec<Stmt>>,
    ) -> Stmt {
        self.stmt(StmtKind::If {
            cond,
            then_block: self.block(then_stmts),
            else_block: else_stmts.map(|stmts| self.block(stmts)),
        })
    }

    pub fn print(&self, value: Expr) -> Stmt {
        self.stmt(StmtKind::Print(value))
    }

    pub fn ret(&self, value: Option<Expr>) -> Stmt {
        self.stmt(StmtKind::Return(value))
    }

    pub fn call_stmt(&self, callee: &str, args: Vec<Expr>) -> Stmt {
        let call = self.call(callee, args);
        self.stmt(StmtKind::Call(call))
    }

    // ── Declarations ──────────────────────────────────────────────────────

    pub fn var_decl(&self, name: &str, ty: TypeName, init: Option<Expr>) -> VarDecl {
        VarDecl {
            id: self.id(),
            name: self.ident(name),
            ty,
            init,
            span: self.span.get(),
        }
    }

    pub fn param(&self, name: &str, ty: TypeName) -> Param {
        Param {
            id: self.id(),
            name: self.ident(name),
            ty,
            span: self.span.get(),
        }
    }

    pub fn func(
        &self,
        name: &str,
        params: Vec<Param>,
        ret: Option<TypeName>,
        vars: Vec<VarDecl>,
        stmts: Vec<Stmt>,
    ) -> FuncDef {
        FuncDef {
            id: self.id(),
            name: self.ident(name),
            params,
            ret,
            body: Body { vars, stmts },
            span: self.span.get(),
        }
    }

    pub fn main(&self, vars: Vec<VarDecl>, stmts: Vec<Stmt>) -> Main {
        Main {
            id: self.id(),
            body: Body { vars, stmts },
            span: self.span.get(),
        }
    }

    pub fn script(&self, funcs: Vec<FuncDef>, main: Main) -> Script {
        Script {
            id: self.id(),
            funcs,
            main,
            span: self.span.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_sequential() {
        let b = AstBuilder::new();
        let one = b.int(1);
        let two = b.int(2);
        let sum = b.binary(one.clone(), BinOp::Add, two.clone());
        assert_eq!(one.id, NodeId(0));
        assert_eq!(two.id, NodeId(1));
        assert_eq!(sum.id, NodeId(2));
        assert_eq!(b.node_count(), 3);
    }

    #[test]
    fn nested_calls_allocate_inner_first() {
        let b = AstBuilder::new();
        let sum = b.binary(b.int(1), BinOp::Add, b.int(2));
        match sum.kind {
            ExprKind::Binary { left, right, .. } => {
                assert!(left.id < sum.id);
                assert!(right.id < sum.id);
            }
            other => panic!("expected binary, got {other:?}"),
        }
    }

    #[test]
    fn at_sets_span_for_following_nodes() {
        let b = AstBuilder::new();
        let first = b.int(1);
        b.at(4, 9);
        let second = b.int(2);
        assert_eq!(first.span, Span::default());
        assert_eq!(second.span, Span::point(4, 9));
    }

    #[test]
    fn call_stmt_wraps_call_expr() {
        let b = AstBuilder::new();
        let stmt = b.call_stmt("f", vec![b.int(1)]);
        match &stmt.kind {
            StmtKind::Call(expr) => {
                assert!(matches!(
                    &expr.kind,
                    ExprKind::Call { callee, args } if callee.name == "f" && args.len() == 1
                ));
            }
            other => panic!("expected call statement, got {other:?}"),
        }
    }
}
