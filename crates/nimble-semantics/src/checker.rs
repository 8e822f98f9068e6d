//! Pass 2: type inference and constraint checking.
//!
//! Walks the tree again inside the scopes built by Pass 1, computes a type
//! for every expression bottom-up, binds variables at their declarations and
//! checks every statement. Violations are logged and the offending node is
//! typed [`Type::Error`]; an `Error` operand is never reported again by the
//! construct that consumes it.
//!
//! Errors emitted:
//! - `UNDEFINED_NAME`: unresolved variable, assignment target or callee
//! - `INVALID_NEGATION`: `-` on non-Int, `!` on non-Bool
//! - `INVALID_BINARY_OP`: operand types outside the operator table
//! - `INVALID_ASSIGNMENT`: initializer/assignment mismatch, non-variable target
//! - `INVALID_CONDITION`: non-Bool `if` / `while` condition
//! - `DUPLICATE_DECLARATION`: variable declared twice in one scope
//! - `INVALID_RETURN`: return outside a function, or wrong return type
//! - `ARGUMENT_MISMATCH`: wrong argument count or argument type
//! - `INVALID_CALL`: calling a variable, naming a function without calling
//!   it, or using the result of a Void function as a value

use std::collections::{BTreeMap, BTreeSet};

use nimble_types::ast::*;
use nimble_types::{Category, Span};

use crate::report::Reporter;
use crate::scope::{ScopeId, ScopeTable, Symbol, MAIN_SCOPE};
use crate::ty::{Type, TypeMap};

// ══════════════════════════════════════════════════════════════════════════════
// TypeChecker
// ══════════════════════════════════════════════════════════════════════════════

pub(crate) struct TypeChecker<'a, 'src> {
    scopes: &'a mut ScopeTable,
    node_scopes: &'a BTreeMap<NodeId, ScopeId>,
    /// Declarations Pass 1 refused because their name was taken.
    rejected: &'a BTreeSet<NodeId>,
    reporter: &'a mut Reporter<'src>,
    types: TypeMap,
}

impl<'a, 'src> TypeChecker<'a, 'src> {
    pub(crate) fn new(
        scopes: &'a mut ScopeTable,
        node_scopes: &'a BTreeMap<NodeId, ScopeId>,
        rejected: &'a BTreeSet<NodeId>,
        reporter: &'a mut Reporter<'src>,
    ) -> Self {
        Self {
            scopes,
            node_scopes,
            rejected,
            reporter,
            types: TypeMap::new(),
        }
    }

    /// Type-check a complete script.
    #[tracing::instrument(skip_all)]
    pub(crate) fn check(mut self, script: &Script) -> TypeMap {
        let errors_before = self.reporter.len();
        self.scopes.enter(self.scopes.root());

        for func in &script.funcs {
            self.check_func(func);
        }
        self.check_main(&script.main);
        self.types.set(script.id, Type::Void);

        tracing::debug!(
            nodes = self.types.len(),
            errors = self.reporter.len() - errors_before,
            "types inferred"
        );
        self.types
    }

    // ══════════════════════════════════════════════════════════════════════
    // Program structure
    // ══════════════════════════════════════════════════════════════════════

    /// Re-enter the scope Pass 1 created for `node`.
    fn enter_scope_of(&mut self, node: NodeId, name: &str) -> bool {
        let scope = self
            .node_scopes
            .get(&node)
            .copied()
            .or_else(|| self.scopes.child_scope_named(name));
        match scope {
            Some(id) => {
                self.scopes.enter(id);
                true
            }
            None => {
                tracing::warn!(%node, name, "no scope recorded, checking in enclosing scope");
                false
            }
        }
    }

    fn check_func(&mut self, func: &FuncDef) {
        let entered = self.enter_scope_of(func.id, &func.name.name);

        let mut params = Vec::with_capacity(func.params.len());
        for param in &func.params {
            let ty = Type::from_name(param.ty);
            params.push(ty.clone());
            let node_ty = if self.rejected.contains(&param.id) {
                Type::Error
            } else {
                ty
            };
            self.types.set(param.id, node_ty);
        }

        self.check_body(&func.body);

        let signature = if self.rejected.contains(&func.id) {
            Type::Error
        } else {
            Type::function(params, Type::from_return(func.ret))
        };
        self.types.set(func.id, signature);

        if entered {
            self.scopes.exit_scope();
        }
    }

    fn check_main(&mut self, main: &Main) {
        let entered = match self.scopes.child_scope_named(MAIN_SCOPE) {
            Some(id) => {
                self.scopes.enter(id);
                true
            }
            None => self.enter_scope_of(main.id, MAIN_SCOPE),
        };

        self.check_body(&main.body);
        self.types.set(main.id, Type::Void);

        if entered {
            self.scopes.exit_scope();
        }
    }

    fn check_body(&mut self, body: &Body) {
        for decl in &body.vars {
            self.check_var_decl(decl);
        }
        for stmt in &body.stmts {
            self.check_stmt(stmt);
        }
    }

    fn check_block(&mut self, block: &Block) {
        for stmt in &block.stmts {
            self.check_stmt(stmt);
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Variable declarations
    // ══════════════════════════════════════════════════════════════════════

    fn check_var_decl(&mut self, decl: &VarDecl) {
        let declared = Type::from_name(decl.ty);
        // The initializer is typed before the name is bound.
        let init_ty = decl.init.as_ref().map(|init| self.check_expr(init));

        let mut ty = declared.clone();

        if let Err(existing) = self
            .scopes
            .define(&decl.name.name, Symbol::Variable(declared.clone()))
        {
            self.error(
                Category::DuplicateDeclaration,
                format!(
                    "'{}' is already declared in this scope as {}",
                    decl.name.name,
                    existing.ty()
                ),
                decl.id,
                decl.name.span,
            );
            ty = Type::Error;
        }

        if let (Some(init), Some(init_ty)) = (&decl.init, init_ty) {
            if !init_ty.is_error() && init_ty != declared {
                self.error(
                    Category::InvalidAssignment,
                    format!(
                        "cannot initialize '{}' of type {} with a value of type {}",
                        decl.name.name, declared, init_ty
                    ),
                    decl.id,
                    init.span,
                );
                ty = Type::Error;
            }
        }

        self.types.set(decl.id, ty);
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════

    fn check_stmt(&mut self, stmt: &Stmt) {
        let ty = match &stmt.kind {
            StmtKind::Assign { target, value } => {
                self.check_assignment(stmt.id, target, value)
            }
            StmtKind::While { cond, body } => {
                let cond_ok = self.check_condition(stmt.id, "while", cond);
                self.check_block(body);
                if cond_ok {
                    Type::Void
                } else {
                    Type::Error
                }
            }
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => {
                let cond_ok = self.check_condition(stmt.id, "if", cond);
                self.check_block(then_block);
                if let Some(else_block) = else_block {
                    self.check_block(else_block);
                }
                if cond_ok {
                    Type::Void
                } else {
                    Type::Error
                }
            }
            StmtKind::Print(value) => {
                if self.check_expr(value).is_error() {
                    Type::Error
                } else {
                    Type::Void
                }
            }
            StmtKind::Return(value) => {
                self.check_return(stmt.id, stmt.span, value.as_ref())
            }
            StmtKind::Call(call) => self.check_call_stmt(call),
        };
        self.types.set(stmt.id, ty);
    }

    fn check_assignment(&mut self, node: NodeId, target: &Ident, value: &Expr) -> Type {
        let value_ty = self.check_expr(value);

        match self.scopes.resolve(&target.name).cloned() {
            None => {
                self.error(
                    Category::UndefinedName,
                    format!("'{}' is undefined", target.name),
                    node,
                    target.span,
                );
                Type::Error
            }
            Some(Symbol::Function(_)) => {
                self.error(
                    Category::InvalidAssignment,
                    format!(
                        "cannot assign to '{}': it is a function, not a variable",
                        target.name
                    ),
                    node,
                    target.span,
                );
                Type::Error
            }
            Some(Symbol::Variable(declared)) => {
                if value_ty.is_error() {
                    Type::Error
                } else if value_ty != declared {
                    self.error(
                        Category::InvalidAssignment,
                        format!(
                            "cannot assign a value of type {} to '{}' of type {}",
                            value_ty, target.name, declared
                        ),
                        node,
                        value.span,
                    );
                    Type::Error
                } else {
                    Type::Void
                }
            }
        }
    }

    /// Check an `if` / `while` condition; `false` when it is not a valid Bool.
    fn check_condition(&mut self, node: NodeId, keyword: &str, cond: &Expr) -> bool {
        let ty = self.check_expr(cond);
        if ty.is_error() {
            return false;
        }
        if ty != Type::Bool {
            self.error(
                Category::InvalidCondition,
                format!("{} condition must be Bool, got {}", keyword, ty),
                node,
                cond.span,
            );
            return false;
        }
        true
    }

    fn check_return(&mut self, node: NodeId, span: Span, value: Option<&Expr>) -> Type {
        let value_ty = match value {
            Some(expr) => self.check_expr(expr),
            None => Type::Void,
        };

        let Some(function) = self.scopes.enclosing_function() else {
            self.error(
                Category::InvalidReturn,
                "return is only allowed inside a function".to_string(),
                node,
                span,
            );
            return Type::Error;
        };
        let (name, expected) = (function.name.clone(), function.return_type.clone());

        if value_ty.is_error() {
            return Type::Error;
        }
        if value_ty != expected {
            let message = match value {
                Some(_) => format!(
                    "function '{}' returns {}, but the returned value has type {}",
                    name, expected, value_ty
                ),
                None => format!(
                    "function '{}' must return a value of type {}",
                    name, expected
                ),
            };
            self.error(Category::InvalidReturn, message, node, span);
            return Type::Error;
        }
        Type::Void
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════

    /// Compute, record and return the type of `expr`.
    fn check_expr(&mut self, expr: &Expr) -> Type {
        let ty = self.infer_expr(expr);
        self.types.set(expr.id, ty.clone());
        ty
    }

    fn infer_expr(&mut self, expr: &Expr) -> Type {
        match &expr.kind {
            ExprKind::IntLit(_) => Type::Int,
            ExprKind::StringLit(_) => Type::String,
            ExprKind::BoolLit(_) => Type::Bool,
            ExprKind::Paren(inner) => self.check_expr(inner),
            ExprKind::Unary { op, operand } => {
                let operand_ty = self.check_expr(operand);
                self.check_unary(expr, *op, operand_ty)
            }
            ExprKind::Binary { left, op, right } => {
                let left_ty = self.check_expr(left);
                let right_ty = self.check_expr(right);
                self.check_binary(expr, *op, left_ty, right_ty)
            }
            ExprKind::Var(name) => match self.scopes.resolve(name).cloned() {
                Some(Symbol::Variable(ty)) => ty,
                Some(Symbol::Function(ty)) => {
                    self.error(
                        Category::InvalidCall,
                        format!(
                            "function '{}' of type {} must be called to be used",
                            name, ty
                        ),
                        expr.id,
                        expr.span,
                    );
                    Type::Error
                }
                None => {
                    self.error(
                        Category::UndefinedName,
                        format!("'{}' is undefined", name),
                        expr.id,
                        expr.span,
                    );
                    Type::Error
                }
            },
            ExprKind::Call { callee, args } => {
                let returns = self.check_call(expr, callee, args);
                self.require_value(expr, callee, returns)
            }
        }
    }

    /// A call used as a statement may return anything, Void included.
    fn check_call_stmt(&mut self, call: &Expr) -> Type {
        let ty = match &call.kind {
            ExprKind::Call { callee, args } => self.check_call(call, callee, args),
            _ => self.infer_expr(call),
        };
        self.types.set(call.id, ty.clone());
        ty
    }

    /// Only value-producing calls may appear inside expressions.
    fn require_value(&mut self, expr: &Expr, callee: &Ident, returns: Type) -> Type {
        if returns == Type::Void {
            self.error(
                Category::InvalidCall,
                format!("'{}' returns no value", callee.name),
                expr.id,
                expr.span,
            );
            return Type::Error;
        }
        returns
    }

    fn check_unary(&mut self, expr: &Expr, op: UnaryOp, operand: Type) -> Type {
        match (op, &operand) {
            (_, Type::Error) => Type::Error,
            (UnaryOp::Neg, Type::Int) => Type::Int,
            (UnaryOp::Not, Type::Bool) => Type::Bool,
            _ => {
                self.error(
                    Category::InvalidNegation,
                    format!("cannot apply '{}' to {}", op, operand),
                    expr.id,
                    expr.span,
                );
                Type::Error
            }
        }
    }

    fn check_binary(
        &mut self,
        expr: &Expr,
        op: BinOp,
        left: Type,
        right: Type,
    ) -> Type {
        if left.is_error() || right.is_error() {
            return Type::Error;
        }
        match binary_result(op, &left, &right) {
            Some(ty) => ty,
            None => {
                self.error(
                    Category::InvalidBinaryOp,
                    format!("cannot apply '{}' to {} and {}", op, left, right),
                    expr.id,
                    expr.span,
                );
                Type::Error
            }
        }
    }

    fn check_call(&mut self, expr: &Expr, callee: &Ident, args: &[Expr]) -> Type {
        let arg_types: Vec<Type> = args.iter().map(|arg| self.check_expr(arg)).collect();

        let (params, returns) = match self.scopes.resolve(&callee.name).cloned() {
            Some(Symbol::Function(Type::Function { params, returns })) => (params, *returns),
            Some(symbol) => {
                self.error(
                    Category::InvalidCall,
                    format!(
                        "'{}' is a variable of type {}, not a function",
                        callee.name,
                        symbol.ty()
                    ),
                    expr.id,
                    callee.span,
                );
                return Type::Error;
            }
            None => {
                self.error(
                    Category::UndefinedName,
                    format!("function '{}' is undefined", callee.name),
                    expr.id,
                    callee.span,
                );
                return Type::Error;
            }
        };

        if params.len() != arg_types.len() {
            self.error(
                Category::ArgumentMismatch,
                format!(
                    "'{}' expects {} argument{}, got {}",
                    callee.name,
                    params.len(),
                    if params.len() == 1 { "" } else { "s" },
                    arg_types.len()
                ),
                expr.id,
                expr.span,
            );
            return Type::Error;
        }

        let mut mismatched = false;
        let checked = params.iter().zip(&arg_types).zip(args).enumerate();
        for (i, ((param, arg_ty), arg)) in checked {
            if arg_ty.is_error() || arg_ty == param {
                continue;
            }
            self.error(
                Category::ArgumentMismatch,
                format!(
                    "argument {} of '{}' must be {}, got {}",
                    i + 1,
                    callee.name,
                    param,
                    arg_ty
                ),
                expr.id,
                arg.span,
            );
            mismatched = true;
        }

        if mismatched {
            Type::Error
        } else {
            returns
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Error Reporting
    // ══════════════════════════════════════════════════════════════════════

    fn error(&mut self, category: Category, message: String, node: NodeId, span: Span) {
        self.reporter.error(category, message, node, span);
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// Result type of a binary operator, or `None` when the operands are invalid.
pub fn binary_result(op: BinOp, left: &Type, right: &Type) -> Option<Type> {
    match (op, left, right) {
        (BinOp::Mul | BinOp::Div | BinOp::Sub, Type::Int, Type::Int) => Some(Type::Int),
        (BinOp::Add, Type::Int, Type::Int) => Some(Type::Int),
        (BinOp::Add, Type::String, Type::String) => Some(Type::String),
        (BinOp::Eq, Type::Int, Type::Int) | (BinOp::Eq, Type::Bool, Type::Bool) => {
            Some(Type::Bool)
        }
        (BinOp::Lt | BinOp::Le, Type::Int, Type::Int) => Some(Type::Bool),
        _ => None,
    }
}
