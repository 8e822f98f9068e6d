//! Pass 1: scope and symbol construction.
//!
//! Creates the scope tree (global, one scope per function, `main`) and
//! registers every function signature in the global scope before any body
//! is checked, so calls may refer to functions defined later in the script
//! and functions may call themselves. Parameters are bound in their
//! function's scope here as well.
//!
//! Errors emitted:
//! - `DUPLICATE_DECLARATION`: function or parameter name reused in one scope

use std::collections::{BTreeMap, BTreeSet};

use nimble_types::ast::{FuncDef, Main, NodeId, Script};
use nimble_types::Category;

use crate::report::Reporter;
use crate::scope::{ScopeId, ScopeKind, ScopeTable, Symbol, GLOBAL_SCOPE, MAIN_SCOPE};
use crate::ty::Type;

/// Everything Pass 1 hands to Pass 2.
#[derive(Debug)]
pub struct Symbols {
    pub scopes: ScopeTable,
    /// Scope introduced by each script, function and main node.
    pub node_scopes: BTreeMap<NodeId, ScopeId>,
    /// Function and parameter nodes whose names were already taken.
    pub rejected: BTreeSet<NodeId>,
}

pub(crate) struct ScopeBuilder<'r, 'src> {
    scopes: ScopeTable,
    node_scopes: BTreeMap<NodeId, ScopeId>,
    rejected: BTreeSet<NodeId>,
    reporter: &'r mut Reporter<'src>,
}

impl<'r, 'src> ScopeBuilder<'r, 'src> {
    pub(crate) fn new(reporter: &'r mut Reporter<'src>) -> Self {
        Self {
            scopes: ScopeTable::new(GLOBAL_SCOPE),
            node_scopes: BTreeMap::new(),
            rejected: BTreeSet::new(),
            reporter,
        }
    }

    #[tracing::instrument(skip_all)]
    pub(crate) fn build(mut self, script: &Script) -> Symbols {
        self.node_scopes.insert(script.id, self.scopes.root());

        for func in &script.funcs {
            self.define_function(func);
        }
        self.define_main(&script.main);

        tracing::debug!(
            scopes = self.scopes.len(),
            functions = script.funcs.len(),
            rejected = self.rejected.len(),
            "scopes built"
        );
        Symbols {
            scopes: self.scopes,
            node_scopes: self.node_scopes,
            rejected: self.rejected,
        }
    }

    fn define_function(&mut self, func: &FuncDef) {
        let params: Vec<Type> = func
            .params
            .iter()
            .map(|p| Type::from_name(p.ty))
            .collect();
        let ret = Type::from_return(func.ret);
        let signature = Type::function(params, ret.clone());

        // Signature goes into the enclosing scope before the body scope exists.
        let defined = self
            .scopes
            .define(&func.name.name, Symbol::Function(signature));
        let scope_name = match defined {
            Ok(()) => func.name.name.clone(),
            Err(existing) => {
                self.reporter.error(
                    Category::DuplicateDeclaration,
                    format!(
                        "'{}' is already declared in this scope as {}",
                        func.name.name,
                        existing.ty()
                    ),
                    func.id,
                    func.name.span,
                );
                self.rejected.insert(func.id);
                // The body is still checked, in a scope of its own.
                format!("{}#{}", func.name.name, func.id.0)
            }
        };

        let scope = self
            .scopes
            .create_child_scope(scope_name, ScopeKind::Function, ret);
        tracing::debug!(function = %func.name.name, ?scope, "entered function scope");
        self.node_scopes.insert(func.id, scope);

        for param in &func.params {
            let ty = Type::from_name(param.ty);
            let defined = self.scopes.define(&param.name.name, Symbol::Variable(ty));
            if let Err(existing) = defined {
                self.reporter.error(
                    Category::DuplicateDeclaration,
                    format!(
                        "parameter '{}' is already declared as {}",
                        param.name.name,
                        existing.ty()
                    ),
                    param.id,
                    param.name.span,
                );
                self.rejected.insert(param.id);
            }
        }

        self.scopes.exit_scope();
    }

    fn define_main(&mut self, main: &Main) {
        let scope = self
            .scopes
            .create_child_scope(MAIN_SCOPE, ScopeKind::Main, Type::Void);
        self.node_scopes.insert(main.id, scope);
        self.scopes.exit_scope();
    }
}
