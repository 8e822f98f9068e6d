//! Lexical scope tree with parent-chain name resolution.
//!
//! [`ScopeTable`] owns every scope in an arena; scopes refer to their parent
//! and children by [`ScopeId`]. A cursor tracks the scope the current pass
//! is in. Scopes are never removed, so later phases can inspect the tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ty::Type;

/// Name of the root scope.
pub const GLOBAL_SCOPE: &str = "$global";
/// Name of the scope introduced by `main`.
pub const MAIN_SCOPE: &str = "$main";

// ══════════════════════════════════════════════════════════════════════════════
// Symbols
// ══════════════════════════════════════════════════════════════════════════════

/// A name binding owned by one scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "symbol", content = "type", rename_all = "lowercase")]
pub enum Symbol {
    Variable(Type),
    /// Holds a [`Type::Function`] signature.
    Function(Type),
}

impl Symbol {
    pub fn ty(&self) -> &Type {
        match self {
            Symbol::Variable(ty) | Symbol::Function(ty) => ty,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Scope
// ══════════════════════════════════════════════════════════════════════════════

/// Index of a scope in its [`ScopeTable`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ScopeId(pub usize);

/// The construct that introduced a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    Global,
    Function,
    Main,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scope {
    pub name: String,
    pub kind: ScopeKind,
    /// Type a `return` in this scope must produce.
    pub return_type: Type,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    bindings: BTreeMap<String, Symbol>,
}

impl Scope {
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.bindings.get(name)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// ScopeTable
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeTable {
    scopes: Vec<Scope>,
    #[serde(skip)]
    current: ScopeId,
}

impl ScopeTable {
    /// A table holding only the root scope, which is also current.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            scopes: vec![Scope {
                name: root_name.into(),
                kind: ScopeKind::Global,
                return_type: Type::Void,
                parent: None,
                children: Vec::new(),
                bindings: BTreeMap::new(),
            }],
            current: ScopeId(0),
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    pub fn current_scope(&self) -> &Scope {
        &self.scopes[self.current.0]
    }

    pub fn get(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.0)
    }

    /// Enclosing scope of `id`; `None` for the root or an unknown id.
    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.get(id).and_then(|scope| scope.parent)
    }

    /// Scopes created directly under `id`, in creation order.
    pub fn children(&self, id: ScopeId) -> &[ScopeId] {
        self.get(id)
            .map(|scope| scope.children.as_slice())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScopeId, &Scope)> {
        self.scopes.iter().enumerate().map(|(i, s)| (ScopeId(i), s))
    }

    /// Allocate a scope under the current one and make it current.
    pub fn create_child_scope(
        &mut self,
        name: impl Into<String>,
        kind: ScopeKind,
        return_type: Type,
    ) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            name: name.into(),
            kind,
            return_type,
            parent: Some(self.current),
            children: Vec::new(),
            bindings: BTreeMap::new(),
        });
        self.scopes[self.current.0].children.push(id);
        self.current = id;
        id
    }

    /// Make an existing scope current.
    pub fn enter(&mut self, id: ScopeId) {
        debug_assert!(id.0 < self.scopes.len(), "unknown scope {id:?}");
        self.current = id;
    }

    /// Return to the enclosing scope. The root has no parent and stays put.
    pub fn exit_scope(&mut self) {
        if let Some(parent) = self.parent(self.current) {
            self.current = parent;
        }
    }

    /// A child of the current scope, by name.
    pub fn child_scope_named(&self, name: &str) -> Option<ScopeId> {
        self.children(self.current)
            .iter()
            .copied()
            .find(|&child| self.scopes[child.0].name == name)
    }

    /// Bind `name` in the current scope.
    ///
    /// If the name is already bound in this exact scope the first binding is
    /// kept and returned as the error.
    pub fn define(&mut self, name: &str, symbol: Symbol) -> Result<(), Symbol> {
        let scope = &mut self.scopes[self.current.0];
        if let Some(existing) = scope.bindings.get(name) {
            return Err(existing.clone());
        }
        scope.bindings.insert(name.to_string(), symbol);
        Ok(())
    }

    /// Look `name` up in the current scope only.
    pub fn resolve_locally(&self, name: &str) -> Option<&Symbol> {
        self.current_scope().lookup(name)
    }

    /// Look `name` up from the current scope outward.
    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        self.resolve_from(self.current, name)
    }

    /// Look `name` up from `start` outward; the nearest binding wins.
    pub fn resolve_from(&self, start: ScopeId, name: &str) -> Option<&Symbol> {
        let mut next = Some(start);
        while let Some(id) = next {
            let scope = self.scopes.get(id.0)?;
            if let Some(symbol) = scope.lookup(name) {
                return Some(symbol);
            }
            next = self.parent(id);
        }
        None
    }

    /// The nearest function scope enclosing the current one.
    pub fn enclosing_function(&self) -> Option<&Scope> {
        let mut next = Some(self.current);
        while let Some(id) = next {
            let scope = &self.scopes[id.0];
            if scope.kind == ScopeKind::Function {
                return Some(scope);
            }
            next = scope.parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ScopeTable {
        ScopeTable::new(GLOBAL_SCOPE)
    }

    #[test]
    fn new_table_has_current_root() {
        let t = table();
        assert_eq!(t.len(), 1);
        assert_eq!(t.current(), t.root());
        assert_eq!(t.current_scope().name, GLOBAL_SCOPE);
        assert_eq!(t.parent(t.root()), None);
    }

    #[test]
    fn unknown_ids_have_no_relatives() {
        let t = table();
        assert_eq!(t.parent(ScopeId(7)), None);
        assert!(t.children(ScopeId(7)).is_empty());
    }

    #[test]
    fn child_scope_links_both_ways() {
        let mut t = table();
        let f = t.create_child_scope("f", ScopeKind::Function, Type::Int);
        assert_eq!(t.current(), f);
        assert_eq!(t.parent(f), Some(t.root()));
        assert_eq!(t.children(t.root()), &[f]);
        assert!(t.children(f).is_empty());
        t.exit_scope();
        assert_eq!(t.current(), t.root());
        t.exit_scope();
        assert_eq!(t.current(), t.root());
    }

    #[test]
    fn define_rejects_duplicate_and_keeps_first() {
        let mut t = table();
        assert!(t.define("x", Symbol::Variable(Type::Int)).is_ok());
        let err = t.define("x", Symbol::Variable(Type::Bool)).unwrap_err();
        assert_eq!(err, Symbol::Variable(Type::Int));
        assert_eq!(t.resolve("x"), Some(&Symbol::Variable(Type::Int)));
    }

    #[test]
    fn shadowing_is_not_redeclaration() {
        let mut t = table();
        t.define("x", Symbol::Variable(Type::Int)).unwrap();
        t.create_child_scope(MAIN_SCOPE, ScopeKind::Main, Type::Void);
        assert!(t.resolve_locally("x").is_none());
        assert!(t.define("x", Symbol::Variable(Type::String)).is_ok());
        assert_eq!(t.resolve("x"), Some(&Symbol::Variable(Type::String)));
        t.exit_scope();
        assert_eq!(t.resolve("x"), Some(&Symbol::Variable(Type::Int)));
    }

    #[test]
    fn resolve_walks_to_root() {
        let mut t = table();
        t.define("g", Symbol::Function(Type::function(vec![], Type::Void)))
            .unwrap();
        t.create_child_scope("f", ScopeKind::Function, Type::Void);
        assert!(matches!(t.resolve("g"), Some(Symbol::Function(_))));
        assert!(t.resolve("missing").is_none());
    }

    #[test]
    fn child_scope_named_finds_only_direct_children() {
        let mut t = table();
        let f = t.create_child_scope("f", ScopeKind::Function, Type::Void);
        t.exit_scope();
        let main = t.create_child_scope(MAIN_SCOPE, ScopeKind::Main, Type::Void);
        t.exit_scope();
        assert_eq!(t.child_scope_named("f"), Some(f));
        assert_eq!(t.child_scope_named(MAIN_SCOPE), Some(main));
        assert_eq!(t.child_scope_named("g"), None);
        t.enter(main);
        assert_eq!(t.child_scope_named("f"), None);
    }

    #[test]
    fn enclosing_function_skips_main() {
        let mut t = table();
        t.create_child_scope(MAIN_SCOPE, ScopeKind::Main, Type::Void);
        assert!(t.enclosing_function().is_none());
        t.exit_scope();
        t.create_child_scope("f", ScopeKind::Function, Type::Bool);
        let scope = t.enclosing_function().unwrap();
        assert_eq!(scope.name, "f");
        assert_eq!(scope.return_type, Type::Bool);
    }

    #[test]
    fn resolve_from_arbitrary_scope() {
        let mut t = table();
        let f = t.create_child_scope("f", ScopeKind::Function, Type::Void);
        t.define("a", Symbol::Variable(Type::Int)).unwrap();
        t.exit_scope();
        assert!(t.resolve("a").is_none());
        assert_eq!(t.resolve_from(f, "a"), Some(&Symbol::Variable(Type::Int)));
        assert_eq!(t.resolve_from(ScopeId(99), "a"), None);
    }
}
