//! Semantic types for the Nimble analyzer.
//!
//! [`Type`] is distinct from [`nimble_types::ast::TypeName`], the syntactic
//! name written in a declaration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use nimble_types::ast::{NodeId, TypeName};

/// A semantic type.
///
/// Equality is structural, except that [`Type::Error`] is never equal to
/// anything, itself included. Code that needs to know whether a type is the
/// error sentinel must ask [`Type::is_error`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Type {
    Int,
    String,
    Bool,
    /// Statements and functions that produce no value.
    Void,
    /// Assigned after a rule violation; already reported.
    Error,
    /// `(params) -> returns`
    Function {
        params: Vec<Type>,
        returns: Box<Type>,
    },
}

impl Type {
    pub fn function(params: Vec<Type>, returns: Type) -> Self {
        Type::Function {
            params,
            returns: Box::new(returns),
        }
    }

    pub fn from_name(name: TypeName) -> Self {
        match name {
            TypeName::Int => Type::Int,
            TypeName::String => Type::String,
            TypeName::Bool => Type::Bool,
        }
    }

    /// Declared return type, `Void` when omitted.
    pub fn from_return(ret: Option<TypeName>) -> Self {
        ret.map(Type::from_name).unwrap_or(Type::Void)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }

    /// Any `Error` anywhere in this type, including inside a signature.
    pub fn contains_error(&self) -> bool {
        match self {
            Type::Error => true,
            Type::Function { params, returns } => {
                params.iter().any(Type::contains_error) || returns.contains_error()
            }
            _ => false,
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Type::Int, Type::Int)
            | (Type::String, Type::String)
            | (Type::Bool, Type::Bool)
            | (Type::Void, Type::Void) => true,
            (
                Type::Function { params: a, returns: ra },
                Type::Function { params: b, returns: rb },
            ) => a == b && ra == rb,
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "Int"),
            Type::String => write!(f, "String"),
            Type::Bool => write!(f, "Bool"),
            Type::Void => write!(f, "Void"),
            Type::Error => write!(f, "Error"),
            Type::Function { params, returns } => {
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {}", returns)
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// TypeMap
// ══════════════════════════════════════════════════════════════════════════════

/// The type computed for each expression, declaration and statement node.
///
/// Each node is written exactly once during checking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeMap {
    types: BTreeMap<NodeId, Type>,
}

impl TypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set(&mut self, node: NodeId, ty: Type) {
        let previous = self.types.insert(node, ty);
        debug_assert!(previous.is_none(), "node {node} typed twice");
    }

    pub fn get(&self, node: NodeId) -> Option<&Type> {
        self.types.get(&node)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Type)> {
        self.types.iter().map(|(&id, ty)| (id, ty))
    }

    /// Nodes whose type is the error sentinel.
    pub fn error_nodes(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, ty)| ty.contains_error())
            .map(|(id, _)| id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_compare_structurally() {
        assert_eq!(Type::Int, Type::Int);
        assert_eq!(Type::Void, Type::Void);
        assert_ne!(Type::Int, Type::String);
        assert_ne!(Type::Bool, Type::Void);
    }

    #[test]
    fn error_never_equals_anything() {
        assert_ne!(Type::Error, Type::Error);
        assert_ne!(Type::Error, Type::Int);
        assert_ne!(Type::Int, Type::Error);
        assert!(Type::Error.is_error());
        assert!(!Type::Int.is_error());
    }

    #[test]
    fn function_types_compare_by_shape() {
        let a = Type::function(vec![Type::Int, Type::Bool], Type::String);
        let b = Type::function(vec![Type::Int, Type::Bool], Type::String);
        let c = Type::function(vec![Type::Int], Type::String);
        let d = Type::function(vec![Type::Int, Type::Bool], Type::Void);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        let with_error = Type::function(vec![Type::Error], Type::Int);
        assert_ne!(with_error.clone(), with_error);
        assert!(with_error.contains_error());
        assert!(!a.contains_error());
    }

    #[test]
    fn display_names() {
        assert_eq!(Type::Int.to_string(), "Int");
        assert_eq!(Type::Error.to_string(), "Error");
        assert_eq!(
            Type::function(vec![Type::Int, Type::Bool], Type::Void).to_string(),
            "(Int, Bool) -> Void"
        );
        assert_eq!(Type::function(vec![], Type::Int).to_string(), "() -> Int");
    }

    #[test]
    fn from_syntax() {
        assert_eq!(Type::from_name(TypeName::String), Type::String);
        assert_eq!(Type::from_return(None), Type::Void);
        assert_eq!(Type::from_return(Some(TypeName::Bool)), Type::Bool);
    }

    #[test]
    fn type_map_reports_error_nodes() {
        let mut map = TypeMap::new();
        map.set(NodeId(0), Type::Int);
        map.set(NodeId(1), Type::Error);
        map.set(NodeId(2), Type::function(vec![], Type::Void));
        assert_eq!(map.len(), 3);
        assert_eq!(map.get(NodeId(0)), Some(&Type::Int));
        assert!(map.get(NodeId(7)).is_none());
        assert_eq!(map.error_nodes(), vec![NodeId(1)]);
    }

    #[test]
    fn type_map_serializes_in_node_order() {
        let mut map = TypeMap::new();
        map.set(NodeId(3), Type::Bool);
        map.set(NodeId(1), Type::String);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"1":"String","3":"Bool"}"#);
    }
}
