use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ast::NodeId;
use crate::Span;

/// Kind of semantic violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Reference to a name that is not visible from the current scope.
    UndefinedName,
    /// `-` on a non-Int or `!` on a non-Bool.
    InvalidNegation,
    /// Binary operator applied to operand types outside the rule table.
    InvalidBinaryOp,
    /// Type mismatch in an assignment or initializer, or assignment to a
    /// name that is not a variable.
    InvalidAssignment,
    /// Non-Bool condition in `if` / `while`.
    InvalidCondition,
    /// Name declared twice in the same scope.
    DuplicateDeclaration,
    /// Return type mismatch, or `return` outside a function.
    InvalidReturn,
    /// Call arity or argument type mismatch.
    ArgumentMismatch,
    /// A variable called like a function, a function named without being
    /// called, or the result of a Void function used as a value.
    InvalidCall,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UndefinedName => "UNDEFINED_NAME",
            Self::InvalidNegation => "INVALID_NEGATION",
            Self::InvalidBinaryOp => "INVALID_BINARY_OP",
            Self::InvalidAssignment => "INVALID_ASSIGNMENT",
            Self::InvalidCondition => "INVALID_CONDITION",
            Self::DuplicateDeclaration => "DUPLICATE_DECLARATION",
            Self::InvalidReturn => "INVALID_RETURN",
            Self::ArgumentMismatch => "ARGUMENT_MISMATCH",
            Self::InvalidCall => "INVALID_CALL",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single semantic diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Source file name.
    pub file: String,
    pub category: Category,
    pub message: String,
    /// The offending node.
    pub node: NodeId,
    #[serde(flatten)]
    pub span: Span,
    /// The exact source line, for context. Empty for in-memory trees.
    pub source_line: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} {}",
            self.file, self.span, self.category, self.message
        )
    }
}

impl std::error::Error for Diagnostic {}

/// Ordered, append-only collection of diagnostics for one analysis run.
///
/// Entries are never removed, reordered, capped or deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLog {
    entries: Vec<Diagnostic>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Number of entries in `category`.
    pub fn count(&self, category: Category) -> usize {
        self.entries
            .iter()
            .filter(|d| d.category == category)
            .count()
    }

    pub fn has(&self, category: Category) -> bool {
        self.entries.iter().any(|d| d.category == category)
    }

    /// Categories in log order.
    pub fn categories(&self) -> Vec<Category> {
        self.entries.iter().map(|d| d.category).collect()
    }
}

impl<'a> IntoIterator for &'a ErrorLog {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diag(category: Category, message: &str, line: u32) -> Diagnostic {
        Diagnostic {
            file: "test.nim".to_string(),
            category,
            message: message.to_string(),
            node: NodeId(line),
            span: Span::point(line, 1),
            source_line: String::new(),
        }
    }

    #[test]
    fn category_display_matches_serialized_name() {
        for category in [
            Category::UndefinedName,
            Category::InvalidNegation,
            Category::InvalidBinaryOp,
            Category::InvalidAssignment,
            Category::InvalidCondition,
            Category::DuplicateDeclaration,
            Category::InvalidReturn,
            Category::ArgumentMismatch,
            Category::InvalidCall,
        ] {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{category}\""));
        }
    }

    #[test]
    fn log_keeps_insertion_order_and_duplicates() {
        let mut log = ErrorLog::new();
        log.add(diag(Category::InvalidCondition, "a", 3));
        log.add(diag(Category::UndefinedName, "b", 1));
        log.add(diag(Category::UndefinedName, "b", 1));
        assert_eq!(log.len(), 3);
        assert_eq!(
            log.categories(),
            vec![
                Category::InvalidCondition,
                Category::UndefinedName,
                Category::UndefinedName
            ]
        );
        assert_eq!(log.count(Category::UndefinedName), 2);
        assert!(log.has(Category::InvalidCondition));
        assert!(!log.has(Category::InvalidReturn));
    }

    #[test]
    fn empty_log() {
        let log = ErrorLog::new();
        assert!(log.is_empty());
        assert_eq!(log.iter().count(), 0);
    }

    #[test]
    fn diagnostic_display() {
        let d = diag(Category::UndefinedName, "'x' is undefined", 7);
        assert_eq!(d.to_string(), "test.nim:7:1: UNDEFINED_NAME 'x' is undefined");
    }

    #[test]
    fn diagnostic_json_uses_flat_span() {
        let json = serde_json::to_string(&diag(Category::InvalidReturn, "m", 2)).unwrap();
        assert!(json.contains("\"category\":\"INVALID_RETURN\""));
        assert!(json.contains("\"line\":2"));
        assert!(json.contains("\"end_column\":1"));
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(back.category, Category::InvalidReturn);
        assert_eq!(back.span, Span::point(2, 1));
    }
}
