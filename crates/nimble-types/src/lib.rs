//! Shared types for the Nimble compiler.
//!
//! This crate defines the syntax tree, source spans and the diagnostic
//! model shared by the parser, the semantic analyzer and code generation.

mod builder;
mod error;
mod span;
pub mod ast;

pub use builder::AstBuilder;
pub use error::{Category, Diagnostic, ErrorLog};
pub use span::{SourceFile, Span};
