//! Nimble semantic analysis.
//!
//! ```text
//! Script → Pass 1 (scopes + function signatures) → Pass 2 (types + checks) → Analysis
//! ```
//!
//! Entry point: [`analyze`]. Both passes always run to completion; semantic
//! violations are collected in the returned [`ErrorLog`] and never abort
//! the traversal.

mod checker;
mod report;
mod symbols;
pub mod scope;
pub mod ty;

use std::collections::BTreeMap;

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use nimble_types::ast::{NodeId, Script};
use nimble_types::{ErrorLog, SourceFile};

pub use checker::binary_result;
pub use scope::{Scope, ScopeId, ScopeKind, ScopeTable, Symbol};
pub use ty::{Type, TypeMap};

use crate::checker::TypeChecker;
use crate::report::Reporter;
use crate::symbols::ScopeBuilder;

/// Failures outside the semantic rules themselves.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The analysis could not be rendered as JSON.
    #[error("failed to serialize analysis: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type alias for analysis output operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// The finished artifact of one analysis run.
///
/// If `errors` is empty the program is semantically valid and no node in
/// `types` is [`Type::Error`].
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    /// Type of every expression, declaration and statement node.
    pub types: TypeMap,
    /// The scope tree rooted at the global scope.
    pub scopes: ScopeTable,
    /// Scope introduced by each script, function and main node.
    pub node_scopes: BTreeMap<NodeId, ScopeId>,
    pub errors: ErrorLog,
}

impl Analysis {
    pub fn type_of(&self, node: NodeId) -> Option<&Type> {
        self.types.get(node)
    }

    pub fn scope_of(&self, node: NodeId) -> Option<&Scope> {
        self.node_scopes
            .get(&node)
            .and_then(|&id| self.scopes.get(id))
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn to_json(&self) -> AnalysisResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Hex SHA-256 of the JSON rendering; equal for equal analyses.
    pub fn fingerprint(&self) -> AnalysisResult<String> {
        let json = self.to_json()?;
        Ok(format!("{:x}", Sha256::digest(json.as_bytes())))
    }
}

/// Run both semantic passes over `script`.
///
/// `source` supplies the file name and text used to decorate diagnostics.
/// Every call starts from a fresh scope table, error log and type map.
#[tracing::instrument(skip_all, fields(file = %source.name))]
pub fn analyze(script: &Script, source: &SourceFile) -> Analysis {
    let mut reporter = Reporter::new(source);

    let mut symbols = ScopeBuilder::new(&mut reporter).build(script);
    let types = TypeChecker::new(
        &mut symbols.scopes,
        &symbols.node_scopes,
        &symbols.rejected,
        &mut reporter,
    )
    .check(script);

    let errors = reporter.finish();
    tracing::debug!(
        nodes = types.len(),
        scopes = symbols.scopes.len(),
        errors = errors.len(),
        "analysis finished"
    );

    Analysis {
        types,
        scopes: symbols.scopes,
        node_scopes: symbols.node_scopes,
        errors,
    }
}
