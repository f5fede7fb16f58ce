//! Error types for the editor

use folio_schema::{NodePath, SchemaError};
use folio_store::StoreError;
use thiserror::Error;

pub type EditorResult<T> = Result<T, EditorError>;

#[derive(Error, Debug)]
pub enum EditorError {
    /// Structurally invalid parameters, including invalid positions and key
    /// orderings that are not a permutation
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Addressing mismatch in '{version}' at {path}: {reason}")]
    AddressingMismatch {
        version: String,
        path: NodePath,
        reason: String,
    },

    #[error("Would create cycle: cannot move {node} under {new_parent}")]
    CycleDetected { node: NodePath, new_parent: NodePath },

    #[error("Repair not committed ({}): {reason}", failed.join(", "))]
    PartialRepairFailure { failed: Vec<String>, reason: String },

    #[error("Root node has no parent")]
    RootHasNoParent,

    #[error("'{0}' is not a simple book")]
    NotSimpleBook(String),

    #[error("Node {0} does not have a single default child")]
    NoSingleDefaultChild(NodePath),

    #[error("Default child under {0} is not a content node")]
    DefaultNotContent(NodePath),

    #[error("Commentary '{title}' does not mirror its base schema: {reason}")]
    DerivedSchemaMismatch { title: String, reason: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl EditorError {
    pub(crate) fn mismatch(version: impl Into<String>, path: &NodePath, reason: impl Into<String>) -> Self {
        EditorError::AddressingMismatch {
            version: version.into(),
            path: path.clone(),
            reason: reason.into(),
        }
    }

    /// Rejected before anything was read from or written to the store
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EditorError::Schema(_)
                | EditorError::CycleDetected { .. }
                | EditorError::RootHasNoParent
                | EditorError::NotSimpleBook(_)
                | EditorError::NoSingleDefaultChild(_)
                | EditorError::DefaultNotContent(_)
        )
    }
}
