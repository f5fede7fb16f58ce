use crate::path::NodePath;
use thiserror::Error;

pub type SchemaResult<T> = Result<T, SchemaError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Invalid position {position} under {parent}: expected 0..={len}")]
    InvalidPosition {
        parent: NodePath,
        position: usize,
        len: usize,
    },

    #[error("Key set mismatch under {parent}: expected {expected:?}, found {found:?}")]
    KeySetMismatch {
        parent: NodePath,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Duplicate key '{key}' under {parent}")]
    DuplicateKey { parent: NodePath, key: String },

    #[error("Node not found: {0}")]
    NodeNotFound(NodePath),

    #[error("Node is not a container: {0}")]
    NotAContainer(NodePath),

    #[error("Address shape mismatch: {section_names} section names, {address_types} address types")]
    ShapeMismatch {
        section_names: usize,
        address_types: usize,
    },

    #[error("Invalid default child under {parent}: {message}")]
    InvalidDefaultChild { parent: NodePath, message: String },

    #[error("More than one primary title for language '{lang}'")]
    DuplicatePrimaryTitle { lang: String },

    #[error("Title '{text}' ({lang}) not found")]
    TitleNotFound { lang: String, text: String },
}

impl SchemaError {
    pub fn invalid_position(parent: &NodePath, position: usize, len: usize) -> Self {
        Self::InvalidPosition {
            parent: parent.clone(),
            position,
            len,
        }
    }

    pub fn invalid_default(parent: &NodePath, message: impl Into<String>) -> Self {
        Self::InvalidDefaultChild {
            parent: parent.clone(),
            message: message.into(),
        }
    }
}
