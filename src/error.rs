//! Graph-level errors

use crate::codec::CodecError;
use crate::config::ConfigError;
use crate::element::{ElementId, ElementKind};
use crate::store::StoreError;
use thiserror::Error;

/// Errors that can occur during graph operations
#[derive(Error, Debug)]
pub enum GraphError {
    /// Element is absent where it must exist (removal of a missing vertex)
    #[error("{kind} {id} does not exist")]
    NotFound { kind: ElementKind, id: ElementId },

    /// Bad argument; raised before any store mutation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Store failure, carrying table and operation context
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl GraphError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        GraphError::Validation(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, GraphError::Validation(_))
    }
}

pub type GraphResult<T> = Result<T, GraphError>;
