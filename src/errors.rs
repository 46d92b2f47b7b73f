use thiserror::Error;
use uuid::Uuid;

use crate::core::services::ServiceError;

/// Local precondition failures, raised before any backend call is made.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("node {0} cannot be its own parent")]
    SelfParent(Uuid),
    #[error("cannot move {node} under its own descendant {target}")]
    Cycle { node: Uuid, target: Uuid },
    #[error("node not found: {0}")]
    NodeNotFound(Uuid),
    #[error("invalid move target: {0}")]
    InvalidTarget(String),
    #[error("node {0} cannot be moved")]
    NotMovable(Uuid),
    #[error("name must not be empty")]
    EmptyName,
    #[error("name `{name}` contains forbidden character `{character}`")]
    ForbiddenCharacter { name: String, character: char },
    #[error("a sibling named `{0}` already exists")]
    DuplicateName(String),
}

/// Error taxonomy of the hierarchy engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("transient failure: {0}")]
    Transient(String),
    #[error("operation failed: {0}")]
    OperationFailure(#[source] ServiceError),
    #[error("configuration error: {0}")]
    Config(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl From<ServiceError> for EngineError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Conflict(message) => EngineError::Conflict(message),
            other => EngineError::OperationFailure(other),
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Config(err.to_string())
    }
}

impl EngineError {
    pub fn is_validation(&self) -> bool {
        matches!(self, EngineError::Validation(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, EngineError::Conflict(_))
    }
}
