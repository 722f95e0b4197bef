use thiserror::Error;

use crate::storage::StorageError;

/// Errors produced by world-engine operations.
///
/// Every variant is recovered by the command dispatcher: state stays
/// unmodified and the client gets a fresh snapshot back. Nothing here is
/// fatal to the process.
#[derive(Debug, Error)]
pub enum WorldError {
    /// Malformed or missing command parameters (non-integer or zero
    /// quantity, unknown direction, unknown commodity).
    #[error("invalid request: {0}")]
    Validation(String),

    /// Unknown username, wrong password, duplicate registration.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Command issued outside the session state it is legal in.
    #[error("not available here: {0}")]
    Precondition(String),

    /// Insufficient cargo, insufficient credits, or a business with zero
    /// holds (which would divide by zero in pricing).
    #[error("insufficient resources: {0}")]
    Resource(String),

    /// Referenced entity does not exist where the command expects it.
    #[error("not found: {0}")]
    NotFound(String),

    /// Wrapper around persistence-layer failures.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl WorldError {
    pub fn validation(msg: impl Into<String>) -> Self {
        WorldError::Validation(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        WorldError::Auth(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        WorldError::Precondition(msg.into())
    }

    pub fn resource(msg: impl Into<String>) -> Self {
        WorldError::Resource(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        WorldError::NotFound(msg.into())
    }
}
