//! Client error types

use thiserror::Error;

use crate::layout::LayoutError;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// No active tenant; raised locally before any request is issued
    #[error("No active restaurant selected")]
    MissingTenant,

    /// Network failure or server-side error
    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),

    /// Rejected by the store's access control
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// Input rejected locally or by the store
    #[error("Validation error: {0}")]
    ValidationFailure(String),

    /// Referenced table, order or menu item does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body did not match the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local state persistence failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationFailure(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Failures worth retrying later (the snapshot just stays stale)
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RemoteUnavailable(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::RemoteUnavailable(err.to_string())
        }
    }
}

impl From<LayoutError> for ClientError {
    fn from(err: LayoutError) -> Self {
        Self::ValidationFailure(err.to_string())
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
