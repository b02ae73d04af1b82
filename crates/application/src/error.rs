//! Application error types

use steward_domain::{ApiError, ClaimsError, DomainError};
use thiserror::Error;

use crate::ports::StoreError;

/// Application-level errors.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// A bearer token could not be decoded.
    #[error("invalid credential: {0}")]
    Claims(#[from] ClaimsError),

    /// The credential's expiry has already passed.
    #[error("credential already expired")]
    ExpiredCredential,

    /// A storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// A backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ApplicationError {
    /// Returns the backend error, if this is one.
    #[must_use]
    pub const fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
