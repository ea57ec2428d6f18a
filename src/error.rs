//! Unified error handling for the membership engine.
//!
//! Business-rule failures are value-level [`Error`]s with a kind and a
//! human-readable detail; storage outages propagate separately through the
//! [`Error::Store`] variant so callers can tell misuse from infrastructure
//! trouble.

use crate::store::StoreError;
use thiserror::Error;

/// Errors returned by engine operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The request itself is malformed: bad name, bad role, self-targeting
    /// violation. Recoverable by the caller correcting the request.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The server, target user, or membership does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Policy denied the action, or the caller lacks the required role.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The row to create already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A multi-step operation partially completed and left state that needs
    /// operator attention. Never retried automatically.
    #[error("inconsistent state: {0}")]
    Inconsistent(String),

    /// The storage backend failed. Distinct from every business-rule kind.
    #[error("store error: {0}")]
    Store(#[source] StoreError),
}

impl Error {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NotFound(_) => "not_found",
            Self::Forbidden(_) => "forbidden",
            Self::Conflict(_) => "conflict",
            Self::Inconsistent(_) => "inconsistent",
            Self::Store(_) => "store_error",
        }
    }
}

impl From<StoreError> for Error {
    /// Row-level store outcomes map onto the business taxonomy; everything
    /// else stays a backend failure.
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Error::NotFound(what),
            StoreError::Conflict(what) => Error::Conflict(what),
            other => Error::Store(other),
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, Error>;
