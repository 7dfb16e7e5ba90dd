//! Error types shared by every coordinator.
//!
//! Validation and conflict outcomes are ordinary return values of the
//! coordinators; the variants here that reach a caller mean the request could
//! not be answered (infrastructure trouble, cancellation, missing data).

use axum::http::StatusCode;
use thiserror::Error;

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which unique column rejected an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    Offset,
}

impl std::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UniqueField::Email => write!(f, "email"),
            UniqueField::Offset => write!(f, "email_hash"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// Blank or otherwise unusable email.
    #[error("Invalid email address")]
    InvalidEmail,

    /// Unique constraint violation in the durable store.
    #[error("Unique constraint violated on {0}")]
    Conflict(UniqueField),

    /// No user record for the requested email.
    #[error("User not found: {0}")]
    NotFound(String),

    /// Durable store unavailable or failing.
    #[error("Store error: {0}")]
    Store(String),

    /// Bit-addressable store unavailable or failing.
    #[error("Bitmap error: {0}")]
    Bitmap(String),

    /// Profile cache unavailable or failing.
    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    /// The digest primitive produced an unexpected answer at startup.
    #[error("SHA-256 self test failed")]
    DigestSelfTest,
}

impl Error {
    /// True for failures of a collaborator that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Store(_) | Error::Bitmap(_) | Error::Cache(_) | Error::Timeout(_)
        )
    }

    /// HTTP status used by the request handlers.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidEmail => StatusCode::BAD_REQUEST,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::Store(_) | Error::Bitmap(_) | Error::Cache(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Error::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            Error::Serialization(_) | Error::Config(_) | Error::DigestSelfTest => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
