//! Domain-specific error types and error handling.

use thiserror::Error;

/// Token-related errors.
///
/// `Expired` and `Invalid` are distinct because callers react
/// differently: an expired access token triggers a refresh, a bad
/// signature forces re-authentication.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Access token expired")]
    Expired,

    #[error("Invalid access token")]
    Invalid,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Refresh token reuse detected")]
    ReuseDetected,

    #[error("Token generation failed")]
    GenerationFailed,
}

/// Session-store errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session not found")]
    NotFound,

    #[error("Session already consumed")]
    AlreadyConsumed,

    #[error("Session store unavailable: {0}")]
    Unavailable(String),
}

/// Core domain errors (general purpose).
///
/// Variants are `Clone` so a single outcome can be fanned out to every
/// caller queued behind one in-flight refresh.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to specific error types
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Whether the caller should discard credentials and re-authenticate
    pub fn requires_reauthentication(&self) -> bool {
        matches!(
            self,
            DomainError::Token(TokenError::Invalid)
                | DomainError::Token(TokenError::InvalidRefreshToken)
                | DomainError::Token(TokenError::ReuseDetected)
        )
    }

    /// Whether the failure is transient and worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::Session(SessionError::Unavailable(_)))
    }
}
