//! Mapping from domain errors to HTTP responses.
//!
//! Status codes follow the recovery contract: 401 with a distinct code
//! tells the client what to do next (refresh vs. re-authenticate),
//! while transient store trouble is 503 and must never read as an
//! authentication failure.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::fmt;

use pf_core::errors::{DomainError, SessionError, TokenError};
use pf_shared::ErrorResponse;

/// Converts a domain error into the appropriate HTTP response
pub fn handle_domain_error(error: &DomainError) -> HttpResponse {
    let (status, code) = classify(error);

    match status {
        StatusCode::SERVICE_UNAVAILABLE => {
            log::error!("transient failure serving request: {}", error)
        }
        StatusCode::INTERNAL_SERVER_ERROR => log::error!("internal error: {}", error),
        _ if matches!(error, DomainError::Token(TokenError::ReuseDetected)) => {
            log::warn!("refresh token reuse rejected")
        }
        _ => {}
    }

    HttpResponse::build(status).json(ErrorResponse::new(code, error.to_string()))
}

/// Status and machine-readable code for a domain error
fn classify(error: &DomainError) -> (StatusCode, &'static str) {
    match error {
        DomainError::Token(TokenError::Expired) => {
            (StatusCode::UNAUTHORIZED, "ACCESS_TOKEN_EXPIRED")
        }
        DomainError::Token(TokenError::Invalid) => {
            (StatusCode::UNAUTHORIZED, "ACCESS_TOKEN_INVALID")
        }
        DomainError::Token(TokenError::InvalidRefreshToken)
        | DomainError::Session(SessionError::NotFound) => {
            (StatusCode::UNAUTHORIZED, "INVALID_REFRESH_TOKEN")
        }
        DomainError::Token(TokenError::ReuseDetected)
        | DomainError::Session(SessionError::AlreadyConsumed) => {
            (StatusCode::UNAUTHORIZED, "REFRESH_REUSE_DETECTED")
        }
        DomainError::Token(TokenError::GenerationFailed) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "TOKEN_GENERATION_FAILED")
        }
        DomainError::Session(SessionError::Unavailable(_)) => {
            (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
        }
        DomainError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        DomainError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    }
}

/// Typed rejection raised by the verification middleware, rendered as
/// a JSON error body
#[derive(Debug)]
pub struct AuthRejection {
    code: &'static str,
    message: String,
}

impl AuthRejection {
    /// No credential present on the request
    pub fn missing() -> Self {
        Self {
            code: "MISSING_CREDENTIALS",
            message: "Missing access token".to_string(),
        }
    }

    /// Credential expired: client should refresh and retry
    pub fn expired() -> Self {
        Self {
            code: "ACCESS_TOKEN_EXPIRED",
            message: "Access token expired".to_string(),
        }
    }

    /// Credential malformed or badly signed: client must re-authenticate
    pub fn invalid() -> Self {
        Self {
            code: "ACCESS_TOKEN_INVALID",
            message: "Invalid access token".to_string(),
        }
    }
}

impl fmt::Display for AuthRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl ResponseError for AuthRejection {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(ErrorResponse::new(self.code, &self.message))
    }
}
