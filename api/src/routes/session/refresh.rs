use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::dto::session_dto::{RefreshRequest, TokenResponse};
use crate::handlers::error_handler::handle_domain_error;

use pf_core::repositories::{IdentityRepository, SessionRepository};
use pf_shared::ErrorResponse;

use super::AppState;

/// Handler for POST /api/v1/session/refresh
///
/// Exchanges a valid refresh token for a new token pair, atomically
/// retiring the presented token. The refresh token is opaque: clients
/// store and replay it verbatim.
///
/// # Request Body
///
/// ```json
/// {
///     "refresh_token": "opaque_refresh_token"
/// }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// New token pair, same shape as login.
///
/// ## Errors
/// - 401 `INVALID_REFRESH_TOKEN`: Unknown or expired token
/// - 401 `REFRESH_REUSE_DETECTED`: Replay of a consumed token; every
///   session in the family has been revoked
/// - 503 `SERVICE_UNAVAILABLE`: Transient store failure (retry; not a
///   logout)
pub async fn refresh<S, I>(
    state: web::Data<AppState<S, I>>,
    request: web::Json<RefreshRequest>,
) -> HttpResponse
where
    S: SessionRepository + 'static,
    I: IdentityRepository + 'static,
{
    if let Err(errors) = request.validate() {
        return HttpResponse::BadRequest()
            .json(ErrorResponse::new("VALIDATION_FAILED", errors.to_string()));
    }

    match state.tokens.refresh(&request.refresh_token).await {
        Ok(pair) => HttpResponse::Ok().json(TokenResponse::from(pair)),
        Err(error) => handle_domain_error(&error),
    }
}
