use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::dto::session_dto::{RevokeRequest, RevokeResponse};
use crate::handlers::error_handler::handle_domain_error;

use pf_core::repositories::{IdentityRepository, SessionRepository};
use pf_shared::ErrorResponse;

use super::AppState;

/// Handler for POST /api/v1/session/revoke
///
/// Logs out one device by revoking its refresh token. Idempotent:
/// revoking an unknown or already-dead token reports `revoked: false`
/// rather than failing.
pub async fn revoke<S, I>(
    state: web::Data<AppState<S, I>>,
    request: web::Json<RevokeRequest>,
) -> HttpResponse
where
    S: SessionRepository + 'static,
    I: IdentityRepository + 'static,
{
    if let Err(errors) = request.validate() {
        return HttpResponse::BadRequest()
            .json(ErrorResponse::new("VALIDATION_FAILED", errors.to_string()));
    }

    match state.tokens.revoke(&request.refresh_token).await {
        Ok(revoked) => HttpResponse::Ok().json(RevokeResponse { revoked }),
        Err(error) => handle_domain_error(&error),
    }
}
