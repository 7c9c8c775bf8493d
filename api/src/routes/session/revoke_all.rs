use actix_web::{web, HttpResponse};

use crate::dto::session_dto::RevokeAllResponse;
use crate::handlers::error_handler::handle_domain_error;
use crate::middleware::auth::AuthContext;

use pf_core::repositories::{IdentityRepository, SessionRepository};

use super::AppState;

/// Handler for POST /api/v1/session/revoke-all
///
/// Logs the subject out everywhere by revoking every one of their
/// sessions. Authenticated by access token in the Authorization
/// header.
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// {
///     "revoked": 3
/// }
/// ```
pub async fn revoke_all<S, I>(
    state: web::Data<AppState<S, I>>,
    auth: AuthContext,
) -> HttpResponse
where
    S: SessionRepository + 'static,
    I: IdentityRepository + 'static,
{
    match state.tokens.revoke_all(auth.subject_id).await {
        Ok(revoked) => HttpResponse::Ok().json(RevokeAllResponse { revoked }),
        Err(error) => handle_domain_error(&error),
    }
}
