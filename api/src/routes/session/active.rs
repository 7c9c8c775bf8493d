use actix_web::{web, HttpResponse};

use crate::dto::session_dto::{ActiveSessionsResponse, SessionView};
use crate::handlers::error_handler::handle_domain_error;
use crate::middleware::auth::AuthContext;

use pf_core::repositories::{IdentityRepository, SessionRepository};

use super::AppState;

/// Handler for GET /api/v1/session/active
///
/// Lists the subject's active sessions for the device-management view.
/// Token material never appears in the response.
pub async fn active_sessions<S, I>(
    state: web::Data<AppState<S, I>>,
    auth: AuthContext,
) -> HttpResponse
where
    S: SessionRepository + 'static,
    I: IdentityRepository + 'static,
{
    match state.tokens.list_sessions(auth.subject_id).await {
        Ok(sessions) => HttpResponse::Ok().json(ActiveSessionsResponse {
            sessions: sessions.into_iter().map(SessionView::from).collect(),
        }),
        Err(error) => handle_domain_error(&error),
    }
}
