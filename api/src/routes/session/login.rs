use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use crate::dto::session_dto::{LoginRequest, TokenResponse};
use crate::handlers::error_handler::handle_domain_error;

use pf_core::domain::entities::session::SubjectIdentity;
use pf_core::repositories::{IdentityRepository, SessionRepository};
use pf_shared::ErrorResponse;

use super::{extract_user_agent, AppState};

/// Handler for POST /api/v1/session
///
/// Opens a new session family for an authenticated subject. The
/// identity collaborator authenticates the user and calls this with
/// the resulting subject facts; no credentials cross this boundary.
///
/// # Request Body
///
/// ```json
/// {
///     "subject_id": "550e8400-e29b-41d4-a716-446655440000",
///     "email": "diner@example.com",
///     "role": "diner",
///     "device_label": "iPhone / Plateful 2.4"
/// }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// {
///     "access_token": "eyJ...",
///     "refresh_token": "opaque_refresh_token",
///     "access_expires_in": 900,
///     "refresh_expires_in": 604800
/// }
/// ```
///
/// ## Errors
/// - 400 Bad Request: Malformed subject facts
/// - 503 Service Unavailable: Session store outage
pub async fn login<S, I>(
    req: HttpRequest,
    state: web::Data<AppState<S, I>>,
    request: web::Json<LoginRequest>,
) -> HttpResponse
where
    S: SessionRepository + 'static,
    I: IdentityRepository + 'static,
{
    if let Err(errors) = request.validate() {
        return HttpResponse::BadRequest()
            .json(ErrorResponse::new("VALIDATION_FAILED", errors.to_string()));
    }

    let device_label = request
        .device_label
        .clone()
        .or_else(|| extract_user_agent(&req));

    let identity = SubjectIdentity {
        subject_id: request.subject_id,
        email: request.email.clone(),
        role: request.role.clone(),
    };

    match state.tokens.login(identity, device_label).await {
        Ok(pair) => HttpResponse::Ok().json(TokenResponse::from(pair)),
        Err(error) => handle_domain_error(&error),
    }
}
