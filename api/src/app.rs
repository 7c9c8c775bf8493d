//! Application wiring for the session endpoints

use std::sync::Arc;

use actix_web::dev::HttpServiceFactory;
use actix_web::{web, HttpResponse};

use pf_core::repositories::{IdentityRepository, SessionRepository};

use crate::middleware::auth::{AccessTokenVerifier, JwtAuth};
use crate::routes;

/// Builds the `/session` scope.
///
/// Login, refresh, and revoke authenticate through the refresh token
/// in their bodies; revoke-all and the device listing sit behind the
/// verification middleware.
pub fn session_scope<S, I>(verifier: Arc<dyn AccessTokenVerifier>) -> impl HttpServiceFactory
where
    S: SessionRepository + 'static,
    I: IdentityRepository + 'static,
{
    web::scope("/session")
        .route("", web::post().to(routes::session::login::<S, I>))
        .route("/refresh", web::post().to(routes::session::refresh::<S, I>))
        .route("/revoke", web::post().to(routes::session::revoke::<S, I>))
        .service(
            web::scope("")
                .wrap(JwtAuth::new(verifier))
                .route(
                    "/revoke-all",
                    web::post().to(routes::session::revoke_all::<S, I>),
                )
                .route(
                    "/active",
                    web::get().to(routes::session::active_sessions::<S, I>),
                ),
        )
}

/// Liveness probe
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "plateful-session",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
