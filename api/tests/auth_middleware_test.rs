//! Integration tests for the JWT verification middleware

use std::sync::Arc;

use actix_web::{test, web, App, HttpResponse};
use chrono::Duration;
use uuid::Uuid;

use pf_api::middleware::auth::{AuthContext, JwtAuth};
use pf_core::domain::entities::session::SubjectIdentity;
use pf_core::services::token::{TokenCodec, TokenServiceConfig};

fn codec() -> TokenCodec {
    TokenCodec::new(&TokenServiceConfig::default())
}

fn identity() -> SubjectIdentity {
    SubjectIdentity {
        subject_id: Uuid::new_v4(),
        email: "diner@example.com".to_string(),
        role: "diner".to_string(),
    }
}

async fn whoami(auth: AuthContext) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "subject_id": auth.subject_id.to_string(),
        "email": auth.email,
        "role": auth.role,
    }))
}

macro_rules! protected_app {
    ($codec:expr) => {
        test::init_service(
            App::new()
                .wrap(JwtAuth::new(Arc::new($codec)))
                .route("/protected", web::get().to(whoami)),
        )
        .await
    };
}

#[actix_web::test]
async fn test_missing_credential_is_rejected() {
    let app = protected_app!(codec());

    let req = test::TestRequest::get().uri("/protected").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "MISSING_CREDENTIALS");
}

#[actix_web::test]
async fn test_valid_bearer_token_passes_and_injects_identity() {
    let codec = codec();
    let identity = identity();
    let token = codec.issue(&identity).unwrap();
    let app = protected_app!(codec);

    let req = test::TestRequest::get()
        .uri("/protected")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["subject_id"], identity.subject_id.to_string());
    assert_eq!(body["email"], "diner@example.com");
    assert_eq!(body["role"], "diner");
}

#[actix_web::test]
async fn test_expired_token_gets_distinct_status_code() {
    let codec = codec();
    let token = codec
        .issue_with_ttl(&identity(), Duration::seconds(-5))
        .unwrap();
    let app = protected_app!(codec);

    let req = test::TestRequest::get()
        .uri("/protected")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = test::read_body_json(resp).await;
    // "please refresh", not "please re-authenticate"
    assert_eq!(body["error"], "ACCESS_TOKEN_EXPIRED");
}

#[actix_web::test]
async fn test_garbage_token_is_invalid() {
    let app = protected_app!(codec());

    let req = test::TestRequest::get()
        .uri("/protected")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "ACCESS_TOKEN_INVALID");
}

#[actix_web::test]
async fn test_foreign_signature_is_invalid_not_expired() {
    let foreign_codec = TokenCodec::new(&TokenServiceConfig {
        jwt_secret: "someone-elses-secret".to_string(),
        ..TokenServiceConfig::default()
    });
    let token = foreign_codec.issue(&identity()).unwrap();
    let app = protected_app!(codec());

    let req = test::TestRequest::get()
        .uri("/protected")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "ACCESS_TOKEN_INVALID");
}

#[actix_web::test]
async fn test_cookie_transport_is_accepted() {
    let codec = codec();
    let identity = identity();
    let token = codec.issue(&identity).unwrap();
    let app = protected_app!(codec);

    let req = test::TestRequest::get()
        .uri("/protected")
        .cookie(actix_web::cookie::Cookie::new("pf_access", token))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["subject_id"], identity.subject_id.to_string());
}
