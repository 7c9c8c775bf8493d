//! Integration tests for the session lifecycle endpoints

use std::collections::HashMap;
use std::sync::Arc;

use actix_web::{test, web, App};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use pf_api::app::session_scope;
use pf_api::middleware::auth::AccessTokenVerifier;
use pf_api::routes::AppState;
use pf_core::domain::entities::session::{Session, SessionState, SubjectIdentity};
use pf_core::errors::{DomainError, DomainResult};
use pf_core::repositories::{
    IdentityRepository, RotationOutcome, SessionRepository,
};
use pf_core::services::token::{TokenCodec, TokenService, TokenServiceConfig};

/// In-memory session store mirroring the conditional-update semantics
/// of the MySQL implementation
#[derive(Clone, Default)]
struct InMemorySessionRepository {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self, session: Session) -> DomainResult<Session> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.token_hash) {
            return Err(DomainError::Internal {
                message: "duplicate token hash".to_string(),
            });
        }
        sessions.insert(session.token_hash.clone(), session.clone());
        Ok(session)
    }

    async fn find_by_hash(&self, token_hash: &str) -> DomainResult<Option<Session>> {
        Ok(self.sessions.read().await.get(token_hash).cloned())
    }

    async fn try_rotate(&self, token_hash: &str) -> DomainResult<RotationOutcome> {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(token_hash) else {
            return Ok(RotationOutcome::NotFound);
        };
        if session.is_expired() {
            return Ok(RotationOutcome::NotFound);
        }
        match session.state {
            SessionState::Active => {
                session.rotate();
                Ok(RotationOutcome::Rotated(session.clone()))
            }
            _ => Ok(RotationOutcome::AlreadyConsumed(session.clone())),
        }
    }

    async fn revoke(&self, token_hash: &str) -> DomainResult<bool> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(token_hash) {
            Some(session) if session.state == SessionState::Active => {
                session.revoke();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_family(&self, family_id: Uuid) -> DomainResult<usize> {
        let mut sessions = self.sessions.write().await;
        let mut count = 0;
        for session in sessions.values_mut() {
            if session.family_id == family_id && session.state != SessionState::Revoked {
                session.revoke();
                count += 1;
            }
        }
        Ok(count)
    }

    async fn revoke_all_for_subject(&self, subject_id: Uuid) -> DomainResult<usize> {
        let mut sessions = self.sessions.write().await;
        let mut count = 0;
        for session in sessions.values_mut() {
            if session.subject_id == subject_id && session.state != SessionState::Revoked {
                session.revoke();
                count += 1;
            }
        }
        Ok(count)
    }

    async fn list_active(&self, subject_id: Uuid) -> DomainResult<Vec<Session>> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.subject_id == subject_id && s.is_active())
            .cloned()
            .collect())
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> DomainResult<usize> {
        let mut sessions = self.sessions.write().await;
        let initial = sessions.len();
        sessions.retain(|_, s| s.state == SessionState::Active || s.expires_at >= cutoff);
        Ok(initial - sessions.len())
    }
}

/// Identity port stub accepting every subject, echoing the facts that
/// would come from the identity store
#[derive(Clone, Default)]
struct InMemoryIdentityRepository {
    subjects: Arc<RwLock<HashMap<Uuid, SubjectIdentity>>>,
}

impl InMemoryIdentityRepository {
    async fn insert(&self, identity: SubjectIdentity) {
        self.subjects
            .write()
            .await
            .insert(identity.subject_id, identity);
    }
}

#[async_trait]
impl IdentityRepository for InMemoryIdentityRepository {
    async fn find_subject(&self, subject_id: Uuid) -> DomainResult<Option<SubjectIdentity>> {
        Ok(self.subjects.read().await.get(&subject_id).cloned())
    }
}

struct TestContext {
    identities: InMemoryIdentityRepository,
    state: web::Data<AppState<InMemorySessionRepository, InMemoryIdentityRepository>>,
    verifier: Arc<dyn AccessTokenVerifier>,
}

fn context() -> TestContext {
    let sessions = InMemorySessionRepository::default();
    let identities = InMemoryIdentityRepository::default();
    let config = TokenServiceConfig::default();
    let verifier: Arc<dyn AccessTokenVerifier> = Arc::new(TokenCodec::new(&config));

    let state = web::Data::new(AppState {
        tokens: Arc::new(TokenService::new(
            sessions,
            identities.clone(),
            config,
        )),
    });

    TestContext {
        identities,
        state,
        verifier,
    }
}

macro_rules! session_app {
    ($ctx:expr) => {
        test::init_service(
            App::new().app_data($ctx.state.clone()).service(
                web::scope("/api/v1").service(session_scope::<
                    InMemorySessionRepository,
                    InMemoryIdentityRepository,
                >(Arc::clone(&$ctx.verifier))),
            ),
        )
        .await
    };
}

fn login_body(subject_id: Uuid) -> serde_json::Value {
    serde_json::json!({
        "subject_id": subject_id.to_string(),
        "email": "diner@example.com",
        "role": "diner",
        "device_label": "iPhone / Plateful 2.4"
    })
}

async fn seeded_subject(ctx: &TestContext) -> Uuid {
    let subject_id = Uuid::new_v4();
    ctx.identities
        .insert(SubjectIdentity {
            subject_id,
            email: "diner@example.com".to_string(),
            role: "diner".to_string(),
        })
        .await;
    subject_id
}

#[actix_web::test]
async fn test_login_returns_token_pair() {
    let ctx = context();
    let app = session_app!(ctx);
    let subject_id = seeded_subject(&ctx).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/session")
        .set_json(login_body(subject_id))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(!body["access_token"].as_str().unwrap().is_empty());
    assert!(!body["refresh_token"].as_str().unwrap().is_empty());
    assert_eq!(body["access_expires_in"], 900);
    assert_eq!(body["refresh_expires_in"], 604800);
}

#[actix_web::test]
async fn test_login_validates_subject_facts() {
    let ctx = context();
    let app = session_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/v1/session")
        .set_json(serde_json::json!({
            "subject_id": Uuid::new_v4().to_string(),
            "email": "not-an-email",
            "role": "diner"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "VALIDATION_FAILED");
}

#[actix_web::test]
async fn test_refresh_rotates_and_replay_is_reuse() {
    let ctx = context();
    let app = session_app!(ctx);
    let subject_id = seeded_subject(&ctx).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/session")
        .set_json(login_body(subject_id))
        .to_request();
    let login: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    let first_refresh = login["refresh_token"].as_str().unwrap().to_string();

    // Rotation succeeds and hands out a different refresh token
    let req = test::TestRequest::post()
        .uri("/api/v1/session/refresh")
        .set_json(serde_json::json!({ "refresh_token": first_refresh }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let rotated: serde_json::Value = test::read_body_json(resp).await;
    assert_ne!(rotated["refresh_token"], login["refresh_token"]);

    // Replaying the consumed token is flagged as reuse, not merely invalid
    let req = test::TestRequest::post()
        .uri("/api/v1/session/refresh")
        .set_json(serde_json::json!({ "refresh_token": first_refresh }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "REFRESH_REUSE_DETECTED");

    // The reuse burned the family: the rotated token is dead too
    let req = test::TestRequest::post()
        .uri("/api/v1/session/refresh")
        .set_json(serde_json::json!({ "refresh_token": rotated["refresh_token"] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn test_unknown_refresh_token_is_invalid() {
    let ctx = context();
    let app = session_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/v1/session/refresh")
        .set_json(serde_json::json!({ "refresh_token": "never-issued" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "INVALID_REFRESH_TOKEN");
}

#[actix_web::test]
async fn test_revoke_is_idempotent() {
    let ctx = context();
    let app = session_app!(ctx);
    let subject_id = seeded_subject(&ctx).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/session")
        .set_json(login_body(subject_id))
        .to_request();
    let login: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    let refresh_token = login["refresh_token"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/v1/session/revoke")
        .set_json(serde_json::json!({ "refresh_token": refresh_token }))
        .to_request();
    let body: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["revoked"], true);

    let req = test::TestRequest::post()
        .uri("/api/v1/session/revoke")
        .set_json(serde_json::json!({ "refresh_token": refresh_token }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["revoked"], false);
}

#[actix_web::test]
async fn test_revoke_all_requires_auth_and_clears_devices() {
    let ctx = context();
    let app = session_app!(ctx);
    let subject_id = seeded_subject(&ctx).await;

    // Two devices
    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/api/v1/session")
            .set_json(login_body(subject_id))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);
    }

    // Unauthenticated revoke-all is rejected by the middleware
    let req = test::TestRequest::post()
        .uri("/api/v1/session/revoke-all")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);

    // Authenticated revoke-all clears both sessions
    let req = test::TestRequest::post()
        .uri("/api/v1/session")
        .set_json(login_body(subject_id))
        .to_request();
    let login: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    let access = login["access_token"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/v1/session/revoke-all")
        .insert_header(("Authorization", format!("Bearer {}", access)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["revoked"], 3);

    // The device view is empty afterwards; the access token itself is
    // stateless and still verifies
    let req = test::TestRequest::get()
        .uri("/api/v1/session/active")
        .insert_header(("Authorization", format!("Bearer {}", access)))
        .to_request();
    let body: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["sessions"].as_array().unwrap().len(), 0);
}

#[actix_web::test]
async fn test_active_sessions_lists_devices_without_token_material() {
    let ctx = context();
    let app = session_app!(ctx);
    let subject_id = seeded_subject(&ctx).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/session")
        .set_json(login_body(subject_id))
        .to_request();
    let login: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    let access = login["access_token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/v1/session/active")
        .insert_header(("Authorization", format!("Bearer {}", access)))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let sessions = body["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["device_label"], "iPhone / Plateful 2.4");
    assert!(sessions[0].get("token_hash").is_none());
}
