//! JWT verification middleware for protecting API endpoints.
//!
//! Extracts the access credential from the Authorization header or the
//! access cookie, verifies it against the token codec, and injects the
//! caller's identity into the request context. This path is stateless:
//! it never touches the session store, so protected requests cost one
//! signature check and no I/O.
//!
//! Expired and invalid credentials are rejected with distinct codes so
//! clients can tell "please refresh" from "please re-authenticate".

use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorUnauthorized,
    http::header::AUTHORIZATION,
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
    task::{Context, Poll},
};
use uuid::Uuid;

use pf_core::domain::entities::session::AccessClaims;
use pf_core::errors::{DomainError, TokenError};
use pf_core::services::token::TokenCodec;

use crate::handlers::error_handler::AuthRejection;

/// Default cookie consulted when no Authorization header is present
const DEFAULT_ACCESS_COOKIE: &str = "pf_access";

/// Stateless access-token verification, implemented by the codec.
///
/// A dyn handle rather than a generic so the middleware type stays
/// simple; the implementation must not perform storage lookups.
pub trait AccessTokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<AccessClaims, DomainError>;
}

impl AccessTokenVerifier for TokenCodec {
    fn verify(&self, token: &str) -> Result<AccessClaims, DomainError> {
        TokenCodec::verify(self, token)
    }
}

/// Caller identity injected into requests that pass verification
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Subject ID extracted from JWT claims
    pub subject_id: Uuid,
    /// Email address from the claims
    pub email: String,
    /// Role string from the claims
    pub role: String,
    /// JWT ID for tracing
    pub jti: String,
}

impl AuthContext {
    /// Creates an authentication context from verified claims
    pub fn from_claims(claims: AccessClaims) -> Result<Self, DomainError> {
        let subject_id = claims
            .subject_id()
            .map_err(|_| DomainError::Token(TokenError::Invalid))?;
        Ok(Self {
            subject_id,
            email: claims.email,
            role: claims.role,
            jti: claims.jti,
        })
    }
}

/// JWT verification middleware factory
pub struct JwtAuth {
    verifier: Arc<dyn AccessTokenVerifier>,
    cookie_name: String,
}

impl JwtAuth {
    /// Creates the middleware around a verifier
    pub fn new(verifier: Arc<dyn AccessTokenVerifier>) -> Self {
        Self {
            verifier,
            cookie_name: DEFAULT_ACCESS_COOKIE.to_string(),
        }
    }

    /// Overrides the access cookie name
    pub fn with_cookie_name(mut self, cookie_name: impl Into<String>) -> Self {
        self.cookie_name = cookie_name.into();
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddleware {
            service: Rc::new(service),
            verifier: Arc::clone(&self.verifier),
            cookie_name: self.cookie_name.clone(),
        }))
    }
}

/// JWT verification middleware service
pub struct JwtAuthMiddleware<S> {
    service: Rc<S>,
    verifier: Arc<dyn AccessTokenVerifier>,
    cookie_name: String,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let verifier = Arc::clone(&self.verifier);
        let cookie_name = self.cookie_name.clone();

        Box::pin(async move {
            let token = match extract_credential(&req, &cookie_name) {
                Some(token) => token,
                None => return Err(AuthRejection::missing().into()),
            };

            let claims = match verifier.verify(&token) {
                Ok(claims) => claims,
                Err(DomainError::Token(TokenError::Expired)) => {
                    return Err(AuthRejection::expired().into());
                }
                Err(_) => return Err(AuthRejection::invalid().into()),
            };

            let auth_context = match AuthContext::from_claims(claims) {
                Ok(context) => context,
                Err(_) => return Err(AuthRejection::invalid().into()),
            };

            // Inject auth context into request extensions
            req.extensions_mut().insert(auth_context);

            service.call(req).await
        })
    }
}

/// Extracts the credential from the Authorization header, falling back
/// to the access cookie
fn extract_credential(req: &ServiceRequest, cookie_name: &str) -> Option<String> {
    if let Some(token) = extract_bearer_token(req) {
        return Some(token);
    }

    req.cookie(cookie_name).map(|c| c.value().to_string())
}

/// Extracts a Bearer token from the Authorization header
fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|s| s.to_string())
}

/// Extractor for required authentication
impl FromRequest for AuthContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let result = req
            .extensions()
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| ErrorUnauthorized("Authentication required"));

        ready(result)
    }
}
