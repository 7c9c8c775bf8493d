//! Configuration for the token service

use chrono::Duration;
use jsonwebtoken::Algorithm;

use crate::domain::entities::session::{
    ACCESS_TOKEN_EXPIRY_MINUTES, JWT_AUDIENCE, JWT_ISSUER, REFRESH_TOKEN_EXPIRY_DAYS,
};

/// Configuration for the token service
#[derive(Debug, Clone)]
pub struct TokenServiceConfig {
    /// JWT signing secret
    pub jwt_secret: String,
    /// JWT signing algorithm
    pub algorithm: Algorithm,
    /// Access token expiry in seconds
    pub access_token_expiry_seconds: i64,
    /// Refresh token expiry in seconds
    pub refresh_token_expiry_seconds: i64,
    /// Issuer claim pinned at verification
    pub issuer: String,
    /// Audience claim pinned at verification
    pub audience: String,
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "development-secret-please-change-in-production".to_string(),
            algorithm: Algorithm::HS256,
            access_token_expiry_seconds: ACCESS_TOKEN_EXPIRY_MINUTES * 60,
            refresh_token_expiry_seconds: REFRESH_TOKEN_EXPIRY_DAYS * 24 * 60 * 60,
            issuer: JWT_ISSUER.to_string(),
            audience: JWT_AUDIENCE.to_string(),
        }
    }
}

impl TokenServiceConfig {
    /// Build from the shared auth configuration
    pub fn from_auth_config(config: &pf_shared::AuthConfig) -> Self {
        Self {
            jwt_secret: config.jwt.secret.clone(),
            algorithm: Algorithm::HS256,
            access_token_expiry_seconds: config.jwt.access_token_expiry,
            refresh_token_expiry_seconds: config.jwt.refresh_token_expiry,
            issuer: config.jwt.issuer.clone(),
            audience: config.jwt.audience.clone(),
        }
    }

    /// Access token lifetime
    pub fn access_ttl(&self) -> Duration {
        Duration::seconds(self.access_token_expiry_seconds)
    }

    /// Refresh token lifetime
    pub fn refresh_ttl(&self) -> Duration {
        Duration::seconds(self.refresh_token_expiry_seconds)
    }
}
