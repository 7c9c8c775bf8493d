//! Stateless access-token codec
//!
//! Signs and verifies the short-lived access credential. A pure
//! function of the secret key and the claims: no I/O, no storage
//! lookups, so it can sit on every request's hot path.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::domain::entities::session::{AccessClaims, SubjectIdentity};
use crate::errors::{DomainError, TokenError};

use super::config::TokenServiceConfig;

/// Codec for issuing and verifying JWT access tokens
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    header: Header,
    access_ttl: chrono::Duration,
}

impl TokenCodec {
    /// Creates a codec from the token service configuration
    pub fn new(config: &TokenServiceConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::new(config.algorithm);
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        // Expiry drives the refresh protocol; no clock slack
        validation.leeway = 0;

        Self {
            encoding_key,
            decoding_key,
            validation,
            header: Header::new(config.algorithm),
            access_ttl: config.access_ttl(),
        }
    }

    /// Issues a signed access token for the subject
    pub fn issue(&self, identity: &SubjectIdentity) -> Result<String, DomainError> {
        self.issue_with_ttl(identity, self.access_ttl)
    }

    /// Issues a signed access token with an explicit lifetime
    pub fn issue_with_ttl(
        &self,
        identity: &SubjectIdentity,
        ttl: chrono::Duration,
    ) -> Result<String, DomainError> {
        let claims = AccessClaims::new(identity, ttl);
        encode(&self.header, &claims, &self.encoding_key)
            .map_err(|_| DomainError::Token(TokenError::GenerationFailed))
    }

    /// Verifies an access token and returns the claims
    ///
    /// Expiry and signature failures map to distinct errors: `Expired`
    /// means the caller should refresh, `Invalid` means the token is
    /// garbage and the caller must re-authenticate.
    pub fn verify(&self, token: &str) -> Result<AccessClaims, DomainError> {
        let token_data =
            decode::<AccessClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                if e.kind() == &jsonwebtoken::errors::ErrorKind::ExpiredSignature {
                    DomainError::Token(TokenError::Expired)
                } else {
                    DomainError::Token(TokenError::Invalid)
                }
            })?;

        Ok(token_data.claims)
    }
}
