//! Token rotation engine
//!
//! Exchanges a valid refresh token for a new access token and a new
//! refresh token, atomically retiring the old one. The session store's
//! conditional update is the sole ordering authority: whichever
//! concurrent rotation is applied first wins, every other caller
//! observes the consumed row and is treated as a replay.

use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::entities::session::{AccessClaims, Session, SubjectIdentity, TokenPair};
use crate::errors::{DomainError, SessionError, TokenError};
use crate::repositories::{IdentityRepository, RotationOutcome, SessionRepository};

use super::codec::TokenCodec;
use super::config::TokenServiceConfig;

/// Length of the opaque refresh token material
const REFRESH_TOKEN_LENGTH: usize = 48;

/// Rotation attempts against a store reporting `Unavailable`
const MAX_ROTATE_ATTEMPTS: u32 = 3;

/// Initial retry delay; doubles per attempt
const RETRY_BASE_DELAY_MS: u64 = 100;

/// Service for managing the refresh-token session lifecycle
pub struct TokenService<S: SessionRepository, I: IdentityRepository> {
    sessions: S,
    identities: I,
    codec: TokenCodec,
    config: TokenServiceConfig,
}

impl<S: SessionRepository, I: IdentityRepository> TokenService<S, I> {
    /// Creates a new token service instance
    pub fn new(sessions: S, identities: I, config: TokenServiceConfig) -> Self {
        let codec = TokenCodec::new(&config);
        Self {
            sessions,
            identities,
            codec,
            config,
        }
    }

    /// The codec used for access tokens, for sharing with the
    /// verification middleware
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Opens a new session family for an authenticated subject
    ///
    /// Called after the identity collaborator has authenticated the
    /// user. Mints a fresh family ID (one per device/login event),
    /// stores the hashed refresh token as the family's first active
    /// row, and issues the access token.
    pub async fn login(
        &self,
        identity: SubjectIdentity,
        device_label: Option<String>,
    ) -> Result<TokenPair, DomainError> {
        let family_id = Uuid::new_v4();
        let raw_refresh = Self::generate_refresh_material();

        let session = Session::new(
            identity.subject_id,
            family_id,
            Self::hash_token(&raw_refresh),
            self.config.refresh_ttl(),
            device_label,
        );
        self.sessions.create(session).await?;

        let access_token = self.codec.issue(&identity)?;

        info!(subject = %identity.subject_id, family = %family_id, "session family opened");

        Ok(TokenPair::new(
            access_token,
            raw_refresh,
            self.config.access_token_expiry_seconds,
            self.config.refresh_token_expiry_seconds,
        ))
    }

    /// Rotates a refresh token
    ///
    /// The presented token is consumed atomically; exactly one of any
    /// number of concurrent calls carrying the same token wins. A
    /// presented token that was already rotated or revoked is treated
    /// as probable theft: the whole family is revoked and the caller
    /// gets `ReuseDetected`. Unknown or expired tokens fail with
    /// `InvalidRefreshToken`.
    pub async fn refresh(&self, raw_refresh: &str) -> Result<TokenPair, DomainError> {
        let token_hash = Self::hash_token(raw_refresh);

        match self.rotate_with_retry(&token_hash).await? {
            RotationOutcome::Rotated(consumed) => self.issue_successor(consumed).await,
            RotationOutcome::AlreadyConsumed(consumed) => {
                warn!(
                    subject = %consumed.subject_id,
                    family = %consumed.family_id,
                    "refresh token replayed; revoking session family"
                );
                // Best effort: the reuse verdict stands even if the
                // family sweep hits a store hiccup
                if let Err(e) = self.sessions.revoke_family(consumed.family_id).await {
                    warn!(family = %consumed.family_id, error = %e, "family revocation failed");
                }
                Err(TokenError::ReuseDetected.into())
            }
            RotationOutcome::NotFound => Err(TokenError::InvalidRefreshToken.into()),
        }
    }

    /// Revokes a single session (logout). Idempotent.
    pub async fn revoke(&self, raw_refresh: &str) -> Result<bool, DomainError> {
        let token_hash = Self::hash_token(raw_refresh);
        self.sessions.revoke(&token_hash).await
    }

    /// Revokes every session for a subject (logout-all)
    pub async fn revoke_all(&self, subject_id: Uuid) -> Result<usize, DomainError> {
        let count = self.sessions.revoke_all_for_subject(subject_id).await?;
        info!(subject = %subject_id, count, "all sessions revoked");
        Ok(count)
    }

    /// Lists active sessions for a subject (device-management view)
    pub async fn list_sessions(&self, subject_id: Uuid) -> Result<Vec<Session>, DomainError> {
        self.sessions.list_active(subject_id).await
    }

    /// Verifies an access token and returns the claims
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, DomainError> {
        self.codec.verify(token)
    }

    /// Creates the successor row for a consumed session and issues the
    /// new token pair
    async fn issue_successor(&self, consumed: Session) -> Result<TokenPair, DomainError> {
        let identity = self
            .identities
            .find_subject(consumed.subject_id)
            .await?
            .ok_or(TokenError::InvalidRefreshToken)?;

        let raw_refresh = Self::generate_refresh_material();
        let successor = Session::new(
            consumed.subject_id,
            consumed.family_id,
            Self::hash_token(&raw_refresh),
            self.config.refresh_ttl(),
            consumed.device_label.clone(),
        );
        self.sessions.create(successor).await?;

        let access_token = self.codec.issue(&identity)?;

        info!(
            subject = %consumed.subject_id,
            family = %consumed.family_id,
            "refresh token rotated"
        );

        Ok(TokenPair::new(
            access_token,
            raw_refresh,
            self.config.access_token_expiry_seconds,
            self.config.refresh_token_expiry_seconds,
        ))
    }

    /// Attempts the atomic rotation, retrying transient store outages
    ///
    /// `Unavailable` must never surface as an authentication failure:
    /// once retries are exhausted it propagates as-is, so the caller
    /// sees a transient error rather than a forced logout.
    async fn rotate_with_retry(&self, token_hash: &str) -> Result<RotationOutcome, DomainError> {
        let mut delay_ms = RETRY_BASE_DELAY_MS;

        for attempt in 1..=MAX_ROTATE_ATTEMPTS {
            match self.sessions.try_rotate(token_hash).await {
                Err(DomainError::Session(SessionError::Unavailable(reason)))
                    if attempt < MAX_ROTATE_ATTEMPTS =>
                {
                    warn!(attempt, reason = %reason, "session store unavailable, retrying rotation");
                    tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                    delay_ms *= 2;
                }
                other => return other,
            }
        }

        unreachable!("rotation retry loop always returns")
    }

    /// Generates opaque, unguessable refresh token material
    fn generate_refresh_material() -> String {
        let mut rng = rand::thread_rng();
        (0..REFRESH_TOKEN_LENGTH)
            .map(|_| {
                let idx = rng.gen_range(0..62);
                match idx {
                    0..10 => (b'0' + idx) as char,
                    10..36 => (b'a' + idx - 10) as char,
                    36..62 => (b'A' + idx - 36) as char,
                    _ => unreachable!(),
                }
            })
            .collect()
    }

    /// Hashes a refresh token for storage
    pub(crate) fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
