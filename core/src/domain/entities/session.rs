//! Session and token entities for JWT-based authentication.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access token expiration time (15 minutes)
pub const ACCESS_TOKEN_EXPIRY_MINUTES: i64 = 15;

/// Refresh token expiration time (7 days)
pub const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 7;

/// JWT issuer
pub const JWT_ISSUER: &str = "plateful";

/// JWT audience
pub const JWT_AUDIENCE: &str = "plateful-api";

/// Authenticated subject as handed over by the identity store.
///
/// The core never validates credentials; it receives this as an
/// already-authenticated fact at login and re-reads it by `subject_id`
/// when minting fresh claims during rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectIdentity {
    /// Opaque user identifier owned by the identity store
    pub subject_id: Uuid,

    /// Email address carried into access token claims
    pub email: String,

    /// Role string owned by the identity store ("diner", "courier", ...)
    pub role: String,
}

/// Claims structure for the JWT access token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: String,

    /// Email address
    pub email: String,

    /// Role of the subject
    pub role: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Not before timestamp
    pub nbf: i64,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// JWT ID (unique identifier for the token)
    pub jti: String,
}

impl AccessClaims {
    /// Creates new claims for an access token with the given lifetime
    pub fn new(identity: &SubjectIdentity, ttl: Duration) -> Self {
        let now = Utc::now();
        let expiry = now + ttl;

        Self {
            sub: identity.subject_id.to_string(),
            email: identity.email.clone(),
            role: identity.role.clone(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
            nbf: now.timestamp(),
            iss: JWT_ISSUER.to_string(),
            aud: JWT_AUDIENCE.to_string(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Checks if the claims have expired
    pub fn is_expired(&self) -> bool {
        let now = Utc::now().timestamp();
        now >= self.exp
    }

    /// Gets the subject ID from the claims
    pub fn subject_id(&self) -> Result<Uuid, uuid::Error> {
        Uuid::parse_str(&self.sub)
    }
}

/// Lifecycle state of a refresh-token session row.
///
/// Exactly one row per family may be `Active`. Rotation moves the
/// current row to `Rotated` in the same atomic step that decides the
/// winner; logout moves rows to `Revoked`. Dead rows are retained until
/// the sweeper reclaims them so reuse stays detectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Active,
    Rotated,
    Revoked,
}

impl SessionState {
    /// Database/wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Active => "active",
            SessionState::Rotated => "rotated",
            SessionState::Revoked => "revoked",
        }
    }

    /// Parse the database representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(SessionState::Active),
            "rotated" => Some(SessionState::Rotated),
            "revoked" => Some(SessionState::Revoked),
            _ => None,
        }
    }
}

/// Refresh-token session entity stored in the database.
///
/// One row per issued refresh token. The raw token never touches
/// storage; only its SHA-256 digest is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier for the session row
    pub id: Uuid,

    /// SHA-256 hex digest of the opaque refresh token
    pub token_hash: String,

    /// Device lineage this token descends from; stable across rotations
    pub family_id: Uuid,

    /// Subject this session belongs to
    pub subject_id: Uuid,

    /// Lifecycle state
    pub state: SessionState,

    /// Timestamp when the session was created
    pub issued_at: DateTime<Utc>,

    /// Timestamp when the refresh token expires
    pub expires_at: DateTime<Utc>,

    /// Timestamp of the last successful rotation using this row
    pub last_used_at: Option<DateTime<Utc>>,

    /// User-agent summary for the device listing, if captured
    pub device_label: Option<String>,
}

impl Session {
    /// Creates a new active session row
    pub fn new(
        subject_id: Uuid,
        family_id: Uuid,
        token_hash: String,
        ttl: Duration,
        device_label: Option<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            token_hash,
            family_id,
            subject_id,
            state: SessionState::Active,
            issued_at: now,
            expires_at: now + ttl,
            last_used_at: None,
            device_label,
        }
    }

    /// Checks if the session has expired
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Checks if the session can still be rotated
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active && !self.is_expired()
    }

    /// Marks the session as consumed by a successful rotation
    pub fn rotate(&mut self) {
        self.state = SessionState::Rotated;
        self.last_used_at = Some(Utc::now());
    }

    /// Revokes the session
    pub fn revoke(&mut self) {
        self.state = SessionState::Revoked;
    }
}

/// Token pair returned to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// JWT access token
    pub access_token: String,

    /// Opaque refresh token; stored and replayed verbatim by clients
    pub refresh_token: String,

    /// Access token expiry time in seconds
    pub access_expires_in: i64,

    /// Refresh token expiry time in seconds
    pub refresh_expires_in: i64,
}

impl TokenPair {
    /// Creates a new token pair with explicit expiry windows
    pub fn new(
        access_token: String,
        refresh_token: String,
        access_expires_in: i64,
        refresh_expires_in: i64,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            access_expires_in,
            refresh_expires_in,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> SubjectIdentity {
        SubjectIdentity {
            subject_id: Uuid::new_v4(),
            email: "diner@example.com".to_string(),
            role: "diner".to_string(),
        }
    }

    #[test]
    fn test_access_claims() {
        let identity = identity();
        let claims = AccessClaims::new(&identity, Duration::minutes(ACCESS_TOKEN_EXPIRY_MINUTES));

        assert_eq!(claims.sub, identity.subject_id.to_string());
        assert_eq!(claims.email, identity.email);
        assert_eq!(claims.role, "diner");
        assert_eq!(claims.iss, JWT_ISSUER);
        assert_eq!(claims.aud, JWT_AUDIENCE);
        assert!(!claims.is_expired());
        assert_eq!(claims.subject_id().unwrap(), identity.subject_id);
    }

    #[test]
    fn test_access_claims_expiration() {
        let claims = AccessClaims::new(&identity(), Duration::seconds(-1));
        assert!(claims.is_expired());
    }

    #[test]
    fn test_session_creation() {
        let subject_id = Uuid::new_v4();
        let family_id = Uuid::new_v4();
        let session = Session::new(
            subject_id,
            family_id,
            "hash".to_string(),
            Duration::days(REFRESH_TOKEN_EXPIRY_DAYS),
            Some("iPhone / Plateful 2.4".to_string()),
        );

        assert_eq!(session.subject_id, subject_id);
        assert_eq!(session.family_id, family_id);
        assert_eq!(session.state, SessionState::Active);
        assert!(session.is_active());
        assert!(session.last_used_at.is_none());
    }

    #[test]
    fn test_session_rotation_transition() {
        let mut session = Session::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "hash".to_string(),
            Duration::days(7),
            None,
        );

        session.rotate();

        assert_eq!(session.state, SessionState::Rotated);
        assert!(session.last_used_at.is_some());
        assert!(!session.is_active());
    }

    #[test]
    fn test_session_revocation() {
        let mut session = Session::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "hash".to_string(),
            Duration::days(7),
            None,
        );

        session.revoke();

        assert_eq!(session.state, SessionState::Revoked);
        assert!(!session.is_active());
    }

    #[test]
    fn test_expired_session_is_not_active() {
        let mut session = Session::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "hash".to_string(),
            Duration::days(7),
            None,
        );
        session.expires_at = Utc::now() - Duration::seconds(1);

        assert_eq!(session.state, SessionState::Active);
        assert!(!session.is_active());
    }

    #[test]
    fn test_session_state_round_trip() {
        for state in [
            SessionState::Active,
            SessionState::Rotated,
            SessionState::Revoked,
        ] {
            assert_eq!(SessionState::parse(state.as_str()), Some(state));
        }
        assert_eq!(SessionState::parse("unknown"), None);
    }

    #[test]
    fn test_token_pair_serialization() {
        let pair = TokenPair::new(
            "access".to_string(),
            "refresh".to_string(),
            900,
            604800,
        );

        let json = serde_json::to_string(&pair).unwrap();
        let deserialized: TokenPair = serde_json::from_str(&json).unwrap();

        assert_eq!(pair, deserialized);
    }
}
