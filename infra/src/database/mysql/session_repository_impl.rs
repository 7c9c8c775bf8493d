//! MySQL implementation of the SessionRepository trait.
//!
//! The rotation primitive is a single conditional UPDATE: the row
//! moves from active to rotated only if it is still active and
//! unexpired, and `rows_affected()` reports whether this caller won.
//! MySQL's row-level atomicity serializes concurrent updates to the
//! same row, so no application-level lock exists anywhere in the
//! subsystem.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use pf_core::domain::entities::session::{Session, SessionState};
use pf_core::errors::{DomainError, DomainResult, SessionError};
use pf_core::repositories::{RotationOutcome, SessionRepository};

/// MySQL implementation of SessionRepository
pub struct MySqlSessionRepository {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlSessionRepository {
    /// Create a new MySQL session repository
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert database row to Session entity
    fn row_to_session(row: &sqlx::mysql::MySqlRow) -> DomainResult<Session> {
        let id: String = row
            .try_get("id")
            .map_err(|e| internal(format!("Failed to get id: {}", e)))?;
        let family_id: String = row
            .try_get("family_id")
            .map_err(|e| internal(format!("Failed to get family_id: {}", e)))?;
        let subject_id: String = row
            .try_get("subject_id")
            .map_err(|e| internal(format!("Failed to get subject_id: {}", e)))?;
        let state: String = row
            .try_get("state")
            .map_err(|e| internal(format!("Failed to get state: {}", e)))?;

        Ok(Session {
            id: Uuid::parse_str(&id)
                .map_err(|e| internal(format!("Invalid session UUID: {}", e)))?,
            token_hash: row
                .try_get("token_hash")
                .map_err(|e| internal(format!("Failed to get token_hash: {}", e)))?,
            family_id: Uuid::parse_str(&family_id)
                .map_err(|e| internal(format!("Invalid family UUID: {}", e)))?,
            subject_id: Uuid::parse_str(&subject_id)
                .map_err(|e| internal(format!("Invalid subject UUID: {}", e)))?,
            state: SessionState::parse(&state)
                .ok_or_else(|| internal(format!("Unknown session state: {}", state)))?,
            issued_at: row
                .try_get::<DateTime<Utc>, _>("issued_at")
                .map_err(|e| internal(format!("Failed to get issued_at: {}", e)))?,
            expires_at: row
                .try_get::<DateTime<Utc>, _>("expires_at")
                .map_err(|e| internal(format!("Failed to get expires_at: {}", e)))?,
            last_used_at: row
                .try_get::<Option<DateTime<Utc>>, _>("last_used_at")
                .map_err(|e| internal(format!("Failed to get last_used_at: {}", e)))?,
            device_label: row
                .try_get::<Option<String>, _>("device_label")
                .map_err(|e| internal(format!("Failed to get device_label: {}", e)))?,
        })
    }
}

/// Driver failures are transient store outages, not data errors
fn unavailable(e: sqlx::Error) -> DomainError {
    DomainError::Session(SessionError::Unavailable(e.to_string()))
}

fn internal(message: String) -> DomainError {
    DomainError::Internal { message }
}

#[async_trait]
impl SessionRepository for MySqlSessionRepository {
    async fn create(&self, session: Session) -> DomainResult<Session> {
        let query = r#"
            INSERT INTO sessions (
                id, token_hash, family_id, subject_id, state,
                issued_at, expires_at, last_used_at, device_label
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(session.id.to_string())
            .bind(&session.token_hash)
            .bind(session.family_id.to_string())
            .bind(session.subject_id.to_string())
            .bind(session.state.as_str())
            .bind(session.issued_at)
            .bind(session.expires_at)
            .bind(session.last_used_at)
            .bind(&session.device_label)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(session)
    }

    async fn find_by_hash(&self, token_hash: &str) -> DomainResult<Option<Session>> {
        let query = r#"
            SELECT id, token_hash, family_id, subject_id, state,
                   issued_at, expires_at, last_used_at, device_label
            FROM sessions
            WHERE token_hash = ?
            LIMIT 1
        "#;

        let result = sqlx::query(query)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;

        match result {
            Some(row) => Ok(Some(Self::row_to_session(&row)?)),
            None => Ok(None),
        }
    }

    async fn try_rotate(&self, token_hash: &str) -> DomainResult<RotationOutcome> {
        let now = Utc::now();

        // The conditional update is the race arbiter; zero rows
        // affected means this caller lost or the token is dead
        let query = r#"
            UPDATE sessions
            SET state = 'rotated', last_used_at = ?
            WHERE token_hash = ? AND state = 'active' AND expires_at > ?
        "#;

        let result = sqlx::query(query)
            .bind(now)
            .bind(token_hash)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        if result.rows_affected() > 0 {
            let consumed = self
                .find_by_hash(token_hash)
                .await?
                .ok_or_else(|| internal("rotated session row vanished".to_string()))?;
            return Ok(RotationOutcome::Rotated(consumed));
        }

        // Classify the loss: replayed dead token vs. unknown/expired
        match self.find_by_hash(token_hash).await? {
            Some(session) if !session.is_expired() => {
                Ok(RotationOutcome::AlreadyConsumed(session))
            }
            _ => Ok(RotationOutcome::NotFound),
        }
    }

    async fn revoke(&self, token_hash: &str) -> DomainResult<bool> {
        let query = r#"
            UPDATE sessions
            SET state = 'revoked'
            WHERE token_hash = ? AND state = 'active'
        "#;

        let result = sqlx::query(query)
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_family(&self, family_id: Uuid) -> DomainResult<usize> {
        let query = r#"
            UPDATE sessions
            SET state = 'revoked'
            WHERE family_id = ? AND state != 'revoked'
        "#;

        let result = sqlx::query(query)
            .bind(family_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(result.rows_affected() as usize)
    }

    async fn revoke_all_for_subject(&self, subject_id: Uuid) -> DomainResult<usize> {
        let query = r#"
            UPDATE sessions
            SET state = 'revoked'
            WHERE subject_id = ? AND state != 'revoked'
        "#;

        let result = sqlx::query(query)
            .bind(subject_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(result.rows_affected() as usize)
    }

    async fn list_active(&self, subject_id: Uuid) -> DomainResult<Vec<Session>> {
        let query = r#"
            SELECT id, token_hash, family_id, subject_id, state,
                   issued_at, expires_at, last_used_at, device_label
            FROM sessions
            WHERE subject_id = ?
                AND state = 'active'
                AND expires_at > ?
            ORDER BY issued_at DESC
        "#;

        let rows = sqlx::query(query)
            .bind(subject_id.to_string())
            .bind(Utc::now())
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(Self::row_to_session(&row)?);
        }

        Ok(sessions)
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> DomainResult<usize> {
        let query = r#"
            DELETE FROM sessions
            WHERE state != 'active' AND expires_at < ?
        "#;

        let result = sqlx::query(query)
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(result.rows_affected() as usize)
    }
}
