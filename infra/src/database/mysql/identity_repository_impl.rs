//! Read-only MySQL view onto the identity store's user table.
//!
//! The identity store owns this table; the session core only ever
//! reads `id`, `email`, and `role` by opaque identifier.

use async_trait::async_trait;
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use pf_core::domain::entities::session::SubjectIdentity;
use pf_core::errors::{DomainError, DomainResult, SessionError};
use pf_core::repositories::IdentityRepository;

/// MySQL implementation of IdentityRepository
pub struct MySqlIdentityRepository {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlIdentityRepository {
    /// Create a new MySQL identity repository
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityRepository for MySqlIdentityRepository {
    async fn find_subject(&self, subject_id: Uuid) -> DomainResult<Option<SubjectIdentity>> {
        let query = r#"
            SELECT id, email, role
            FROM users
            WHERE id = ?
            LIMIT 1
        "#;

        let result = sqlx::query(query)
            .bind(subject_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::Session(SessionError::Unavailable(e.to_string())))?;

        let Some(row) = result else {
            return Ok(None);
        };

        let id: String = row.try_get("id").map_err(|e| DomainError::Internal {
            message: format!("Failed to get id: {}", e),
        })?;

        Ok(Some(SubjectIdentity {
            subject_id: Uuid::parse_str(&id).map_err(|e| DomainError::Internal {
                message: format!("Invalid user UUID: {}", e),
            })?,
            email: row.try_get("email").map_err(|e| DomainError::Internal {
                message: format!("Failed to get email: {}", e),
            })?,
            role: row.try_get("role").map_err(|e| DomainError::Internal {
                message: format!("Failed to get role: {}", e),
            })?,
        }))
    }
}
