//! Read-only port onto the external identity store.
//!
//! The identity store (user records, password hashes, roles) lives
//! outside this subsystem. The core reads it by opaque identifier only,
//! to mint fresh access-token claims at rotation time.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::session::SubjectIdentity;
use crate::errors::DomainResult;

/// Repository trait for looking up authenticated subjects
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Find a subject by its opaque identifier
    ///
    /// # Returns
    /// * `Ok(Some(SubjectIdentity))` - Subject found
    /// * `Ok(None)` - No subject with this identifier
    /// * `Err(DomainError)` - Lookup failed
    async fn find_subject(&self, subject_id: Uuid) -> DomainResult<Option<SubjectIdentity>>;
}
