//! Session repository trait defining the interface for refresh-token
//! session persistence.
//!
//! All mutation of session rows goes through this trait, so the
//! invariant "at most one active row per family" is enforced in one
//! place. The central primitive is `try_rotate`: a single conditional
//! state transition whose outcome tells the rotation engine whether it
//! won the race, lost it to a replay, or presented a dead token.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::session::Session;
use crate::errors::DomainResult;

/// Result of the atomic rotation attempt on a session row.
#[derive(Debug, Clone)]
pub enum RotationOutcome {
    /// The row was active and unexpired; it is now rotated. Carries the
    /// consumed row so the caller can chain the successor.
    Rotated(Session),

    /// The row exists and is unexpired but was already rotated or
    /// revoked - the reuse signal.
    AlreadyConsumed(Session),

    /// No such row, or the row is past its expiry.
    NotFound,
}

/// Repository trait for Session entity persistence operations
///
/// # Concurrency
/// `try_rotate` must be implemented as a single conditional update
/// (compare-and-swap on the state column), never as separate read and
/// write calls. Whichever concurrent caller's update is applied first
/// by the store wins; every other caller must observe
/// `AlreadyConsumed`.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a new session row
    ///
    /// # Returns
    /// * `Ok(Session)` - The saved session
    /// * `Err(DomainError)` - Save failed (e.g., duplicate token hash)
    async fn create(&self, session: Session) -> DomainResult<Session>;

    /// Find a session by its hashed refresh token
    async fn find_by_hash(&self, token_hash: &str) -> DomainResult<Option<Session>>;

    /// Atomically transition a session from active to rotated
    ///
    /// The transition applies only if the row is currently active and
    /// unexpired; zero rows affected is the race/replay signal and is
    /// classified into `AlreadyConsumed` or `NotFound`.
    async fn try_rotate(&self, token_hash: &str) -> DomainResult<RotationOutcome>;

    /// Revoke a single session (logout)
    ///
    /// # Returns
    /// * `Ok(true)` - Session was active and is now revoked
    /// * `Ok(false)` - Session not found or already inactive
    async fn revoke(&self, token_hash: &str) -> DomainResult<bool>;

    /// Revoke every session in a family (breach response)
    ///
    /// Idempotent: revoking an already-revoked family is a no-op.
    ///
    /// # Returns
    /// Number of rows transitioned to revoked by this call
    async fn revoke_family(&self, family_id: Uuid) -> DomainResult<usize>;

    /// Revoke every session belonging to a subject (logout-all)
    async fn revoke_all_for_subject(&self, subject_id: Uuid) -> DomainResult<usize>;

    /// List active, unexpired sessions for a subject (device view)
    async fn list_active(&self, subject_id: Uuid) -> DomainResult<Vec<Session>>;

    /// Delete dead session rows past the retention cutoff
    ///
    /// Removes rows that are no longer active and whose `expires_at`
    /// lies before `cutoff`. Active rows are never deleted here, and
    /// recently-dead rows inside the grace window are kept so reuse
    /// stays diagnosable.
    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> DomainResult<usize>;
}
