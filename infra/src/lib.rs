//! # Infrastructure Layer
//!
//! Concrete implementations of the `pf_core` ports: the MySQL session
//! store (via SQLx) and the read-only identity lookup. The session
//! store is the only shared mutable resource in the subsystem; every
//! mutation goes through the repository trait so the "one active row
//! per family" invariant is enforced in one place.

pub mod database;

// Re-export commonly used types
pub use database::{create_pool, MySqlIdentityRepository, MySqlSessionRepository};

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
