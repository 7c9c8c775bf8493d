//! # Plateful Core
//!
//! Core business logic and domain layer for the Plateful backend.
//! This crate contains the authentication session domain: entities,
//! repository interfaces, the token rotation engine, the background
//! session sweeper, and the client-side refresh coalescer.

pub mod client;
pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
