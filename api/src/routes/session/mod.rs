//! Session lifecycle route handlers
//!
//! This module contains the token lifecycle endpoints:
//! - Login (open a session family)
//! - Refresh (rotate the refresh token)
//! - Revoke (logout one device)
//! - Revoke-all (logout everywhere)
//! - Active (device-management listing)

pub mod active;
pub mod login;
pub mod refresh;
pub mod revoke;
pub mod revoke_all;

pub use active::active_sessions;
pub use login::login;
pub use refresh::refresh;
pub use revoke::revoke;
pub use revoke_all::revoke_all;

use std::sync::Arc;

use actix_web::HttpRequest;

use pf_core::repositories::{IdentityRepository, SessionRepository};
use pf_core::services::token::TokenService;

/// Application state that holds shared services
pub struct AppState<S, I>
where
    S: SessionRepository,
    I: IdentityRepository,
{
    pub tokens: Arc<TokenService<S, I>>,
}

/// Summarizes the caller's user agent for the device listing
pub(crate) fn extract_user_agent(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(actix_web::http::header::USER_AGENT)?
        .to_str()
        .ok()
        .map(|ua| {
            let mut label = ua.to_string();
            label.truncate(255);
            label
        })
}
