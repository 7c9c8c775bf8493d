//! Refresh coalescer
//!
//! When an access token expires, every in-flight request observes the
//! expiry at roughly the same moment. Without coordination each would
//! fire its own rotation, and all but one would trip the server's
//! reuse detection against the client itself. This client serializes
//! them: the first caller to observe expiry drives exactly one
//! rotation, everyone else queues behind it and replays with the
//! result.
//!
//! The gate is a two-state machine - `Idle` or `Refreshing` with an
//! owned waiter queue - held per client instance, not in module state,
//! so independent clients (one per device, many in tests) never
//! interfere.

use std::future::Future;

use async_trait::async_trait;
use tokio::sync::{oneshot, Mutex};

use crate::domain::entities::session::TokenPair;
use crate::errors::{DomainError, TokenError};

/// Transport over which the client exchanges a refresh token for a new
/// token pair (`POST /session/refresh` in production, an in-process
/// rotation engine in tests).
#[async_trait]
pub trait RefreshTransport: Send + Sync {
    async fn rotate(&self, refresh_token: &str) -> Result<TokenPair, DomainError>;
}

/// Current credentials held by the client
struct TokenState {
    access_token: String,
    refresh_token: String,
}

/// Refresh gate state machine
enum GateState {
    Idle,
    /// A rotation is in flight; queued callers wait for its outcome
    Refreshing(Vec<oneshot::Sender<Result<String, DomainError>>>),
}

/// Session client that coalesces concurrent refresh attempts
///
/// Guarantees at most one in-flight rotation per client instance,
/// regardless of request fan-out.
pub struct CoalescingClient<T: RefreshTransport> {
    transport: T,
    tokens: Mutex<TokenState>,
    gate: Mutex<GateState>,
}

impl<T: RefreshTransport> CoalescingClient<T> {
    /// Creates a client holding the token pair from login
    pub fn new(transport: T, pair: TokenPair) -> Self {
        Self {
            transport,
            tokens: Mutex::new(TokenState {
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
            }),
            gate: Mutex::new(GateState::Idle),
        }
    }

    /// The access token currently held by the client
    pub async fn access_token(&self) -> String {
        self.tokens.lock().await.access_token.clone()
    }

    /// Runs an operation with the current access token, transparently
    /// refreshing and replaying once if the token has expired
    ///
    /// `TokenError::Expired` never escapes to the caller: it is
    /// swallowed by the refresh-and-replay cycle. Hard failures from
    /// the rotation (`ReuseDetected`, `InvalidRefreshToken`) propagate
    /// to every queued caller identically.
    pub async fn call<F, Fut, R>(&self, operation: F) -> Result<R, DomainError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<R, DomainError>>,
    {
        let token = self.access_token().await;

        match operation(token.clone()).await {
            Err(DomainError::Token(TokenError::Expired)) => {
                let fresh = self.refresh_coalesced(&token).await?;
                operation(fresh).await
            }
            other => other,
        }
    }

    /// Obtains a fresh access token, coalescing with any rotation
    /// already in flight
    async fn refresh_coalesced(&self, stale_token: &str) -> Result<String, DomainError> {
        // A finished cycle may already have replaced the token this
        // caller failed with
        {
            let tokens = self.tokens.lock().await;
            if tokens.access_token != stale_token {
                return Ok(tokens.access_token.clone());
            }
        }

        // Claim the gate or enqueue behind the current leader
        let waiter = {
            let mut gate = self.gate.lock().await;
            match &mut *gate {
                GateState::Idle => {
                    *gate = GateState::Refreshing(Vec::new());
                    None
                }
                GateState::Refreshing(waiters) => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    Some(rx)
                }
            }
        };

        if let Some(rx) = waiter {
            // Queued: inherit the leader's outcome
            return rx.await.map_err(|_| DomainError::Internal {
                message: "refresh leader dropped".to_string(),
            })?;
        }

        let outcome = self.drive_rotation().await;

        // Drain the queue with the shared outcome and return to idle
        let waiters = {
            let mut gate = self.gate.lock().await;
            match std::mem::replace(&mut *gate, GateState::Idle) {
                GateState::Refreshing(waiters) => waiters,
                GateState::Idle => Vec::new(),
            }
        };
        for tx in waiters {
            let _ = tx.send(outcome.clone());
        }

        outcome
    }

    /// Performs the single rotation and stores the new pair
    async fn drive_rotation(&self) -> Result<String, DomainError> {
        let refresh_token = self.tokens.lock().await.refresh_token.clone();

        let pair = self.transport.rotate(&refresh_token).await?;

        let mut tokens = self.tokens.lock().await;
        tokens.access_token = pair.access_token.clone();
        tokens.refresh_token = pair.refresh_token;

        Ok(pair.access_token)
    }
}
