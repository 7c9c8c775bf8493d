//! Session cleanup sweeper for periodic reclamation of dead rows
//!
//! Rotated and revoked session rows are kept around so token reuse can
//! be detected and diagnosed; this background task deletes them once
//! they are expired and past a retention grace period. Sweep failures
//! are logged and retried on the next tick, never propagated into
//! request-serving paths.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{error, info, warn};

use crate::errors::DomainResult;
use crate::repositories::SessionRepository;

/// Configuration for the session cleanup sweeper
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// How often to run the sweep (in seconds)
    pub interval_seconds: u64,
    /// Grace period after expiry before deletion (in hours)
    pub grace_period_hours: i64,
    /// Whether to enable automatic cleanup
    pub enabled: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 3600, // Run every hour
            grace_period_hours: 48, // Keep dead rows two days for diagnostics
            enabled: true,
        }
    }
}

/// Service for purging dead session rows
pub struct SessionCleanupService<S: SessionRepository + 'static> {
    repository: Arc<S>,
    config: CleanupConfig,
}

impl<S: SessionRepository> SessionCleanupService<S> {
    /// Create a new cleanup service
    pub fn new(repository: Arc<S>, config: CleanupConfig) -> Self {
        Self { repository, config }
    }

    /// Run a single sweep
    ///
    /// Deletes rows that are non-active and whose expiry lies before
    /// now minus the grace period. Delete-by-predicate: idempotent and
    /// safe to run concurrently with itself.
    pub async fn run_cleanup(&self) -> DomainResult<CleanupResult> {
        if !self.config.enabled {
            return Ok(CleanupResult::default());
        }

        let cutoff = Utc::now() - Duration::hours(self.config.grace_period_hours);
        let mut result = CleanupResult::default();

        match self.repository.purge_expired(cutoff).await {
            Ok(count) => {
                result.sessions_purged = count;
                info!(purged = count, "session sweep completed");
            }
            Err(e) => {
                error!("session sweep failed: {}", e);
                result.errors.push(format!("sweep error: {}", e));
            }
        }

        Ok(result)
    }

    /// Start the sweeper as a background task
    ///
    /// Spawns a tokio task that runs the sweep at regular intervals.
    pub fn start_background_task(self: Arc<Self>) {
        if !self.config.enabled {
            warn!("session cleanup sweeper is disabled");
            return;
        }

        let interval = std::time::Duration::from_secs(self.config.interval_seconds);

        tokio::spawn(async move {
            info!(
                "session cleanup sweeper started - will run every {} seconds",
                self.config.interval_seconds
            );

            let mut interval_timer = tokio::time::interval(interval);

            loop {
                interval_timer.tick().await;

                match self.run_cleanup().await {
                    Ok(result) => {
                        if !result.errors.is_empty() {
                            warn!("sweep completed with errors: {:?}", result.errors);
                        }
                    }
                    Err(e) => {
                        error!("session sweep cycle failed: {}", e);
                    }
                }
            }
        });
    }
}

/// Result of a cleanup sweep
#[derive(Debug, Default)]
pub struct CleanupResult {
    /// Number of session rows deleted
    pub sessions_purged: usize,
    /// Any errors encountered during the sweep
    pub errors: Vec<String>,
}

impl CleanupResult {
    /// Check if the sweep was successful (no errors)
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}
