//! Background removal of expired sessions.

use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::session_locks::SessionLocks;
use crate::domain::session_code::normalize_session_code;
use crate::errors::domain::DomainError;
use crate::storage::Storage;

pub struct ExpiryReaper {
    storage: Arc<dyn Storage>,
    locks: Arc<SessionLocks>,
    interval: Duration,
}

impl ExpiryReaper {
    pub fn new(storage: Arc<dyn Storage>, locks: Arc<SessionLocks>, interval: Duration) -> Self {
        Self {
            storage,
            locks,
            interval,
        }
    }

    /// Delete every session past its expiry. Returns how many were removed.
    pub async fn reap_now(&self) -> Result<u64, DomainError> {
        let removed = self
            .storage
            .delete_expired(OffsetDateTime::now_utc())
            .await?;
        self.locks.prune();
        if removed > 0 {
            info!(removed, "Reaped expired sessions");
        }
        Ok(removed)
    }

    /// Delete one session if it is finished or past its expiry.
    pub async fn reap_session(&self, code: &str) -> Result<bool, DomainError> {
        let code = normalize_session_code(code)?;
        let guard = self.locks.acquire(&code).await;
        let Some(session) = self.storage.find_session(&code).await? else {
            return Ok(false);
        };
        if !session.status.is_terminal() && !session.is_expired_at(OffsetDateTime::now_utc()) {
            return Ok(false);
        }
        let removed = self.storage.delete_session(&code).await?;
        drop(guard);
        self.locks.forget(&code);
        if removed {
            info!(session_code = %code, "Reaped session");
        }
        Ok(removed)
    }

    /// Sweep on a fixed interval until `shutdown` is cancelled.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        info!("Expiry reaper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(err) = self.reap_now().await {
                            error!(error = %err, "Expiry sweep failed");
                        }
                    }
                }
            }
        })
    }
}
