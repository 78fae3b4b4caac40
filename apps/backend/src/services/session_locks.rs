//! Per-session serialization.
//!
//! Every mutating operation on a session runs while holding that session's
//! lock, so operations on one session are linearized while different
//! sessions proceed independently. The lock is async because reveal holds
//! it across the judge call.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub struct SessionLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, session_code: &str) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the map shard is not held across the await.
        let lock = self
            .locks
            .entry(session_code.to_string())
            .or_default()
            .clone();
        lock.lock_owned().await
    }

    /// Drop the lock entry for a session nobody is currently using.
    pub fn forget(&self, session_code: &str) {
        self.locks
            .remove_if(session_code, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Drop every idle lock entry.
    pub fn prune(&self) {
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
