//! Per-owner lock registry
//!
//! Every mutating ledger operation runs inside an exclusive critical
//! section keyed by owner. Operations on different owners never contend,
//! and an operation holds at most this single lock, so no deadlock is
//! possible. Acquisition is bounded: a caller that cannot get the lock
//! within the wait budget receives a retryable `Busy`.

use std::sync::Arc;
use std::time::Duration;

use adledger_types::{LedgerError, OwnerId, Result};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Default bound on how long a caller waits for a busy owner lock
pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(2);

/// Registry of per-owner mutexes
pub struct OwnerLocks {
    locks: DashMap<OwnerId, Arc<Mutex<()>>>,
    wait_budget: Duration,
}

impl OwnerLocks {
    /// Create a registry with the default wait budget
    pub fn new() -> Self {
        Self::with_wait_budget(DEFAULT_LOCK_WAIT)
    }

    /// Create a registry with a custom wait budget
    pub fn with_wait_budget(wait_budget: Duration) -> Self {
        Self {
            locks: DashMap::new(),
            wait_budget,
        }
    }

    /// Acquire the exclusive lock for an owner, waiting up to the budget.
    ///
    /// The guard must be held for the whole read-validate-commit sequence.
    pub async fn acquire(&self, owner: OwnerId) -> Result<OwnedMutexGuard<()>> {
        // Clone the Arc out so the map shard is not held across the await
        let lock = self.locks.entry(owner).or_default().clone();
        tokio::time::timeout(self.wait_budget, lock.lock_owned())
            .await
            .map_err(|_| LedgerError::Busy { owner })
    }
}

impl Default for OwnerLocks {
    fn default() -> Self {
        Self::new()
    }
}
