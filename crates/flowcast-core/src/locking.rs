//! Per-user keyed lock registry. Every mutating entry point and the
//! pattern updater acquire the lock for their user before touching
//! Tasks, ScheduleItems, or HistoricalEnergyPattern rows, so concurrent
//! requests for the same user never race on calendar invariants.
//! Distinct users never contend with each other.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::model::UserId;

/// Keyed map of per-user mutexes. Cheap to clone; all clones share the
/// same underlying map.
#[derive(Clone, Default)]
pub struct LockRegistry {
    locks: Arc<Mutex<HashMap<UserId, Arc<Mutex<()>>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the per-user lock, creating it on first use. Holding the
    /// returned guard serializes every other mutating call for this user.
    pub async fn lock(&self, owner: &UserId) -> OwnedMutexGuard<()> {
        let user_mutex = {
            let mut locks = self.locks.lock().await;
            locks.entry(owner.clone()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
        };
        user_mutex.lock_owned().await
    }
}
