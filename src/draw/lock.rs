//! Per-group draw serialisation

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per group id. Draws on the same group queue behind each
/// other; different groups never contend.
#[derive(Clone, Default)]
pub struct DrawLocks {
    locks: Arc<DashMap<i64, Arc<Mutex<()>>>>,
}

impl DrawLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive draw rights on `group_id`
    pub async fn acquire(&self, group_id: i64) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the map shard is released before awaiting
        let lock = self.locks.entry(group_id).or_default().value().clone();
        lock.lock_owned().await
    }
}
