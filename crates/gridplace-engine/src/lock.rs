//! Per-zone mutual exclusion.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per zone, created on first use.
///
/// Holding a zone's guard while checking occupancy and writing makes the
/// check-then-write sequence and the sequential swap fallback exclusive
/// within this process.
#[derive(Debug, Default)]
pub struct ZoneLocks {
    zones: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ZoneLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `zone`.
    pub async fn lock(&self, zone: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut zones = self.zones.lock();
            zones.entry(zone.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Locks every zone in `zones`, in name order, skipping duplicates.
    ///
    /// Requests that need more than one zone must come through here so that
    /// no two of them wait on each other.
    pub async fn lock_all(&self, zones: &[&str]) -> Vec<OwnedMutexGuard<()>> {
        let mut names = zones.to_vec();
        names.sort_unstable();
        names.dedup();

        let mut guards = Vec::with_capacity(names.len());
        for name in names {
            guards.push(self.lock(name).await);
        }
        guards
    }

    /// Number of zones that have been locked at least once.
    pub fn zone_count(&self) -> usize {
        self.zones.lock().len()
    }
}
