//! A placement store with injectable failures.
//!
//! Wraps [`MemoryPlacementStore`] and counts `set_position` calls from 1.
//! Selected writes (or every write from some point on) fail with
//! [`StoreError::Unavailable`] without touching the inner store.
//!
//! ```
//! use gridplace_test::{fixtures, FaultyStore};
//!
//! let (inner, _, _) = fixtures::soi6_pair();
//! let store = FaultyStore::new(inner).fail_write(2).without_atomic();
//! assert_eq!(store.write_count(), 0);
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gridplace_core::{
    AtomicSwap, Cell, EstablishmentId, MemoryPlacementStore, Placement, PlacementStore, Position,
    StoreError,
};
use parking_lot::Mutex;

#[derive(Debug)]
pub struct FaultyStore {
    inner: MemoryPlacementStore,
    writes: AtomicUsize,
    failing_writes: Mutex<HashSet<usize>>,
    fail_from: Option<usize>,
    atomic_fault: Option<StoreError>,
    read_delay: Option<Duration>,
}

impl FaultyStore {
    pub fn new(inner: MemoryPlacementStore) -> Self {
        Self {
            inner,
            writes: AtomicUsize::new(0),
            failing_writes: Mutex::new(HashSet::new()),
            fail_from: None,
            atomic_fault: None,
            read_delay: None,
        }
    }

    /// Fails the `nth` call to `set_position` (1-based).
    pub fn fail_write(self, nth: usize) -> Self {
        self.failing_writes.lock().insert(nth);
        self
    }

    /// Fails every `set_position` call from the `nth` on.
    pub fn fail_writes_from(mut self, nth: usize) -> Self {
        self.fail_from = Some(nth);
        self
    }

    /// Makes the atomic procedure report that it is not installed.
    pub fn without_atomic(self) -> Self {
        self.fail_atomic(StoreError::ProcedureUnavailable(
            "injected: procedure missing".to_string(),
        ))
    }

    /// Makes the atomic procedure fail with `error`.
    pub fn fail_atomic(mut self, error: StoreError) -> Self {
        self.atomic_fault = Some(error);
        self
    }

    /// Delays occupancy reads, widening check-then-write windows.
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    pub fn inner(&self) -> &MemoryPlacementStore {
        &self.inner
    }

    /// Number of `set_position` calls seen so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn should_fail(&self, nth: usize) -> bool {
        self.failing_writes.lock().contains(&nth) || self.fail_from.is_some_and(|from| nth >= from)
    }
}

#[async_trait]
impl PlacementStore for FaultyStore {
    async fn get(&self, id: EstablishmentId) -> Result<Option<Placement>, StoreError> {
        self.inner.get(id).await
    }

    async fn occupants(&self, zone: &str, cell: Cell) -> Result<Vec<Placement>, StoreError> {
        let found = self.inner.occupants(zone, cell).await?;
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(found)
    }

    async fn set_position(
        &self,
        id: EstablishmentId,
        position: &Position,
        updated_at: DateTime<Utc>,
    ) -> Result<Placement, StoreError> {
        let nth = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
        if self.should_fail(nth) {
            return Err(StoreError::Unavailable(format!(
                "injected failure on write {nth}"
            )));
        }
        self.inner.set_position(id, position, updated_at).await
    }

    async fn swap_positions(&self, swap: &AtomicSwap) -> Result<(Placement, Placement), StoreError> {
        if let Some(error) = &self.atomic_fault {
            return Err(error.clone());
        }
        self.inner.swap_positions(swap).await
    }
}
