//! Cache invalidator that records calls.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use gridplace_core::{CacheInvalidator, CollaboratorError};

#[derive(Debug, Default)]
pub struct RecordingCache {
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl RecordingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache whose invalidation always fails.
    pub fn failing() -> Self {
        let cache = Self::new();
        cache.failing.store(true, Ordering::SeqCst);
        cache
    }

    /// Number of invalidation attempts, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheInvalidator for RecordingCache {
    async fn invalidate_establishments(&self) -> Result<(), CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Cache("injected cache outage".to_string()));
        }
        Ok(())
    }
}
