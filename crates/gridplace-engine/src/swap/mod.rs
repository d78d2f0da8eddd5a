//! Two-party position exchange.
//!
//! A swap first tries the store's atomic procedure. When that fails and the
//! policy allows it, the swap is replayed as three single-row writes:
//!
//! ```text
//! 1. park source          (source vacates its cell)
//! 2. target -> source's old position
//! 3. source -> requested position
//! ```
//!
//! Completed writes are undone in reverse order when a later write fails.
//! Every undo writes an absolute snapshot position, so replaying it is a no-op.

mod sequential;


use std::fmt;

use chrono::Utc;
use gridplace_config::AtomicSwapPolicy;
use gridplace_core::{AtomicSwap, Placement, PlacementStore, Position, StoreError};
use serde::Serialize;
use tracing::{info, warn};

pub use sequential::restore;

/// What to swap and where each side ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPlan {
    pub source: Placement,
    pub target: Placement,
    pub source_destination: Position,
    pub target_destination: Position,
}

impl SwapPlan {
    /// Source takes `destination`; target takes the source's current position.
    pub fn exchange(source: Placement, target: Placement, destination: Position) -> Self {
        let target_destination = source.position();
        Self {
            source,
            target,
            source_destination: destination,
            target_destination,
        }
    }
}

/// Strategy that committed a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapStrategy {
    Atomic,
    Sequential,
}

impl fmt::Display for SwapStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwapStrategy::Atomic => write!(f, "atomic"),
            SwapStrategy::Sequential => write!(f, "sequential"),
        }
    }
}

/// Both records after a committed swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwappedPair {
    pub source: Placement,
    pub target: Placement,
}

/// Write of the sequential protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequentialStep {
    ParkSource,
    RelocateTarget,
    PlaceSource,
}

impl fmt::Display for SequentialStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequentialStep::ParkSource => write!(f, "park source"),
            SequentialStep::RelocateTarget => write!(f, "relocate target"),
            SequentialStep::PlaceSource => write!(f, "place source"),
        }
    }
}

/// Result of undoing a partially applied sequential swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    /// Nothing had been written.
    NotNeeded,
    /// Every completed write was undone.
    Restored,
    /// Some undo writes failed; the store may hold a partial swap.
    Incomplete(Vec<StoreError>),
}

/// Why a swap did not commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapFailure {
    /// The failure reported to the caller.
    pub error: StoreError,
    /// Sequential write that failed, `None` when the atomic attempt was final.
    pub step: Option<SequentialStep>,
    /// Error of the atomic attempt, if one was made and failed.
    pub atomic_error: Option<StoreError>,
    pub compensation: Compensation,
}

impl fmt::Display for SwapFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.step {
            Some(step) => write!(f, "{} failed: {}", step, self.error),
            None => write!(f, "atomic swap failed: {}", self.error),
        }
    }
}

/// Outcome of a swap attempt. Swaps report failure as a value, never as `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapOutcome {
    Atomic(SwappedPair),
    Sequential(SwappedPair),
    Failed(SwapFailure),
}

impl SwapOutcome {
    pub fn is_committed(&self) -> bool {
        !matches!(self, SwapOutcome::Failed(_))
    }

    /// Splits the outcome into the committing strategy and records, or the failure.
    pub fn into_result(self) -> Result<(SwapStrategy, SwappedPair), SwapFailure> {
        match self {
            SwapOutcome::Atomic(pair) => Ok((SwapStrategy::Atomic, pair)),
            SwapOutcome::Sequential(pair) => Ok((SwapStrategy::Sequential, pair)),
            SwapOutcome::Failed(failure) => Err(failure),
        }
    }
}

/// Runs swaps against a store.
pub struct SwapExecutor<'a> {
    store: &'a dyn PlacementStore,
    policy: AtomicSwapPolicy,
}

impl<'a> SwapExecutor<'a> {
    pub fn new(store: &'a dyn PlacementStore, policy: AtomicSwapPolicy) -> Self {
        Self { store, policy }
    }

    /// Executes `plan`: atomic procedure first, then (if allowed) the
    /// compensated sequential protocol. The atomic path is never retried.
    pub async fn execute(&self, plan: &SwapPlan) -> SwapOutcome {
        let now = Utc::now();
        let request = AtomicSwap {
            source_id: plan.source.id,
            target_id: plan.target.id,
            source_destination: plan.source_destination.clone(),
            target_destination: plan.target_destination.clone(),
            updated_at: now,
        };

        let atomic_error = match self.store.swap_positions(&request).await {
            Ok((source, target)) => {
                info!(
                    event = "swap_committed",
                    strategy = "atomic",
                    zone = %plan.source_destination.zone,
                    source = %source.id,
                    target = %target.id,
                );
                return SwapOutcome::Atomic(SwappedPair { source, target });
            }
            Err(err) => err,
        };

        if self.policy == AtomicSwapPolicy::Required {
            warn!(
                event = "swap_failed",
                strategy = "atomic",
                source = %plan.source.id,
                target = %plan.target.id,
                error = %atomic_error,
            );
            return SwapOutcome::Failed(SwapFailure {
                error: atomic_error.clone(),
                step: None,
                atomic_error: Some(atomic_error),
                compensation: Compensation::NotNeeded,
            });
        }

        warn!(
            event = "swap_fallback",
            source = %plan.source.id,
            target = %plan.target.id,
            error = %atomic_error,
        );
        sequential::run(self.store, plan, now, atomic_error).await
    }
}
