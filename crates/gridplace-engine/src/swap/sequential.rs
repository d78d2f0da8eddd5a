//! Compensated three-write swap protocol.
//!
//! Not atomic across writes: a crash between the park and the final placement
//! leaves the source parked. Callers serialize per zone to keep other requests
//! out of that window.

use chrono::{DateTime, Utc};
use gridplace_core::{Placement, PlacementStore, Position, StoreError};
use tracing::{debug, error, info, warn};

use super::{Compensation, SequentialStep, SwapFailure, SwapOutcome, SwapPlan, SwappedPair};

/// Writes `snapshot`'s position back to the store.
///
/// Idempotent: restoring an establishment that never moved rewrites the same
/// position.
pub async fn restore(
    store: &dyn PlacementStore,
    snapshot: &Placement,
) -> Result<Placement, StoreError> {
    store
        .set_position(snapshot.id, &snapshot.position(), Utc::now())
        .await
}

// Snapshots of rows written so far, undone newest first.
struct UndoLog<'p> {
    snapshots: Vec<&'p Placement>,
}

impl<'p> UndoLog<'p> {
    fn new() -> Self {
        Self {
            snapshots: Vec::with_capacity(2),
        }
    }

    fn record(&mut self, snapshot: &'p Placement) {
        self.snapshots.push(snapshot);
    }

    async fn rollback(mut self, store: &dyn PlacementStore) -> Compensation {
        if self.snapshots.is_empty() {
            return Compensation::NotNeeded;
        }

        let mut failures = Vec::new();
        while let Some(snapshot) = self.snapshots.pop() {
            match restore(store, snapshot).await {
                Ok(_) => debug!(event = "compensation_applied", establishment = %snapshot.id),
                Err(err) => {
                    error!(
                        event = "compensation_failed",
                        establishment = %snapshot.id,
                        zone = %snapshot.zone,
                        error = %err,
                    );
                    failures.push(err);
                }
            }
        }

        if failures.is_empty() {
            Compensation::Restored
        } else {
            Compensation::Incomplete(failures)
        }
    }
}

fn failed(
    step: SequentialStep,
    error: StoreError,
    atomic_error: StoreError,
    compensation: Compensation,
) -> SwapOutcome {
    warn!(
        event = "swap_failed",
        strategy = "sequential",
        step = %step,
        error = %error,
        compensated = matches!(compensation, Compensation::Restored | Compensation::NotNeeded),
    );
    SwapOutcome::Failed(SwapFailure {
        error,
        step: Some(step),
        atomic_error: Some(atomic_error),
        compensation,
    })
}

pub(super) async fn run(
    store: &dyn PlacementStore,
    plan: &SwapPlan,
    now: DateTime<Utc>,
    atomic_error: StoreError,
) -> SwapOutcome {
    let mut undo = UndoLog::new();

    let parked = Position::parked(plan.source.zone.clone());
    if let Err(err) = store.set_position(plan.source.id, &parked, now).await {
        return failed(
            SequentialStep::ParkSource,
            err,
            atomic_error,
            Compensation::NotNeeded,
        );
    }
    undo.record(&plan.source);

    let target = match store
        .set_position(plan.target.id, &plan.target_destination, now)
        .await
    {
        Ok(target) => target,
        Err(err) => {
            let compensation = undo.rollback(store).await;
            return failed(SequentialStep::RelocateTarget, err, atomic_error, compensation);
        }
    };
    undo.record(&plan.target);

    let source = match store
        .set_position(plan.source.id, &plan.source_destination, now)
        .await
    {
        Ok(source) => source,
        Err(err) => {
            let compensation = undo.rollback(store).await;
            return failed(SequentialStep::PlaceSource, err, atomic_error, compensation);
        }
    };

    info!(
        event = "swap_committed",
        strategy = "sequential",
        zone = %plan.source_destination.zone,
        source = %source.id,
        target = %target.id,
    );
    SwapOutcome::Sequential(SwappedPair { source, target })
}
