//! Tests for move orchestration.

use std::sync::Arc;
use std::time::Duration;

use gridplace_config::{AtomicSwapPolicy, SwapConfig};
use gridplace_core::{Cell, MemoryDirectory, Placement, PlacementStore, StoreError, ZoneTable};
use gridplace_test::{fixtures, Actors, FaultyStore, RecordingCache};
use uuid::Uuid;

use super::*;
use crate::error::ErrorKind;

struct Harness {
    engine: MoveEngine,
    store: Arc<FaultyStore>,
    cache: Arc<RecordingCache>,
    actors: Actors,
    a: Placement,
    b: Placement,
}

impl Harness {
    fn new() -> Self {
        Self::build(|store| store, RecordingCache::new(), SwapConfig::default())
    }

    fn build(
        configure: impl FnOnce(FaultyStore) -> FaultyStore,
        cache: RecordingCache,
        config: SwapConfig,
    ) -> Self {
        let (inner, a, b) = fixtures::soi6_pair();
        let store = Arc::new(configure(FaultyStore::new(inner)));
        let directory = Arc::new(MemoryDirectory::new());
        let actors = Actors::register(&directory, &a);
        let cache = Arc::new(cache);

        let engine = MoveEngine::new(
            store.clone() as Arc<dyn PlacementStore>,
            directory,
            cache.clone(),
            Arc::new(ZoneTable::builtin()),
        )
        .with_swap_config(config);

        Self {
            engine,
            store,
            cache,
            actors,
            a,
            b,
        }
    }

    fn admin(&self) -> Caller {
        Caller::new(self.actors.admin)
    }

    fn cell(&self, p: &Placement) -> Option<Cell> {
        self.store.inner().record(p.id).and_then(|r| r.cell())
    }
}

#[tokio::test]
async fn test_strict_entry_rejects_occupied_cell() {
    let h = Harness::new();
    let err = h
        .engine
        .move_strict(&h.admin(), MoveRequest::to_cell(h.a.id, "soi6", 1, 7))
        .await
        .unwrap_err();

    let MoveError::Occupied { occupant } = &err else {
        panic!("expected conflict, got {err:?}");
    };
    assert_eq!(occupant.id, h.b.id);
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(h.cell(&h.a), Some(Cell::new(1, 5)));
    assert_eq!(h.cell(&h.b), Some(Cell::new(1, 7)));
    assert_eq!(h.cache.calls(), 0);
}

#[tokio::test]
async fn test_workaround_entry_auto_swaps() {
    let h = Harness::new();
    let outcome = h
        .engine
        .move_or_swap(&h.admin(), MoveRequest::to_cell(h.a.id, "soi6", 1, 7))
        .await
        .unwrap();

    let MoveOutcome::Swapped {
        strategy,
        trigger,
        source,
        target,
    } = outcome
    else {
        panic!("expected a swap");
    };
    assert_eq!(strategy, SwapStrategy::Atomic);
    assert_eq!(trigger, SwapTrigger::Occupied);
    assert_eq!(source.id, h.a.id);
    assert_eq!(target.id, h.b.id);
    assert_eq!(h.cell(&h.a), Some(Cell::new(1, 7)));
    assert_eq!(h.cell(&h.b), Some(Cell::new(1, 5)));
    assert_eq!(h.store.inner().occupied_count("soi6"), 2);
    assert_eq!(h.cache.calls(), 1);
}

#[tokio::test]
async fn test_auto_swap_uses_sequential_fallback() {
    let h = Harness::build(
        FaultyStore::without_atomic,
        RecordingCache::new(),
        SwapConfig::default(),
    );
    let outcome = h
        .engine
        .move_or_swap(
            &Caller::new(h.actors.owner),
            MoveRequest::to_cell(h.a.id, "soi6", 1, 7),
        )
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        MoveOutcome::Swapped {
            strategy: SwapStrategy::Sequential,
            ..
        }
    ));
    assert_eq!(h.cell(&h.a), Some(Cell::new(1, 7)));
    assert_eq!(h.cell(&h.b), Some(Cell::new(1, 5)));
}

#[tokio::test]
async fn test_zero_column_is_rejected() {
    let h = Harness::new();
    for zone in ["soi6", "lkmetro", "treetown"] {
        let err = h
            .engine
            .move_or_swap(&h.admin(), MoveRequest::to_cell(h.a.id, zone, 1, 0))
            .await
            .unwrap_err();
        let MoveError::InvalidPosition(rejection) = &err else {
            panic!("expected invalid position, got {err:?}");
        };
        assert_eq!(rejection.valid_range.min, 1);
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
    assert_eq!(h.store.write_count(), 0);
}

#[tokio::test]
async fn test_direct_move_to_free_cell() {
    let h = Harness::new();
    let outcome = h
        .engine
        .move_strict(&h.admin(), MoveRequest::to_cell(h.a.id, "soi6", 2, 5))
        .await
        .unwrap();

    let MoveOutcome::Moved { establishment } = outcome else {
        panic!("expected a direct move");
    };
    assert_eq!(establishment.cell(), Some(Cell::new(2, 5)));

    let holders: Vec<_> = h
        .store
        .inner()
        .snapshot()
        .into_iter()
        .filter(|p| p.occupies("soi6", Cell::new(2, 5)))
        .collect();
    assert_eq!(holders.len(), 1);
    assert_eq!(holders[0].id, h.a.id);
    assert!(h
        .store
        .inner()
        .snapshot()
        .iter()
        .all(|p| !p.occupies("soi6", Cell::new(1, 5))));
    assert_eq!(h.cache.calls(), 1);
}

#[tokio::test]
async fn test_move_to_own_cell_is_not_a_conflict() {
    let h = Harness::new();
    let outcome = h
        .engine
        .move_strict(&h.admin(), MoveRequest::to_cell(h.a.id, "soi6", 1, 5))
        .await
        .unwrap();
    assert!(matches!(outcome, MoveOutcome::Moved { .. }));
}

#[tokio::test]
async fn test_explicit_swap_on_strict_entry() {
    let h = Harness::new();
    let request = MoveRequest::to_cell(h.a.id, "soi6", 1, 7).swapping_with(h.b.id);
    let outcome = h.engine.move_strict(&h.admin(), request).await.unwrap();

    assert!(matches!(
        outcome,
        MoveOutcome::Swapped {
            trigger: SwapTrigger::Explicit,
            ..
        }
    ));
    assert_eq!(h.cell(&h.a), Some(Cell::new(1, 7)));
    assert_eq!(h.cell(&h.b), Some(Cell::new(1, 5)));
}

#[tokio::test]
async fn test_explicit_swap_blocked_by_third_party() {
    let h = Harness::new();
    let charlie = fixtures::place(h.store.inner(), "Charlie", "soi6", Cell::new(2, 2));

    let request = MoveRequest::to_cell(h.a.id, "soi6", 2, 2).swapping_with(h.b.id);
    let err = h.engine.move_strict(&h.admin(), request).await.unwrap_err();
    assert!(matches!(err, MoveError::Occupied { ref occupant } if occupant.id == charlie.id));
}

#[tokio::test]
async fn test_authorization_rules() {
    let h = Harness::new();
    let request = || MoveRequest::to_cell(h.a.id, "soi6", 2, 9);

    let err = h
        .engine
        .move_or_swap(&Caller::new(h.actors.stranger), request())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = h
        .engine
        .move_strict(&Caller::new(h.actors.owner), request())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let unknown = Caller::new(Uuid::new_v4());
    assert!(h.engine.move_or_swap(&unknown, request()).await.is_err());

    h.engine
        .move_or_swap(&Caller::new(h.actors.owner), request())
        .await
        .unwrap();
    h.engine
        .move_strict(
            &Caller::new(h.actors.moderator),
            MoveRequest::to_cell(h.a.id, "soi6", 2, 10),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_owner_cannot_move_someone_else() {
    let h = Harness::new();
    let err = h
        .engine
        .move_or_swap(
            &Caller::new(h.actors.owner),
            MoveRequest::to_cell(h.b.id, "soi6", 2, 1),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, MoveError::Forbidden { .. }));
}

#[tokio::test]
async fn test_authorization_precedes_validation() {
    let h = Harness::new();
    let request = MoveRequest {
        establishment_id: Some("not-a-uuid".to_string()),
        grid_col: Some(0),
        ..MoveRequest::default()
    };
    let err = h
        .engine
        .move_or_swap(&Caller::new(h.actors.stranger), request)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_malformed_identifiers() {
    let h = Harness::new();
    let mut request = MoveRequest::to_cell(h.a.id, "soi6", 2, 1);
    request.establishment_id = Some("42".to_string());
    let err = h.engine.move_or_swap(&h.admin(), request).await.unwrap_err();
    assert!(matches!(err, MoveError::MalformedId { field: "establishmentId", .. }));

    let mut request = MoveRequest::to_cell(h.a.id, "soi6", 2, 1);
    request.swap_with_id = Some("bogus".to_string());
    let err = h.engine.move_or_swap(&h.admin(), request).await.unwrap_err();
    assert!(matches!(err, MoveError::MalformedId { field: "swap_with_id", .. }));

    assert_eq!(h.store.write_count(), 0);
}

#[tokio::test]
async fn test_missing_fields_are_listed() {
    let h = Harness::new();
    let request = MoveRequest {
        establishment_id: Some(h.a.id.to_string()),
        grid_row: Some(1),
        zone: Some("  ".to_string()),
        ..MoveRequest::default()
    };
    let err = h.engine.move_or_swap(&h.admin(), request).await.unwrap_err();
    let MoveError::MissingFields(fields) = &err else {
        panic!("expected missing fields, got {err:?}");
    };
    assert_eq!(fields, &vec!["grid_col", "zone"]);
}

#[tokio::test]
async fn test_self_swap_and_unknown_ids() {
    let h = Harness::new();
    let request = MoveRequest::to_cell(h.a.id, "soi6", 1, 7).swapping_with(h.a.id);
    let err = h.engine.move_strict(&h.admin(), request).await.unwrap_err();
    assert!(matches!(err, MoveError::SelfSwap));

    let ghost = Uuid::new_v4();
    let err = h
        .engine
        .move_strict(&h.admin(), MoveRequest::to_cell(ghost, "soi6", 2, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, MoveError::NotFound(id) if id == ghost));
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let request = MoveRequest::to_cell(h.a.id, "soi6", 1, 7).swapping_with(ghost);
    let err = h.engine.move_strict(&h.admin(), request).await.unwrap_err();
    assert!(matches!(err, MoveError::NotFound(id) if id == ghost));
}

#[tokio::test]
async fn test_failed_swap_is_internal_and_restored() {
    let h = Harness::build(
        |store| store.without_atomic().fail_write(3),
        RecordingCache::new(),
        SwapConfig::default(),
    );
    let err = h
        .engine
        .move_or_swap(&h.admin(), MoveRequest::to_cell(h.a.id, "soi6", 1, 7))
        .await
        .unwrap_err();

    assert!(matches!(err, MoveError::SwapFailed(_)));
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(err.details().contains("place source failed"));
    assert_eq!(h.cell(&h.a), Some(Cell::new(1, 5)));
    assert_eq!(h.cell(&h.b), Some(Cell::new(1, 7)));
    assert_eq!(h.cache.calls(), 0);
}

#[tokio::test]
async fn test_required_atomic_policy_surfaces_missing_procedure() {
    let config = SwapConfig {
        atomic: AtomicSwapPolicy::Required,
        ..SwapConfig::default()
    };
    let h = Harness::build(FaultyStore::without_atomic, RecordingCache::new(), config);
    let err = h
        .engine
        .move_or_swap(&h.admin(), MoveRequest::to_cell(h.a.id, "soi6", 1, 7))
        .await
        .unwrap_err();

    let MoveError::SwapFailed(failure) = err else {
        panic!("expected swap failure");
    };
    assert!(failure.step.is_none());
    assert_eq!(h.store.write_count(), 0);
}

#[tokio::test]
async fn test_cache_failure_does_not_fail_request() {
    let h = Harness::build(|s| s, RecordingCache::failing(), SwapConfig::default());
    let outcome = h
        .engine
        .move_strict(&h.admin(), MoveRequest::to_cell(h.a.id, "soi6", 2, 3))
        .await;
    assert!(outcome.is_ok());
    assert_eq!(h.cache.calls(), 1);
}

#[tokio::test]
async fn test_cross_zone_auto_swap_is_rejected() {
    let h = Harness::new();
    let visitor = fixtures::place(h.store.inner(), "Visitor", "treetown", Cell::new(3, 3));
    let err = h
        .engine
        .move_or_swap(&h.admin(), MoveRequest::to_cell(visitor.id, "soi6", 1, 7))
        .await
        .unwrap_err();
    assert!(matches!(err, MoveError::CrossZoneSwap { .. }));
    assert_eq!(h.cell(&visitor), Some(Cell::new(3, 3)));

    // A move into a free cell of another zone is a plain move.
    let outcome = h
        .engine
        .move_strict(&h.admin(), MoveRequest::to_cell(visitor.id, "soi6", 2, 1))
        .await
        .unwrap();
    assert!(matches!(outcome, MoveOutcome::Moved { .. }));
}

type MoveResult = Result<MoveOutcome, MoveError>;

async fn race_for_cell(serialize_zones: bool) -> (MoveResult, MoveResult) {
    let config = SwapConfig {
        serialize_zones,
        ..SwapConfig::default()
    };
    let h = Harness::build(
        |store| store.with_read_delay(Duration::from_millis(20)),
        RecordingCache::new(),
        config,
    );
    let first = MoveRequest::to_cell(h.a.id, "soi6", 2, 4);
    let second = MoveRequest::to_cell(h.b.id, "soi6", 2, 4);
    let admin = h.admin();

    tokio::join!(
        h.engine.move_strict(&admin, first),
        h.engine.move_strict(&admin, second)
    )
}

#[tokio::test]
async fn test_zone_lock_serializes_check_and_write() {
    let (first, second) = race_for_cell(true).await;
    assert!(first.is_ok());
    assert!(matches!(second, Err(MoveError::Occupied { .. })));
}

#[tokio::test]
async fn test_unserialized_race_hits_store_constraint() {
    let (first, second) = race_for_cell(false).await;
    assert!(first.is_ok());
    assert!(matches!(
        second,
        Err(MoveError::Store(StoreError::UniqueViolation { .. }))
    ));
}

#[tokio::test]
async fn test_explicit_swap_into_own_cell_is_rejected_before_writes() {
    let h = Harness::build(
        FaultyStore::without_atomic,
        RecordingCache::new(),
        SwapConfig::default(),
    );
    let request = MoveRequest::to_cell(h.a.id, "soi6", 1, 5).swapping_with(h.b.id);
    let err = h.engine.move_strict(&h.admin(), request).await.unwrap_err();

    assert!(matches!(err, MoveError::SwapIntoOwnCell));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(h.store.write_count(), 0);
    assert_eq!(h.cell(&h.a), Some(Cell::new(1, 5)));
    assert_eq!(h.cell(&h.b), Some(Cell::new(1, 7)));
}

#[tokio::test]
async fn test_cross_zone_move_holds_the_zone_it_leaves() {
    let h = Harness::build(
        |store| store.with_read_delay(Duration::from_millis(20)),
        RecordingCache::new(),
        SwapConfig::default(),
    );
    let visitor = fixtures::place(h.store.inner(), "Visitor", "treetown", Cell::new(3, 3));
    let walker = fixtures::place(h.store.inner(), "Walker", "treetown", Cell::new(4, 4));
    let admin = h.admin();

    let leave = h
        .engine
        .move_strict(&admin, MoveRequest::to_cell(visitor.id, "soi6", 2, 1));
    let take_over = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.engine
            .move_or_swap(&admin, MoveRequest::to_cell(walker.id, "treetown", 3, 3))
            .await
    };
    let (left, taken) = tokio::join!(leave, take_over);

    assert!(matches!(left, Ok(MoveOutcome::Moved { .. })));
    // The cell was vacated before the second request looked at it.
    assert!(matches!(taken, Ok(MoveOutcome::Moved { .. })));
    let visitor_now = h.store.inner().record(visitor.id).unwrap();
    assert_eq!(visitor_now.zone, "soi6");
    assert_eq!(visitor_now.cell(), Some(Cell::new(2, 1)));
    assert_eq!(h.cell(&walker), Some(Cell::new(3, 3)));
}
