//! Placement store abstraction.
//!
//! The store is the system of record for positions. Implementations must
//! reject any write that would put two establishments in the same cell of a
//! zone (the equivalent of a unique index over `(zone, grid_row, grid_col)`
//! for placed rows).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::domain::{Cell, EstablishmentId, Placement, Position};
use crate::error::StoreError;

/// Parameters of the atomic swap procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomicSwap {
    pub source_id: EstablishmentId,
    pub target_id: EstablishmentId,
    pub source_destination: Position,
    pub target_destination: Position,
    pub updated_at: DateTime<Utc>,
}

/// Record store holding establishment placements.
///
/// All methods take `&self`; implementations handle their own locking.
#[async_trait]
pub trait PlacementStore: Send + Sync {
    /// Fetches a placement by id.
    async fn get(&self, id: EstablishmentId) -> Result<Option<Placement>, StoreError>;

    /// Lists the establishments recorded at `cell` in `zone`.
    ///
    /// Normally zero or one entry.
    async fn occupants(&self, zone: &str, cell: Cell) -> Result<Vec<Placement>, StoreError>;

    /// Writes a single establishment's position.
    async fn set_position(
        &self,
        id: EstablishmentId,
        position: &Position,
        updated_at: DateTime<Utc>,
    ) -> Result<Placement, StoreError>;

    /// Swaps two establishments in one indivisible operation.
    ///
    /// Stores without the procedure return [`StoreError::ProcedureUnavailable`].
    async fn swap_positions(&self, swap: &AtomicSwap) -> Result<(Placement, Placement), StoreError>;
}

/// An in-memory placement store.
///
/// Enforces the per-zone cell uniqueness invariant on every write. The atomic
/// swap procedure can be switched off to mimic a database where it has not
/// been installed.
#[derive(Debug)]
pub struct MemoryPlacementStore {
    records: RwLock<HashMap<EstablishmentId, Placement>>,
    atomic_swap: bool,
}

impl Default for MemoryPlacementStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPlacementStore {
    /// Creates an empty store with the atomic swap procedure installed.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            atomic_swap: true,
        }
    }

    /// Creates an empty store without the atomic swap procedure.
    pub fn without_atomic_swap() -> Self {
        Self {
            atomic_swap: false,
            ..Self::new()
        }
    }

    pub fn has_atomic_swap(&self) -> bool {
        self.atomic_swap
    }

    /// Inserts a record, enforcing cell uniqueness.
    pub fn insert(&self, placement: Placement) -> Result<(), StoreError> {
        let mut records = self.records.write();
        check_free(&records, &placement.position(), &[placement.id])?;
        records.insert(placement.id, placement);
        Ok(())
    }

    /// Returns a copy of every record.
    pub fn snapshot(&self) -> Vec<Placement> {
        self.records.read().values().cloned().collect()
    }

    /// Returns a copy of one record without going through the async trait.
    pub fn record(&self, id: EstablishmentId) -> Option<Placement> {
        self.records.read().get(&id).cloned()
    }

    /// Number of occupied cells in `zone`.
    pub fn occupied_count(&self, zone: &str) -> usize {
        self.records
            .read()
            .values()
            .filter(|p| p.zone == zone && p.cell().is_some())
            .count()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

// Fails if `position` is a placed cell held by anyone outside `ignoring`.
fn check_free(
    records: &HashMap<EstablishmentId, Placement>,
    position: &Position,
    ignoring: &[EstablishmentId],
) -> Result<(), StoreError> {
    let Some(cell) = position.cell() else {
        return Ok(());
    };
    match records
        .values()
        .find(|p| !ignoring.contains(&p.id) && p.occupies(&position.zone, cell))
    {
        Some(holder) => Err(StoreError::UniqueViolation {
            zone: position.zone.clone(),
            cell,
            occupant: holder.id,
        }),
        None => Ok(()),
    }
}

#[async_trait]
impl PlacementStore for MemoryPlacementStore {
    async fn get(&self, id: EstablishmentId) -> Result<Option<Placement>, StoreError> {
        Ok(self.record(id))
    }

    async fn occupants(&self, zone: &str, cell: Cell) -> Result<Vec<Placement>, StoreError> {
        let mut found: Vec<Placement> = self
            .records
            .read()
            .values()
            .filter(|p| p.occupies(zone, cell))
            .cloned()
            .collect();
        found.sort_by_key(|p| p.id);
        Ok(found)
    }

    async fn set_position(
        &self,
        id: EstablishmentId,
        position: &Position,
        updated_at: DateTime<Utc>,
    ) -> Result<Placement, StoreError> {
        let mut records = self.records.write();
        if !records.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        check_free(&records, position, &[id])?;

        let record = records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        record.apply(position, updated_at);
        Ok(record.clone())
    }

    async fn swap_positions(&self, swap: &AtomicSwap) -> Result<(Placement, Placement), StoreError> {
        if !self.atomic_swap {
            return Err(StoreError::ProcedureUnavailable(
                "swap_grid_positions is not installed".to_string(),
            ));
        }

        // One write guard for the whole swap: readers never observe a half-swap.
        let mut records = self.records.write();
        for id in [swap.source_id, swap.target_id] {
            if !records.contains_key(&id) {
                return Err(StoreError::NotFound(id));
            }
        }
        if swap.source_id == swap.target_id {
            return Err(StoreError::Rejected(
                "cannot swap an establishment with itself".to_string(),
            ));
        }
        if swap.source_destination.cell().is_some()
            && swap.source_destination == swap.target_destination
        {
            return Err(StoreError::Rejected(
                "swap destinations must differ".to_string(),
            ));
        }

        let pair = [swap.source_id, swap.target_id];
        check_free(&records, &swap.source_destination, &pair)?;
        check_free(&records, &swap.target_destination, &pair)?;

        let mut updated = Vec::with_capacity(2);
        for (id, position) in [
            (swap.source_id, &swap.source_destination),
            (swap.target_id, &swap.target_destination),
        ] {
            let record = records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
            record.apply(position, swap.updated_at);
            updated.push(record.clone());
        }

        let target = updated.pop().ok_or(StoreError::NotFound(swap.target_id))?;
        let source = updated.pop().ok_or(StoreError::NotFound(swap.source_id))?;
        Ok((source, target))
    }
}
