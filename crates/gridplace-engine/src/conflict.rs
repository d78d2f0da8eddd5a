//! Occupancy lookups for target cells.

use gridplace_core::{Cell, EstablishmentId, Placement, PlacementStore, StoreError};

/// Finds who, if anyone, holds a cell.
///
/// Read-only and unlocked: callers that need the answer to stay true until
/// their write must hold the zone lock (see [`crate::ZoneLocks`]).
pub struct ConflictDetector<'a> {
    store: &'a dyn PlacementStore,
}

impl<'a> ConflictDetector<'a> {
    pub fn new(store: &'a dyn PlacementStore) -> Self {
        Self { store }
    }

    /// Returns the establishment at `cell` in `zone`, never `excluding` itself.
    pub async fn find_occupant(
        &self,
        zone: &str,
        cell: Cell,
        excluding: EstablishmentId,
    ) -> Result<Option<Placement>, StoreError> {
        let occupants = self.store.occupants(zone, cell).await?;
        Ok(occupants
            .into_iter()
            .find(|p| p.id != excluding && p.occupies(zone, cell)))
    }
}
