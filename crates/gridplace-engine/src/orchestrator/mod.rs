//! Move orchestration.
//!
//! A request goes through authorization, validation and then one of three
//! branches, all under the locks of the target zone and of the zone the
//! establishment currently sits in:
//!
//! ```text
//! swap_with_id given      -> explicit swap with the named establishment
//! target cell free        -> direct move
//! target cell occupied    -> 409 (GridPosition) or auto-swap (GridMoveWorkaround)
//! ```
//!
//! Committed mutations invalidate the establishment listing cache.

mod request;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use chrono::Utc;
use gridplace_config::SwapConfig;
use gridplace_core::{
    CacheInvalidator, EstablishmentId, PermissionDirectory, Placement, PlacementStore, Position,
    PositionValidator, ZoneTable,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use request::{Caller, EntryPoint, MoveRequest};
use request::ValidatedMove;

use crate::conflict::ConflictDetector;
use crate::error::MoveError;
use crate::lock::ZoneLocks;
use crate::swap::{SwapExecutor, SwapPlan, SwapStrategy};

/// Why a move became a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapTrigger {
    /// The request named `swap_with_id`.
    Explicit,
    /// The target cell was occupied.
    Occupied,
}

/// A committed move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved {
        establishment: Placement,
    },
    Swapped {
        strategy: SwapStrategy,
        trigger: SwapTrigger,
        source: Placement,
        target: Placement,
    },
}

/// Moves establishments between grid cells.
pub struct MoveEngine {
    store: Arc<dyn PlacementStore>,
    directory: Arc<dyn PermissionDirectory>,
    cache: Arc<dyn CacheInvalidator>,
    validator: PositionValidator,
    locks: ZoneLocks,
    config: SwapConfig,
}

impl MoveEngine {
    /// Creates an engine with the default swap configuration.
    pub fn new(
        store: Arc<dyn PlacementStore>,
        directory: Arc<dyn PermissionDirectory>,
        cache: Arc<dyn CacheInvalidator>,
        zones: Arc<ZoneTable>,
    ) -> Self {
        Self {
            store,
            directory,
            cache,
            validator: PositionValidator::new(zones),
            locks: ZoneLocks::new(),
            config: SwapConfig::default(),
        }
    }

    /// Replaces the swap configuration.
    pub fn with_swap_config(mut self, config: SwapConfig) -> Self {
        self.config = config;
        self
    }

    pub fn validator(&self) -> &PositionValidator {
        &self.validator
    }

    pub fn swap_config(&self) -> &SwapConfig {
        &self.config
    }

    /// Moves an establishment; an occupied target without `swap_with_id` is
    /// rejected with [`MoveError::Occupied`]. Staff only.
    pub async fn move_strict(
        &self,
        caller: &Caller,
        request: MoveRequest,
    ) -> Result<MoveOutcome, MoveError> {
        self.run(caller, request, EntryPoint::GridPosition).await
    }

    /// Moves an establishment; an occupied target turns the move into a swap
    /// with the occupant. Staff or the establishment's owner.
    pub async fn move_or_swap(
        &self,
        caller: &Caller,
        request: MoveRequest,
    ) -> Result<MoveOutcome, MoveError> {
        self.run(caller, request, EntryPoint::GridMoveWorkaround).await
    }

    async fn run(
        &self,
        caller: &Caller,
        request: MoveRequest,
        entry: EntryPoint,
    ) -> Result<MoveOutcome, MoveError> {
        let result = self.authorize_and_apply(caller, &request, entry).await;
        match &result {
            Ok(_) => self.invalidate_cache().await,
            Err(err) => debug!(
                event = "request_rejected",
                entry = ?entry,
                user = %caller.user_id,
                error = %err,
            ),
        }
        result
    }

    async fn authorize_and_apply(
        &self,
        caller: &Caller,
        request: &MoveRequest,
        entry: EntryPoint,
    ) -> Result<MoveOutcome, MoveError> {
        self.authorize(caller, request, entry).await?;
        let validated = self.validate(request)?;

        let mut mover = self.fetch(validated.establishment_id).await?;
        if !self.config.serialize_zones {
            return self.apply(mover, &validated, entry).await;
        }

        loop {
            let _guards = self
                .locks
                .lock_all(&[mover.zone.as_str(), validated.zone.as_str()])
                .await;
            // Re-read under the locks; retry if it left the zone meanwhile.
            let current = self.fetch(validated.establishment_id).await?;
            if current.zone == mover.zone {
                return self.apply(current, &validated, entry).await;
            }
            mover = current;
        }
    }

    async fn authorize(
        &self,
        caller: &Caller,
        request: &MoveRequest,
        entry: EntryPoint,
    ) -> Result<(), MoveError> {
        let role = self.directory.role_of(caller.user_id).await?;
        if role.is_some_and(|r| r.is_staff()) {
            return Ok(());
        }

        if entry.allows_owner() {
            // Without a well-formed id the caller cannot be shown to own anything.
            let target = request
                .establishment_id
                .as_deref()
                .and_then(|raw| Uuid::parse_str(raw.trim()).ok());
            if let Some(id) = target {
                if self.directory.owns(caller.user_id, id).await? {
                    return Ok(());
                }
            }
            return Err(MoveError::Forbidden {
                details: "Only administrators, moderators or the establishment owner can move it"
                    .to_string(),
            });
        }

        Err(MoveError::Forbidden {
            details: "Only administrators and moderators can change grid positions".to_string(),
        })
    }

    fn validate(&self, request: &MoveRequest) -> Result<ValidatedMove, MoveError> {
        let id = non_empty(request.establishment_id.as_deref());
        let zone = non_empty(request.zone.as_deref());

        let mut missing = Vec::new();
        if id.is_none() {
            missing.push("establishmentId");
        }
        if request.grid_row.is_none() {
            missing.push("grid_row");
        }
        if request.grid_col.is_none() {
            missing.push("grid_col");
        }
        if zone.is_none() {
            missing.push("zone");
        }
        let (Some(id), Some(row), Some(col), Some(zone)) =
            (id, request.grid_row, request.grid_col, zone)
        else {
            return Err(MoveError::MissingFields(missing));
        };

        let establishment_id = parse_id("establishmentId", id)?;
        let swap_with = non_empty(request.swap_with_id.as_deref())
            .map(|raw| parse_id("swap_with_id", raw))
            .transpose()?;
        if swap_with == Some(establishment_id) {
            return Err(MoveError::SelfSwap);
        }

        let cell = self
            .validator
            .validate(zone, row, col)
            .map_err(MoveError::InvalidPosition)?;

        Ok(ValidatedMove {
            establishment_id,
            zone: zone.to_string(),
            cell,
            swap_with,
        })
    }

    async fn apply(
        &self,
        mover: Placement,
        request: &ValidatedMove,
        entry: EntryPoint,
    ) -> Result<MoveOutcome, MoveError> {
        let destination = Position::at(request.zone.clone(), request.cell);
        let detector = ConflictDetector::new(self.store.as_ref());
        let occupant = detector
            .find_occupant(&request.zone, request.cell, mover.id)
            .await?;

        if let Some(partner_id) = request.swap_with {
            if mover.occupies(&request.zone, request.cell) {
                return Err(MoveError::SwapIntoOwnCell);
            }
            let partner = self.fetch(partner_id).await?;
            if let Some(occupant) = occupant.filter(|o| o.id != partner.id) {
                return Err(MoveError::Occupied { occupant });
            }
            return self
                .swap(mover, partner, destination, SwapTrigger::Explicit)
                .await;
        }

        match occupant {
            None => self.direct_move(mover, destination).await,
            Some(occupant) if entry.swaps_on_occupied() => {
                self.swap(mover, occupant, destination, SwapTrigger::Occupied)
                    .await
            }
            Some(occupant) => Err(MoveError::Occupied { occupant }),
        }
    }

    async fn fetch(&self, id: EstablishmentId) -> Result<Placement, MoveError> {
        self.store
            .get(id)
            .await?
            .ok_or(MoveError::NotFound(id))
    }

    async fn direct_move(
        &self,
        mover: Placement,
        destination: Position,
    ) -> Result<MoveOutcome, MoveError> {
        let establishment = self
            .store
            .set_position(mover.id, &destination, Utc::now())
            .await?;
        info!(
            event = "move_committed",
            establishment = %establishment.id,
            zone = %destination.zone,
            row = establishment.grid_row.unwrap_or_default(),
            col = establishment.grid_col.unwrap_or_default(),
        );
        Ok(MoveOutcome::Moved { establishment })
    }

    async fn swap(
        &self,
        mover: Placement,
        partner: Placement,
        destination: Position,
        trigger: SwapTrigger,
    ) -> Result<MoveOutcome, MoveError> {
        for zone in [&mover.zone, &partner.zone] {
            if *zone != destination.zone {
                return Err(MoveError::CrossZoneSwap {
                    from_zone: zone.clone(),
                    to_zone: destination.zone.clone(),
                });
            }
        }

        let plan = SwapPlan::exchange(mover, partner, destination);
        let executor = SwapExecutor::new(self.store.as_ref(), self.config.atomic);
        let (strategy, pair) = executor
            .execute(&plan)
            .await
            .into_result()
            .map_err(MoveError::SwapFailed)?;

        Ok(MoveOutcome::Swapped {
            strategy,
            trigger,
            source: pair.source,
            target: pair.target,
        })
    }

    async fn invalidate_cache(&self) {
        if let Err(err) = self.cache.invalidate_establishments().await {
            warn!(event = "cache_invalidation_failed", error = %err);
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_id(field: &'static str, raw: &str) -> Result<EstablishmentId, MoveError> {
    Uuid::parse_str(raw).map_err(|_| MoveError::MalformedId {
        field,
        value: raw.to_string(),
    })
}
