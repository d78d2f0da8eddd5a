//! Move requests, callers and entry points.

use gridplace_core::{Cell, EstablishmentId, UserId};
use serde::Deserialize;

/// The authenticated user issuing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
}

impl Caller {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

/// A move request as received, before validation.
///
/// Every field is optional so that absence is reported as a validation error
/// rather than a decoding failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MoveRequest {
    #[serde(default, rename = "establishmentId", alias = "establishment_id")]
    pub establishment_id: Option<String>,
    #[serde(default)]
    pub grid_row: Option<i64>,
    #[serde(default)]
    pub grid_col: Option<i64>,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub swap_with_id: Option<String>,
}

impl MoveRequest {
    /// A request moving `establishment_id` to `(zone, row, col)`.
    pub fn to_cell(establishment_id: EstablishmentId, zone: &str, row: i64, col: i64) -> Self {
        Self {
            establishment_id: Some(establishment_id.to_string()),
            grid_row: Some(row),
            grid_col: Some(col),
            zone: Some(zone.to_string()),
            swap_with_id: None,
        }
    }

    pub fn swapping_with(mut self, other: EstablishmentId) -> Self {
        self.swap_with_id = Some(other.to_string());
        self
    }
}

/// Which public operation received the request.
///
/// The two differ in who may call them and in what happens when the target
/// cell is occupied and no swap partner was named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPoint {
    /// `PATCH /establishments/{id}/grid-position`: staff only, occupied cell is a conflict.
    GridPosition,
    /// `POST /grid-move-workaround`: staff or owner, occupied cell becomes a swap.
    GridMoveWorkaround,
}

impl EntryPoint {
    pub fn allows_owner(self) -> bool {
        matches!(self, EntryPoint::GridMoveWorkaround)
    }

    pub fn swaps_on_occupied(self) -> bool {
        matches!(self, EntryPoint::GridMoveWorkaround)
    }
}

// A request that passed validation.
#[derive(Debug, Clone)]
pub(crate) struct ValidatedMove {
    pub establishment_id: EstablishmentId,
    pub zone: String,
    pub cell: Cell,
    pub swap_with: Option<EstablishmentId>,
}
