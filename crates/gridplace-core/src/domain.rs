//! Placement records and grid positions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of an establishment.
pub type EstablishmentId = Uuid;

/// Identifier of an authenticated user.
pub type UserId = Uuid;

/// A `(row, column)` coordinate inside a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
}

impl Cell {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// Where an establishment sits: a zone plus an optional cell.
///
/// `grid_row` and `grid_col` are either both set (placed) or both absent
/// (parked). The constructors only produce those two shapes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub zone: String,
    pub grid_row: Option<u32>,
    pub grid_col: Option<u32>,
}

impl Position {
    /// A placed position.
    pub fn at(zone: impl Into<String>, cell: Cell) -> Self {
        Self {
            zone: zone.into(),
            grid_row: Some(cell.row),
            grid_col: Some(cell.col),
        }
    }

    /// A parked position in the given zone.
    pub fn parked(zone: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            grid_row: None,
            grid_col: None,
        }
    }

    /// Returns the occupied cell, or `None` when parked.
    pub fn cell(&self) -> Option<Cell> {
        match (self.grid_row, self.grid_col) {
            (Some(row), Some(col)) => Some(Cell::new(row, col)),
            _ => None,
        }
    }

    pub fn is_parked(&self) -> bool {
        self.cell().is_none()
    }
}

/// The subset of an establishment record the grid engine reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub id: EstablishmentId,
    pub name: String,
    pub zone: String,
    pub grid_row: Option<u32>,
    pub grid_col: Option<u32>,
    pub updated_at: DateTime<Utc>,
}

impl Placement {
    /// Creates a placed record.
    pub fn placed(
        id: EstablishmentId,
        name: impl Into<String>,
        zone: impl Into<String>,
        cell: Cell,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            zone: zone.into(),
            grid_row: Some(cell.row),
            grid_col: Some(cell.col),
            updated_at: Utc::now(),
        }
    }

    /// Creates a parked record.
    pub fn parked(id: EstablishmentId, name: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            zone: zone.into(),
            grid_row: None,
            grid_col: None,
            updated_at: Utc::now(),
        }
    }

    pub fn position(&self) -> Position {
        Position {
            zone: self.zone.clone(),
            grid_row: self.grid_row,
            grid_col: self.grid_col,
        }
    }

    pub fn cell(&self) -> Option<Cell> {
        self.position().cell()
    }

    /// Returns true if this record holds `cell` in `zone`.
    pub fn occupies(&self, zone: &str, cell: Cell) -> bool {
        self.zone == zone && self.cell() == Some(cell)
    }

    /// Applies a position and timestamp to this record.
    pub fn apply(&mut self, position: &Position, updated_at: DateTime<Utc>) {
        self.zone = position.zone.clone();
        self.grid_row = position.grid_row;
        self.grid_col = position.grid_col;
        self.updated_at = updated_at;
    }
}
