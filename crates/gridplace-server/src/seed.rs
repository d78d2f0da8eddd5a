//! Startup data for the in-memory store and user directory.
//!
//! ```json
//! {
//!   "establishments": [
//!     { "id": "…", "name": "Alpha Bar", "zone": "soi6", "grid_row": 1, "grid_col": 5 }
//!   ],
//!   "users": [
//!     { "id": "…", "role": "establishment_owner", "owns": ["…"] }
//!   ]
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use gridplace_core::{
    EstablishmentId, MemoryDirectory, MemoryPlacementStore, Placement, PositionValidator, Role,
    StoreError, UserId, ZoneTable,
};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("establishment {name} has only one of grid_row and grid_col")]
    HalfPlaced { name: String },

    #[error("establishment {name}: {reason}")]
    OutOfBounds { name: String, reason: String },

    #[error("seed conflicts with existing data: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub establishments: Vec<SeedEstablishment>,
    #[serde(default)]
    pub users: Vec<SeedUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedEstablishment {
    pub id: EstablishmentId,
    pub name: String,
    pub zone: String,
    #[serde(default)]
    pub grid_row: Option<u32>,
    #[serde(default)]
    pub grid_col: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    pub id: UserId,
    pub role: Role,
    #[serde(default)]
    pub owns: Vec<EstablishmentId>,
}

impl Seed {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(s: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Inserts establishments and users, checking placed cells against `zones`.
    ///
    /// Returns the number of establishments inserted.
    pub fn apply(
        &self,
        zones: &Arc<ZoneTable>,
        store: &MemoryPlacementStore,
        directory: &MemoryDirectory,
    ) -> Result<usize, SeedError> {
        let validator = PositionValidator::new(Arc::clone(zones));

        for e in &self.establishments {
            let placement = match (e.grid_row, e.grid_col) {
                (Some(row), Some(col)) => {
                    let cell = validator
                        .validate(&e.zone, row.into(), col.into())
                        .map_err(|rejection| SeedError::OutOfBounds {
                            name: e.name.clone(),
                            reason: rejection.details,
                        })?;
                    Placement::placed(e.id, e.name.clone(), e.zone.clone(), cell)
                }
                (None, None) => Placement::parked(e.id, e.name.clone(), e.zone.clone()),
                _ => {
                    return Err(SeedError::HalfPlaced {
                        name: e.name.clone(),
                    })
                }
            };
            store.insert(placement)?;
        }

        for user in &self.users {
            directory.set_role(user.id, user.role);
            for establishment in &user.owns {
                directory.grant_ownership(user.id, *establishment);
            }
        }

        Ok(self.establishments.len())
    }
}
