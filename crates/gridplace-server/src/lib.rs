//! HTTP service for GridPlace.
//!
//! Exposes the two move entry points over axum:
//!
//! - `PATCH /establishments/{id}/grid-position` - staff only, `409` on an occupied cell
//! - `POST /grid-move-workaround` - staff or owner, swaps with the occupant
//!
//! plus `GET /zones/{zone}/geometry` and `GET /health`.

pub mod api;
pub mod error;
pub mod seed;

use std::sync::Arc;

use gridplace_config::GridConfig;
use gridplace_core::{GenerationCache, MemoryDirectory, MemoryPlacementStore};
use gridplace_engine::MoveEngine;

pub use api::{router, AppState, Authenticated, USER_ID_HEADER};
pub use error::ApiError;
pub use seed::{Seed, SeedError};

/// Builds the application state from configuration and seed data.
///
/// Returns the state and the number of seeded establishments.
pub fn build_state(config: &GridConfig, seed: &Seed) -> Result<(AppState, usize), SeedError> {
    let zones = Arc::new(config.zone_table());
    let store = MemoryPlacementStore::new();
    let directory = MemoryDirectory::new();
    let seeded = seed.apply(&zones, &store, &directory)?;

    let engine = MoveEngine::new(
        Arc::new(store),
        Arc::new(directory),
        Arc::new(GenerationCache::new()),
        Arc::clone(&zones),
    )
    .with_swap_config(config.swap.clone());

    Ok((AppState::new(engine, zones), seeded))
}
