//! GridPlace Core - types and traits for grid position allocation
//!
//! This crate provides the fundamental abstractions for GridPlace:
//! - Placement records, positions and cells
//! - Zone geometry tables and the position validator
//! - The placement store trait and an in-memory store
//! - Permission and cache collaborator traits

pub mod collab;
pub mod domain;
pub mod error;
pub mod geometry;
pub mod store;
pub mod validate;


pub use collab::{
    CacheInvalidator, GenerationCache, MemoryDirectory, PermissionDirectory, Role,
};
pub use domain::{Cell, EstablishmentId, Placement, Position, UserId};
pub use error::{CollaboratorError, StoreError};
pub use geometry::{RowRule, ValidRange, ZoneGeometry, ZoneTable, DEFAULT_MAX_COL};
pub use store::{AtomicSwap, MemoryPlacementStore, PlacementStore};
pub use validate::{PositionValidator, Rejection};
