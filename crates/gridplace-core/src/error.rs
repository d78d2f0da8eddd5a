//! Error types for GridPlace collaborators

use thiserror::Error;

use crate::domain::{Cell, EstablishmentId};

/// Error reported by a placement store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The referenced establishment does not exist.
    #[error("establishment {0} not found")]
    NotFound(EstablishmentId),

    /// A write would place two establishments in the same cell.
    #[error("cell ({}, {}) in zone {zone} is already occupied by {occupant}", .cell.row, .cell.col)]
    UniqueViolation {
        zone: String,
        cell: Cell,
        occupant: EstablishmentId,
    },

    /// The atomic swap procedure is not installed on this store.
    #[error("atomic swap procedure unavailable: {0}")]
    ProcedureUnavailable(String),

    /// The store refused the request.
    #[error("store rejected request: {0}")]
    Rejected(String),

    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Error reported by the permission directory or the listing cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("permission lookup failed: {0}")]
    Directory(String),

    #[error("cache invalidation failed: {0}")]
    Cache(String),
}
