//! Error types for move orchestration

use gridplace_core::{CollaboratorError, EstablishmentId, Placement, Rejection, StoreError};
use thiserror::Error;

use crate::swap::SwapFailure;

/// Broad class of a [`MoveError`], used by transports to pick a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Forbidden,
    NotFound,
    Conflict,
    Internal,
}

/// Why a move request was rejected.
#[derive(Debug, Error)]
pub enum MoveError {
    /// Caller is neither staff nor an owner allowed on this entry point.
    #[error("Access denied")]
    Forbidden { details: String },

    #[error("Missing required fields")]
    MissingFields(Vec<&'static str>),

    #[error("Invalid {field} format")]
    MalformedId { field: &'static str, value: String },

    /// The validator refused the target cell.
    #[error("{}", .0.error)]
    InvalidPosition(Rejection),

    #[error("Cannot swap an establishment with itself")]
    SelfSwap,

    /// An explicit swap whose target cell is the establishment's own cell.
    #[error("Establishment already occupies the requested cell")]
    SwapIntoOwnCell,

    #[error("Cross-zone swap is not supported")]
    CrossZoneSwap { from_zone: String, to_zone: String },

    #[error("Establishment not found")]
    NotFound(EstablishmentId),

    /// Target cell is held by another establishment and no swap applies.
    #[error("Grid position already occupied")]
    Occupied { occupant: Placement },

    #[error("Failed to swap grid positions")]
    SwapFailed(SwapFailure),

    #[error("Failed to update grid position")]
    Store(#[from] StoreError),

    #[error("Failed to check permissions")]
    Directory(#[from] CollaboratorError),
}

impl MoveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MoveError::Forbidden { .. } => ErrorKind::Forbidden,
            MoveError::MissingFields(_)
            | MoveError::MalformedId { .. }
            | MoveError::InvalidPosition(_)
            | MoveError::SelfSwap
            | MoveError::SwapIntoOwnCell
            | MoveError::CrossZoneSwap { .. } => ErrorKind::Validation,
            MoveError::NotFound(_) => ErrorKind::NotFound,
            MoveError::Occupied { .. } => ErrorKind::Conflict,
            MoveError::SwapFailed(_) | MoveError::Store(_) | MoveError::Directory(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Human-readable detail line accompanying the error message.
    pub fn details(&self) -> String {
        match self {
            MoveError::Forbidden { details } => details.clone(),
            MoveError::MissingFields(fields) => format!("Required: {}", fields.join(", ")),
            MoveError::MalformedId { field, value } => {
                format!("{field} must be a UUID, got {value:?}")
            }
            MoveError::InvalidPosition(rejection) => rejection.details.clone(),
            MoveError::SelfSwap => "swap_with_id must differ from the establishment id".to_string(),
            MoveError::SwapIntoOwnCell => {
                "Request a different cell to swap with swap_with_id".to_string()
            }
            MoveError::CrossZoneSwap { from_zone, to_zone } => {
                format!("Cannot swap between zone {from_zone} and zone {to_zone}")
            }
            MoveError::NotFound(id) => format!("No establishment with id {id}"),
            MoveError::Occupied { occupant } => {
                format!("Cell is occupied by {} ({})", occupant.name, occupant.id)
            }
            MoveError::SwapFailed(failure) => failure.to_string(),
            MoveError::Store(err) => err.to_string(),
            MoveError::Directory(err) => err.to_string(),
        }
    }
}
