//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gridplace_core::{EstablishmentId, ValidRange};
use gridplace_engine::{ErrorKind, MoveError};
use serde::Serialize;
use thiserror::Error;

/// Errors returned by the HTTP layer.
///
/// Every response body carries a stable `error` key; the other keys depend on
/// the failure.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The `x-user-id` header is missing or not a UUID.
    #[error("Authentication required")]
    Unauthenticated { details: String },

    /// The request body is not valid JSON for the endpoint.
    #[error("Invalid request body")]
    InvalidBody(String),

    #[error(transparent)]
    Move(#[from] MoveError),
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    ///
    /// - Unauthenticated: 401
    /// - Invalid body and validation failures: 400
    /// - Forbidden: 403, not found: 404, occupied: 409
    /// - Swap, store and collaborator failures: 500
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::Move(err) => match err.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::Forbidden => StatusCode::FORBIDDEN,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn body(&self) -> ErrorBody {
        let mut body = ErrorBody {
            error: self.to_string(),
            details: None,
            valid_range: None,
            occupied_by: None,
            suggestion: None,
        };
        match self {
            Self::Unauthenticated { details } => body.details = Some(details.clone()),
            Self::InvalidBody(details) => body.details = Some(details.clone()),
            Self::Move(MoveError::InvalidPosition(rejection)) => {
                body.details = Some(rejection.details.clone());
                body.valid_range = Some(rejection.valid_range);
            }
            Self::Move(MoveError::Occupied { occupant }) => {
                body.occupied_by = Some(Occupant {
                    id: occupant.id,
                    name: occupant.name.clone(),
                });
                body.suggestion = Some(format!(
                    "Pass swap_with_id={} to swap with {}, or use POST /grid-move-workaround",
                    occupant.id, occupant.name
                ));
            }
            Self::Move(err) => body.details = Some(err.details()),
        }
        body
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(rename = "validRange", skip_serializing_if = "Option::is_none")]
    valid_range: Option<ValidRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    occupied_by: Option<Occupant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<String>,
}

#[derive(Debug, Serialize)]
struct Occupant {
    id: EstablishmentId,
    name: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}
