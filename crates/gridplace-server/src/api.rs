//! REST API handlers for grid moves.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use gridplace_core::{EstablishmentId, Placement, ZoneGeometry, ZoneTable};
use gridplace_engine::{Caller, MoveEngine, MoveOutcome, MoveRequest, SwapStrategy};
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;

/// Header set by the upstream authentication layer.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Application state shared across handlers.
pub struct AppState {
    pub engine: MoveEngine,
    pub zones: Arc<ZoneTable>,
}

impl AppState {
    pub fn new(engine: MoveEngine, zones: Arc<ZoneTable>) -> Self {
        Self { engine, zones }
    }
}

/// Creates the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/establishments/{id}/grid-position", patch(update_grid_position))
        .route("/grid-move-workaround", post(grid_move_workaround))
        .route("/zones/{zone}/geometry", get(zone_geometry))
        .with_state(state)
}

/// The authenticated caller, read from [`USER_ID_HEADER`].
pub struct Authenticated(pub Caller);

impl<S: Send + Sync> FromRequestParts<S> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthenticated {
                details: format!("Missing {USER_ID_HEADER} header"),
            })?;
        let user_id = raw
            .to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .ok_or_else(|| ApiError::Unauthenticated {
                details: format!("{USER_ID_HEADER} must be a UUID"),
            })?;
        Ok(Self(Caller::new(user_id)))
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Where an establishment ended up.
#[derive(Debug, Serialize)]
pub struct GridPosition {
    pub zone: String,
    pub grid_row: Option<u32>,
    pub grid_col: Option<u32>,
}

impl From<&Placement> for GridPosition {
    fn from(p: &Placement) -> Self {
        Self {
            zone: p.zone.clone(),
            grid_row: p.grid_row,
            grid_col: p.grid_col,
        }
    }
}

#[derive(Debug, Serialize)]
struct SwappedEstablishment {
    id: EstablishmentId,
    name: String,
    new_position: GridPosition,
}

impl From<&Placement> for SwappedEstablishment {
    fn from(p: &Placement) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            new_position: GridPosition::from(p),
        }
    }
}

#[derive(Debug, Serialize)]
struct SwappedPair {
    establishment1: SwappedEstablishment,
    establishment2: SwappedEstablishment,
}

/// Response of `PATCH /establishments/{id}/grid-position`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GridPositionResponse {
    Moved {
        message: &'static str,
        establishment: Placement,
    },
    Swapped {
        message: &'static str,
        swapped: SwappedPair,
    },
}

impl From<MoveOutcome> for GridPositionResponse {
    fn from(outcome: MoveOutcome) -> Self {
        match outcome {
            MoveOutcome::Moved { establishment } => Self::Moved {
                message: "Grid position updated",
                establishment,
            },
            MoveOutcome::Swapped { source, target, .. } => Self::Swapped {
                message: "Grid positions swapped",
                swapped: SwappedPair {
                    establishment1: SwappedEstablishment::from(&source),
                    establishment2: SwappedEstablishment::from(&target),
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct SwapParties {
    source: Placement,
    target: Placement,
}

/// Response of `POST /grid-move-workaround`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WorkaroundResponse {
    Moved {
        success: bool,
        message: &'static str,
        establishment: Placement,
    },
    Swapped {
        success: bool,
        message: &'static str,
        establishments: SwapParties,
        strategy: SwapStrategy,
    },
}

impl From<MoveOutcome> for WorkaroundResponse {
    fn from(outcome: MoveOutcome) -> Self {
        match outcome {
            MoveOutcome::Moved { establishment } => Self::Moved {
                success: true,
                message: "Establishment moved",
                establishment,
            },
            MoveOutcome::Swapped {
                strategy,
                source,
                target,
                ..
            } => Self::Swapped {
                success: true,
                message: "Establishments swapped",
                establishments: SwapParties { source, target },
                strategy,
            },
        }
    }
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::InvalidBody(rejection.body_text()))
}

/// PATCH /establishments/{id}/grid-position
async fn update_grid_position(
    State(state): State<Arc<AppState>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
    body: Result<Json<MoveRequest>, JsonRejection>,
) -> Result<Json<GridPositionResponse>, ApiError> {
    let mut request = json_body(body)?;
    request.establishment_id = Some(id);
    let outcome = state.engine.move_strict(&caller, request).await?;
    Ok(Json(outcome.into()))
}

/// POST /grid-move-workaround
async fn grid_move_workaround(
    State(state): State<Arc<AppState>>,
    Authenticated(caller): Authenticated,
    body: Result<Json<MoveRequest>, JsonRejection>,
) -> Result<Json<WorkaroundResponse>, ApiError> {
    let request = json_body(body)?;
    let outcome = state.engine.move_or_swap(&caller, request).await?;
    Ok(Json(outcome.into()))
}

#[derive(Debug, Serialize)]
struct ZoneGeometryResponse {
    zone: String,
    configured: bool,
    #[serde(flatten)]
    geometry: ZoneGeometry,
}

/// GET /zones/{zone}/geometry
async fn zone_geometry(
    State(state): State<Arc<AppState>>,
    Path(zone): Path<String>,
) -> Json<ZoneGeometryResponse> {
    Json(ZoneGeometryResponse {
        configured: state.zones.get(&zone).is_some(),
        geometry: state.zones.effective(&zone),
        zone,
    })
}
