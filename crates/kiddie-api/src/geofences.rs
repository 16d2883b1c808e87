//! Handlers for `/geofences` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/geofences` | Body: [`UpsertBody`]; 201 when created, 200 when replaced |
//! | `GET`  | `/geofences/:id` | The subject's geofence; 404 when none is set |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use kiddie_core::{
  geo::Coordinate,
  geofence::{DEFAULT_RADIUS_METERS, GeofenceDefinition, NewGeofence, UpsertOutcome},
  store::{GeofenceRegistry, SubjectDirectory},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  access::{Guardian, authorize},
  error::ApiError,
  input::{JsonBody, Number, required},
};

// ─── Upsert ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpsertBody {
  pub subject_id: Uuid,
  /// Blank or absent names become the default zone name.
  #[serde(default)]
  pub name:       String,
  pub latitude:   Option<Number>,
  pub longitude:  Option<Number>,
  /// Defaults to [`DEFAULT_RADIUS_METERS`].
  pub radius:     Option<Number>,
}

#[derive(Debug, Serialize)]
pub struct Saved {
  pub outcome:  UpsertOutcome,
  pub geofence: GeofenceDefinition,
}

/// `POST /geofences` — creates the subject's geofence or replaces it.
pub async fn upsert<S>(
  State(state): State<AppState<S>>,
  guardian: Guardian,
  JsonBody(body): JsonBody<UpsertBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GeofenceRegistry + SubjectDirectory,
{
  authorize(state.store.as_ref(), guardian, body.subject_id).await?;

  let latitude = required(body.latitude.as_ref(), "latitude")?;
  let longitude = required(body.longitude.as_ref(), "longitude")?;
  let radius = match &body.radius {
    Some(r) => r.parse("radius")?,
    None => DEFAULT_RADIUS_METERS,
  };

  let input = Coordinate::new(latitude, longitude)
    .and_then(|center| NewGeofence::new(body.subject_id, body.name, center, radius))
    .map_err(ApiError::store)?;

  let (geofence, outcome) = state
    .store
    .upsert(input)
    .await
    .map_err(ApiError::store)?;

  let status = match outcome {
    UpsertOutcome::Created => StatusCode::CREATED,
    UpsertOutcome::Replaced => StatusCode::OK,
  };
  Ok((status, Json(Saved { outcome, geofence })))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /geofences/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  guardian: Guardian,
  Path(id): Path<Uuid>,
) -> Result<Json<GeofenceDefinition>, ApiError>
where
  S: GeofenceRegistry + SubjectDirectory,
{
  authorize(state.store.as_ref(), guardian, id).await?;
  let fence = state
    .store
    .get(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("no geofence for subject {id}")))?;
  Ok(Json(fence))
}
