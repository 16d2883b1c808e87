//! Handlers for `/locations` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/locations` | Device report; body: [`IngestBody`]. 201 on a new sample, 200 on a refresh |
//! | `GET`  | `/locations/:id` | Most recent sample; 404 when there is none |
//! | `GET`  | `/locations/:id/history` | All samples, oldest first |
//!
//! Labels are resolved by the caller (reverse geocoding happens before the
//! report reaches this API). A missing or blank label is recorded as
//! [`UNKNOWN_LABEL`].

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use kiddie_core::{
  sample::{IngestOutcome, PositionSample, UNKNOWN_LABEL},
  store::{HistoryStore, SubjectDirectory},
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{
  AppState,
  access::{Guardian, authorize},
  error::ApiError,
  input::{JsonBody, Number, required},
};

// ─── Ingest ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct IngestBody {
  pub subject_id: Uuid,
  pub latitude:   Option<Number>,
  pub longitude:  Option<Number>,
  /// Reverse-geocoded address of the position.
  pub label:      Option<String>,
}

/// `POST /locations`
///
/// Device-facing: no guardian header, but the subject must exist.
pub async fn ingest<S>(
  State(state): State<AppState<S>>,
  JsonBody(body): JsonBody<IngestBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: HistoryStore + SubjectDirectory,
{
  let latitude = required(body.latitude.as_ref(), "latitude")?;
  let longitude = required(body.longitude.as_ref(), "longitude")?;
  let label = body
    .label
    .filter(|l| !l.trim().is_empty())
    .unwrap_or_else(|| UNKNOWN_LABEL.to_owned());

  let exists = state
    .store
    .subject_exists(body.subject_id)
    .await
    .map_err(ApiError::store)?;
  if !exists {
    return Err(ApiError::NotFound(format!(
      "subject {} not found",
      body.subject_id
    )));
  }

  let ingested = state
    .ingestor
    .ingest(body.subject_id, latitude, longitude, label)
    .await
    .map_err(ApiError::store)?;

  info!(
    subject_id = %body.subject_id,
    outcome = ?ingested.outcome,
    "location ingested"
  );
  let status = match ingested.outcome {
    IngestOutcome::Created => StatusCode::CREATED,
    IngestOutcome::TimestampRefreshed => StatusCode::OK,
  };
  Ok((status, Json(ingested)))
}

// ─── Latest ───────────────────────────────────────────────────────────────────

/// `GET /locations/:id`
pub async fn latest<S>(
  State(state): State<AppState<S>>,
  guardian: Guardian,
  Path(id): Path<Uuid>,
) -> Result<Json<PositionSample>, ApiError>
where
  S: HistoryStore + SubjectDirectory,
{
  authorize(state.store.as_ref(), guardian, id).await?;
  let sample = state
    .store
    .most_recent(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("no records yet for subject {id}")))?;
  Ok(Json(sample))
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /locations/:id/history`
pub async fn history<S>(
  State(state): State<AppState<S>>,
  guardian: Guardian,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<PositionSample>>, ApiError>
where
  S: HistoryStore + SubjectDirectory,
{
  authorize(state.store.as_ref(), guardian, id).await?;
  let samples = state
    .store
    .all_in_order(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(samples))
}
