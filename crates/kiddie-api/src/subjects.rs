//! Handlers for `/subjects` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/subjects` | Caller's subjects with last sample, geofence and status |
//! | `POST`   | `/subjects` | Body: `{"display_name":"..."}` |
//! | `GET`    | `/subjects/:id` | Single subject view; 404 if missing or not the caller's |
//! | `DELETE` | `/subjects/:id` | Removes the subject, its history and geofence |
//! | `GET`    | `/subjects/:id/membership` | Inside/outside evaluation |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use kiddie_core::{
  membership::{MembershipResult, evaluate},
  store::{GeofenceRegistry, HistoryStore, SubjectDirectory},
  subject::NewSubject,
  view::{SubjectView, guardian_overview, materialize},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  access::{Guardian, authorize},
  error::ApiError,
  input::JsonBody,
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /subjects`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  guardian: Guardian,
) -> Result<Json<Vec<SubjectView>>, ApiError>
where
  S: HistoryStore + GeofenceRegistry + SubjectDirectory,
{
  let views = guardian_overview(state.store.as_ref(), guardian.0)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(views))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub display_name: String,
}

/// `POST /subjects` — body: `{"display_name":"Ana"}`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  guardian: Guardian,
  JsonBody(body): JsonBody<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SubjectDirectory,
{
  let display_name = body.display_name.trim();
  if display_name.is_empty() {
    return Err(ApiError::BadRequest("display_name is required".into()));
  }

  let subject = state
    .store
    .register_subject(NewSubject {
      guardian_id:  guardian.0,
      display_name: display_name.to_owned(),
    })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(subject)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /subjects/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  guardian: Guardian,
  Path(id): Path<Uuid>,
) -> Result<Json<SubjectView>, ApiError>
where
  S: HistoryStore + GeofenceRegistry + SubjectDirectory,
{
  authorize(state.store.as_ref(), guardian, id).await?;
  let subject = state
    .store
    .get_subject(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("subject {id} not found")))?;
  let view = materialize(state.store.as_ref(), subject)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(view))
}

// ─── Remove ───────────────────────────────────────────────────────────────────

/// `DELETE /subjects/:id`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  guardian: Guardian,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: HistoryStore + SubjectDirectory,
{
  authorize(state.store.as_ref(), guardian, id).await?;
  let removed = state
    .store
    .remove_subject(id)
    .await
    .map_err(ApiError::store)?;
  if !removed {
    return Err(ApiError::NotFound(format!("subject {id} not found")));
  }
  state.ingestor.forget(id);
  Ok(StatusCode::NO_CONTENT)
}

// ─── Membership ───────────────────────────────────────────────────────────────

/// `GET /subjects/:id/membership`
pub async fn membership<S>(
  State(state): State<AppState<S>>,
  guardian: Guardian,
  Path(id): Path<Uuid>,
) -> Result<Json<MembershipResult>, ApiError>
where
  S: HistoryStore + GeofenceRegistry + SubjectDirectory,
{
  authorize(state.store.as_ref(), guardian, id).await?;
  let result = evaluate(state.store.as_ref(), id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(result))
}
