//! Caller identity and the ownership check.
//!
//! Authentication happens in front of this API. By the time a request gets
//! here the calling context has put the guardian's id in the `X-Guardian-Id`
//! header; this module only checks that a subject belongs to that guardian.

use axum::{extract::FromRequestParts, http::request::Parts};
use kiddie_core::store::SubjectDirectory;
use uuid::Uuid;

use crate::error::ApiError;

pub const GUARDIAN_HEADER: &str = "x-guardian-id";

/// The guardian on whose behalf the request is made.
#[derive(Debug, Clone, Copy)]
pub struct Guardian(pub Uuid);

impl<St: Send + Sync> FromRequestParts<St> for Guardian {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &St,
  ) -> Result<Self, Self::Rejection> {
    let value = parts
      .headers
      .get(GUARDIAN_HEADER)
      .ok_or_else(|| ApiError::Unauthorized("missing guardian id".into()))?;
    let id = value
      .to_str()
      .ok()
      .and_then(|s| Uuid::parse_str(s.trim()).ok())
      .ok_or_else(|| ApiError::Unauthorized("malformed guardian id".into()))?;
    Ok(Guardian(id))
  }
}

/// Fail with 404 unless `subject_id` exists and belongs to `guardian`.
///
/// A subject owned by someone else is reported exactly like a missing one.
pub async fn authorize<S: SubjectDirectory>(
  store: &S,
  guardian: Guardian,
  subject_id: Uuid,
) -> Result<(), ApiError> {
  match store.subject_owner(subject_id).await.map_err(ApiError::store)? {
    Some(owner) if owner == guardian.0 => Ok(()),
    _ => Err(ApiError::NotFound(format!(
      "subject {subject_id} not found or not permitted"
    ))),
  }
}
