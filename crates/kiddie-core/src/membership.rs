//! Inside/outside classification of a subject against its geofence.
//!
//! This is the only place the membership rule lives: every caller that needs
//! a status (the status endpoint, subject views) goes through [`classify`] so
//! boundary handling is identical everywhere.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  geo::distance_meters,
  geofence::GeofenceDefinition,
  sample::PositionSample,
  store::{GeofenceRegistry, HistoryStore},
};

/// The result of evaluating a subject's latest position. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MembershipResult {
  /// The subject has no geofence.
  NoGeofence,
  /// The subject has a geofence but no position samples.
  NoSample,
  Inside,
  Outside {
    distance_meters: f64,
  },
}

/// Classify `sample` against `fence`.
///
/// The zone is a closed disk: a distance exactly equal to the radius is
/// `Inside`. A missing geofence wins over a missing sample.
pub fn classify(
  fence: Option<&GeofenceDefinition>,
  sample: Option<&PositionSample>,
) -> MembershipResult {
  let Some(fence) = fence else {
    return MembershipResult::NoGeofence;
  };
  let Some(sample) = sample else {
    return MembershipResult::NoSample;
  };

  let d = distance_meters(
    sample.latitude,
    sample.longitude,
    fence.center_latitude,
    fence.center_longitude,
  );
  if d <= fence.radius_meters {
    MembershipResult::Inside
  } else {
    MembershipResult::Outside { distance_meters: d }
  }
}

/// Evaluate the subject's most recent sample against its geofence.
///
/// Read-only; safe to call concurrently with ingestion and with itself.
pub async fn evaluate<S>(
  store: &S,
  subject_id: Uuid,
) -> Result<MembershipResult, S::Error>
where
  S: HistoryStore + GeofenceRegistry,
{
  let Some(fence) = store.get(subject_id).await? else {
    return Ok(MembershipResult::NoGeofence);
  };
  let sample = store.most_recent(subject_id).await?;
  Ok(classify(Some(&fence), sample.as_ref()))
}
