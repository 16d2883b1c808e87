//! Position samples — one observed location of a subject at a point in time.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::Coordinate;

/// Label used when the reverse geocoder could not resolve an address.
///
/// It takes part in deduplication like any other label: two consecutive
/// unknown observations collapse into one record.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// One entry in a subject's position history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
  pub sample_id:   Uuid,
  pub subject_id:  Uuid,
  pub latitude:    f64,
  pub longitude:   f64,
  /// Human-readable place description, e.g. a reverse-geocoded address.
  pub label:       String,
  pub observed_at: DateTime<Utc>,
}

/// Input to [`crate::store::HistoryStore::append`].
/// `sample_id` is always assigned by the store.
#[derive(Debug, Clone)]
pub struct NewSample {
  pub subject_id:  Uuid,
  pub coordinate:  Coordinate,
  pub label:       String,
  pub observed_at: DateTime<Utc>,
}

/// What an ingestion call did to the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestOutcome {
  /// A new sample was appended.
  Created,
  /// The latest sample had the same label; its position and timestamp were
  /// updated in place.
  TimestampRefreshed,
}

/// The outcome of an ingestion together with the sample as now stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingested {
  pub outcome: IngestOutcome,
  pub sample:  PositionSample,
}

/// The timestamp to stamp on a new or refreshed observation.
///
/// Normally `now`, but never earlier than or equal to the previous latest
/// observation, so history stays strictly ordered even if the wall clock
/// steps backwards or two calls land in the same tick.
pub fn next_observed_at(
  previous: Option<DateTime<Utc>>,
  now: DateTime<Utc>,
) -> DateTime<Utc> {
  match previous {
    Some(prev) if prev >= now => prev + TimeDelta::nanoseconds(1),
    _ => now,
  }
}
