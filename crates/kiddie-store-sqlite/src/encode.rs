//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed nanosecond fraction
//! and a `Z` suffix, so lexical order equals chronological order and
//! `ORDER BY observed_at` is correct. UUIDs are stored as hyphenated lowercase
//! strings. Coordinates are plain `REAL`s.

use chrono::{DateTime, SecondsFormat, Utc};
use kiddie_core::{
  geofence::GeofenceDefinition,
  sample::PositionSample,
  subject::Subject,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawSample::from_row`].
pub const SAMPLE_COLUMNS: &str =
  "sample_id, subject_id, latitude, longitude, label, observed_at";

/// Raw values read directly from a `position_samples` row.
pub struct RawSample {
  pub sample_id:   String,
  pub subject_id:  String,
  pub latitude:    f64,
  pub longitude:   f64,
  pub label:       String,
  pub observed_at: String,
}

impl RawSample {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      sample_id:   row.get(0)?,
      subject_id:  row.get(1)?,
      latitude:    row.get(2)?,
      longitude:   row.get(3)?,
      label:       row.get(4)?,
      observed_at: row.get(5)?,
    })
  }

  pub fn into_sample(self) -> Result<PositionSample> {
    Ok(PositionSample {
      sample_id:   decode_uuid(&self.sample_id)?,
      subject_id:  decode_uuid(&self.subject_id)?,
      latitude:    self.latitude,
      longitude:   self.longitude,
      label:       self.label,
      observed_at: decode_dt(&self.observed_at)?,
    })
  }
}

/// Column list matching [`RawGeofence::from_row`].
pub const GEOFENCE_COLUMNS: &str = "geofence_id, subject_id, name, \
  center_latitude, center_longitude, radius_meters, created_at, updated_at";

/// Raw values read directly from a `geofences` row.
pub struct RawGeofence {
  pub geofence_id:      String,
  pub subject_id:       String,
  pub name:             String,
  pub center_latitude:  f64,
  pub center_longitude: f64,
  pub radius_meters:    f64,
  pub created_at:       String,
  pub updated_at:       String,
}

impl RawGeofence {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      geofence_id:      row.get(0)?,
      subject_id:       row.get(1)?,
      name:             row.get(2)?,
      center_latitude:  row.get(3)?,
      center_longitude: row.get(4)?,
      radius_meters:    row.get(5)?,
      created_at:       row.get(6)?,
      updated_at:       row.get(7)?,
    })
  }

  pub fn into_geofence(self) -> Result<GeofenceDefinition> {
    Ok(GeofenceDefinition {
      geofence_id:      decode_uuid(&self.geofence_id)?,
      subject_id:       decode_uuid(&self.subject_id)?,
      name:             self.name,
      center_latitude:  self.center_latitude,
      center_longitude: self.center_longitude,
      radius_meters:    self.radius_meters,
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       decode_dt(&self.updated_at)?,
    })
  }
}

/// Column list matching [`RawSubject::from_row`].
pub const SUBJECT_COLUMNS: &str =
  "subject_id, guardian_id, display_name, created_at";

/// Raw strings read directly from a `subjects` row.
pub struct RawSubject {
  pub subject_id:   String,
  pub guardian_id:  String,
  pub display_name: String,
  pub created_at:   String,
}

impl RawSubject {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_id:   row.get(0)?,
      guardian_id:  row.get(1)?,
      display_name: row.get(2)?,
      created_at:   row.get(3)?,
    })
  }

  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      subject_id:   decode_uuid(&self.subject_id)?,
      guardian_id:  decode_uuid(&self.guardian_id)?,
      display_name: self.display_name,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}
