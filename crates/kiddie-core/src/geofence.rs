//! Geofence definitions — one circular safety zone per subject.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, geo::Coordinate};

/// Name given to a zone when the guardian leaves it blank.
pub const DEFAULT_ZONE_NAME: &str = "Unnamed Zone";

/// Radius used when a request does not specify one.
pub const DEFAULT_RADIUS_METERS: f64 = 100.0;

/// A guardian-configured circular zone. At most one exists per subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceDefinition {
  pub geofence_id:      Uuid,
  pub subject_id:       Uuid,
  pub name:             String,
  pub center_latitude:  f64,
  pub center_longitude: f64,
  pub radius_meters:    f64,
  /// Set when the subject's first geofence is created; survives replacement.
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

/// Input to [`crate::store::GeofenceRegistry::upsert`].
#[derive(Debug, Clone)]
pub struct NewGeofence {
  pub subject_id:    Uuid,
  pub name:          String,
  pub center:        Coordinate,
  pub radius_meters: f64,
}

impl NewGeofence {
  /// Build a validated definition request.
  ///
  /// A blank `name` becomes [`DEFAULT_ZONE_NAME`]. The radius must be finite
  /// and strictly positive.
  pub fn new(
    subject_id: Uuid,
    name: impl Into<String>,
    center: Coordinate,
    radius_meters: f64,
  ) -> Result<Self> {
    let input = Self {
      subject_id,
      name: normalize_name(name.into()),
      center,
      radius_meters,
    };
    input.validate()?;
    Ok(input)
  }

  /// Re-check the radius; storage backends call this before writing since
  /// the fields are public.
  pub fn validate(&self) -> Result<()> {
    if self.radius_meters.is_finite() && self.radius_meters > 0.0 {
      Ok(())
    } else {
      Err(Error::InvalidRadius(self.radius_meters))
    }
  }
}

fn normalize_name(name: String) -> String {
  let trimmed = name.trim();
  if trimmed.is_empty() {
    DEFAULT_ZONE_NAME.to_owned()
  } else {
    trimmed.to_owned()
  }
}

/// Whether an upsert inserted a new definition or overwrote the existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
  Created,
  Replaced,
}
