//! Spherical-earth geometry: validated coordinates and haversine distance.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A WGS84 position in decimal degrees.
///
/// Construction through [`Coordinate::new`] guarantees both components are
/// finite and within range, so every `Coordinate` is a valid input to
/// [`distance_meters`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
  latitude:  f64,
  longitude: f64,
}

impl Coordinate {
  pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
    if !latitude.is_finite() || !longitude.is_finite() {
      return Err(Error::NonFiniteCoordinate);
    }
    if !(-90.0..=90.0).contains(&latitude) {
      return Err(Error::LatitudeOutOfRange(latitude));
    }
    if !(-180.0..=180.0).contains(&longitude) {
      return Err(Error::LongitudeOutOfRange(longitude));
    }
    Ok(Self { latitude, longitude })
  }

  pub fn latitude(&self) -> f64 { self.latitude }

  pub fn longitude(&self) -> f64 { self.longitude }
}

#[derive(Deserialize)]
struct RawCoordinate {
  latitude:  f64,
  longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
  type Error = Error;

  fn try_from(raw: RawCoordinate) -> Result<Self> {
    Coordinate::new(raw.latitude, raw.longitude)
  }
}

/// Haversine great-circle distance in meters between two points given in
/// degrees.
///
/// Symmetric in its arguments and exactly `0.0` for identical points. Never
/// panics: out-of-range but finite inputs still yield a finite distance (the
/// haversine term is clamped to `[0, 1]`), and a NaN input propagates to a NaN
/// result.
pub fn distance_meters(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
  let d_lat = (lat_b - lat_a).to_radians();
  let d_lon = (lon_b - lon_a).to_radians();

  let h = (d_lat / 2.0).sin().powi(2)
    + lat_a.to_radians().cos()
      * lat_b.to_radians().cos()
      * (d_lon / 2.0).sin().powi(2);
  let h = h.clamp(0.0, 1.0);

  2.0 * EARTH_RADIUS_METERS * h.sqrt().atan2((1.0 - h).sqrt())
}
