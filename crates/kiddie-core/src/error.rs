//! Error types for `kiddie-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("coordinate is not a finite number")]
  NonFiniteCoordinate,

  #[error("latitude {0} is outside [-90, 90]")]
  LatitudeOutOfRange(f64),

  #[error("longitude {0} is outside [-180, 180]")]
  LongitudeOutOfRange(f64),

  #[error("geofence radius must be a positive number of meters, got {0}")]
  InvalidRadius(f64),

  #[error("subject not found: {0}")]
  SubjectNotFound(Uuid),

  #[error("subject {0} has no position history")]
  NoHistory(Uuid),

  #[error("no geofence defined for subject {0}")]
  GeofenceNotFound(Uuid),
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::NonFiniteCoordinate
      | Self::LatitudeOutOfRange(_)
      | Self::LongitudeOutOfRange(_)
      | Self::InvalidRadius(_) => ErrorKind::InvalidInput,
      Self::SubjectNotFound(_)
      | Self::NoHistory(_)
      | Self::GeofenceNotFound(_) => ErrorKind::NotFound,
    }
  }
}

/// The three classes of failure the engine reports to its callers.
///
/// Every backend error maps onto one of these so that outer layers can pick a
/// response without knowing the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// Malformed or missing coordinates, or a non-positive radius.
  InvalidInput,
  /// A subject or record that was assumed to exist does not.
  NotFound,
  /// Opaque failure from the persistence boundary.
  StorageFailure,
}

/// Implemented by backend error types so callers can classify them.
pub trait Classify {
  fn kind(&self) -> ErrorKind;
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind { Error::kind(self) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
