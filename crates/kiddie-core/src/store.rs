//! Storage traits for position history, geofences, and the subject directory.
//!
//! The traits are implemented by storage backends (e.g.
//! `kiddie-store-sqlite`). The engine in this crate and the HTTP layer depend
//! on these abstractions, not on any concrete backend.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Classify,
  geo::Coordinate,
  geofence::{GeofenceDefinition, NewGeofence, UpsertOutcome},
  sample::{NewSample, PositionSample},
  subject::{NewSubject, Subject},
};

/// Shared error plumbing for every store trait.
///
/// A single backend usually implements all three traits; carrying the error
/// type here keeps `S::Error` unambiguous in generic code.
pub trait StoreBackend: Send + Sync {
  type Error: std::error::Error
    + From<crate::Error>
    + Classify
    + Send
    + Sync
    + 'static;
}

// ─── History ─────────────────────────────────────────────────────────────────

/// Ordered log of position samples per subject.
///
/// The log is append-only except for its tail: [`HistoryStore::refresh_latest`]
/// is the single way to modify an existing record, and it can only reach the
/// most recent one. Callers must serialise writes per subject (see
/// [`crate::ingest::SampleIngestor`]).
pub trait HistoryStore: StoreBackend {
  /// Append a sample to the end of the subject's history.
  fn append(
    &self,
    sample: NewSample,
  ) -> impl Future<Output = Result<PositionSample, Self::Error>> + Send + '_;

  /// Move the most recent sample to `coordinate` and restamp it with `at`.
  ///
  /// Fails with a not-found error when the subject has no history.
  fn refresh_latest(
    &self,
    subject_id: Uuid,
    coordinate: Coordinate,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<PositionSample, Self::Error>> + Send + '_;

  /// The sample with the greatest `observed_at`, or `None` if there is none.
  fn most_recent(
    &self,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<Option<PositionSample>, Self::Error>> + Send + '_;

  /// Every sample for the subject, ascending by `observed_at`.
  fn all_in_order(
    &self,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<Vec<PositionSample>, Self::Error>> + Send + '_;

  /// Remove the subject's entire history. Returns the number of samples
  /// removed.
  fn delete_all(
    &self,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}

// ─── Geofences ───────────────────────────────────────────────────────────────

/// Holds at most one [`GeofenceDefinition`] per subject.
pub trait GeofenceRegistry: StoreBackend {
  /// Create the subject's geofence, or overwrite it if one exists.
  ///
  /// Must be a single atomic write: on replacement every field except
  /// `geofence_id` and `created_at` is overwritten and `updated_at` is set to
  /// now. Fails with an invalid-input error for a non-positive radius.
  fn upsert(
    &self,
    input: NewGeofence,
  ) -> impl Future<Output = Result<(GeofenceDefinition, UpsertOutcome), Self::Error>>
  + Send
  + '_;

  /// The subject's geofence, or `None`.
  fn get(
    &self,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<Option<GeofenceDefinition>, Self::Error>>
  + Send
  + '_;

  /// Remove the subject's geofence. Returns `true` if one existed.
  fn delete_for_subject(
    &self,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Subjects ────────────────────────────────────────────────────────────────

/// The guardian/subject registry consulted before writes.
pub trait SubjectDirectory: StoreBackend {
  fn register_subject(
    &self,
    input: NewSubject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  fn get_subject(
    &self,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  fn subject_exists(
    &self,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// The guardian that owns the subject, or `None` if the subject is unknown.
  fn subject_owner(
    &self,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<Option<Uuid>, Self::Error>> + Send + '_;

  /// All subjects of a guardian, most recently registered first.
  fn list_subjects(
    &self,
    guardian_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  /// Remove a subject together with its history and geofence in one
  /// transaction. Returns `false` if the subject did not exist.
  fn remove_subject(
    &self,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
