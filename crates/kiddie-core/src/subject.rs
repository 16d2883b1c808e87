//! Subject — a tracked individual owned by a guardian.
//!
//! The directory of subjects is a collaborator of the engine: it answers
//! "does this subject exist" and "who owns it" before ingestion and geofence
//! writes. Everything else about the person lives outside this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tracked subject and the guardian it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
  pub subject_id:   Uuid,
  /// Opaque identifier of the owning guardian.
  pub guardian_id:  Uuid,
  pub display_name: String,
  pub created_at:   DateTime<Utc>,
}

/// Input to [`crate::store::SubjectDirectory::register_subject`].
#[derive(Debug, Clone)]
pub struct NewSubject {
  pub guardian_id:  Uuid,
  pub display_name: String,
}
