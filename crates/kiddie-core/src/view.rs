//! Subject views — the read model behind status pages and overlays.
//!
//! A view bundles a subject with its last known position, its geofence, and
//! the membership status derived from the two. Views are never stored.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  geofence::GeofenceDefinition,
  membership::{MembershipResult, classify},
  sample::PositionSample,
  store::{GeofenceRegistry, HistoryStore, SubjectDirectory},
  subject::Subject,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectView {
  pub subject:     Subject,
  pub last_sample: Option<PositionSample>,
  pub geofence:    Option<GeofenceDefinition>,
  pub membership:  MembershipResult,
}

/// Assemble the view for one subject.
pub async fn materialize<S>(
  store: &S,
  subject: Subject,
) -> Result<SubjectView, S::Error>
where
  S: HistoryStore + GeofenceRegistry,
{
  let last_sample = store.most_recent(subject.subject_id).await?;
  let geofence = store.get(subject.subject_id).await?;
  let membership = classify(geofence.as_ref(), last_sample.as_ref());

  Ok(SubjectView {
    subject,
    last_sample,
    geofence,
    membership,
  })
}

/// Views for every subject owned by `guardian_id`, newest registration first.
pub async fn guardian_overview<S>(
  store: &S,
  guardian_id: Uuid,
) -> Result<Vec<SubjectView>, S::Error>
where
  S: HistoryStore + GeofenceRegistry + SubjectDirectory,
{
  let subjects = store.list_subjects(guardian_id).await?;
  let mut views = Vec::with_capacity(subjects.len());
  for subject in subjects {
    views.push(materialize(store, subject).await?);
  }
  Ok(views)
}
