//! Sample ingestion and the deduplication policy.
//!
//! A raw observation either extends a subject's history or, when it carries
//! the same label as the latest sample, refreshes that sample in place. The
//! label comparison is exact and case-sensitive; elapsed time and distance
//! moved are not considered.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
};

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::{
  geo::Coordinate,
  sample::{IngestOutcome, Ingested, NewSample, PositionSample, next_observed_at},
  store::HistoryStore,
};

/// Lock table size above which idle entries are dropped.
const LOCK_TABLE_PRUNE_AT: usize = 1024;

/// Writes observations into a [`HistoryStore`], one subject at a time.
///
/// Each subject gets its own async mutex, held across the read of the latest
/// sample and the subsequent write, so two concurrent "same place" reports
/// cannot both append. Ingestion for different subjects proceeds in parallel,
/// and readers of the store never take these locks.
pub struct SampleIngestor<S> {
  store: Arc<S>,
  locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S: HistoryStore> SampleIngestor<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self {
      store,
      locks: Mutex::new(HashMap::new()),
    }
  }

  /// Record an observation of `subject_id` at (`latitude`, `longitude`).
  ///
  /// The subject is assumed to exist; callers check the subject directory
  /// first. Non-finite or out-of-range coordinates fail before anything is
  /// read or written. Exactly one history write happens on success.
  pub async fn ingest(
    &self,
    subject_id: Uuid,
    latitude: f64,
    longitude: f64,
    label: impl Into<String>,
  ) -> Result<Ingested, S::Error> {
    let coordinate = Coordinate::new(latitude, longitude)?;
    let label = label.into();

    let lock = self.lock_for(subject_id);
    let _guard = lock.lock().await;

    let latest = self.store.most_recent(subject_id).await?;
    let observed_at =
      next_observed_at(latest.as_ref().map(|s| s.observed_at), Utc::now());

    if is_reobservation(latest.as_ref(), &label) {
      let sample = self
        .store
        .refresh_latest(subject_id, coordinate, observed_at)
        .await?;
      debug!(%subject_id, label = %sample.label, "refreshed latest sample");
      return Ok(Ingested {
        outcome: IngestOutcome::TimestampRefreshed,
        sample,
      });
    }

    let sample = self
      .store
      .append(NewSample {
        subject_id,
        coordinate,
        label,
        observed_at,
      })
      .await?;
    debug!(%subject_id, label = %sample.label, "appended sample");
    Ok(Ingested {
      outcome: IngestOutcome::Created,
      sample,
    })
  }

  /// Drop the lock entry of a removed subject.
  pub fn forget(&self, subject_id: Uuid) {
    self
      .locks
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(&subject_id);
  }

  fn lock_for(&self, subject_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
    let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
    if locks.len() >= LOCK_TABLE_PRUNE_AT && !locks.contains_key(&subject_id) {
      // Entries only referenced by the table have no waiter or holder.
      locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }
    locks.entry(subject_id).or_default().clone()
  }
}

/// Whether an incoming `label` repeats the latest sample's label.
pub fn is_reobservation(latest: Option<&PositionSample>, label: &str) -> bool {
  latest.is_some_and(|sample| sample.label == label)
}
