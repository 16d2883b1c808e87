//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::Arc;

use chrono::{Duration, Utc};
use kiddie_core::{
  Classify, ErrorKind,
  geo::{Coordinate, distance_meters},
  geofence::{NewGeofence, UpsertOutcome},
  ingest::SampleIngestor,
  membership::{MembershipResult, evaluate},
  sample::{IngestOutcome, NewSample},
  store::{GeofenceRegistry, HistoryStore, SubjectDirectory},
  subject::NewSubject,
  view::{guardian_overview, materialize},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn subject(s: &SqliteStore, guardian_id: Uuid, name: &str) -> Uuid {
  s.register_subject(NewSubject {
    guardian_id,
    display_name: name.into(),
  })
  .await
  .unwrap()
  .subject_id
}

fn coord(lat: f64, lon: f64) -> Coordinate { Coordinate::new(lat, lon).unwrap() }

fn fence(subject_id: Uuid, lat: f64, lon: f64, radius: f64) -> NewGeofence {
  NewGeofence::new(subject_id, "Home", coord(lat, lon), radius).unwrap()
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_and_get_subject() {
  let s = store().await;
  let guardian = Uuid::new_v4();

  let id = subject(&s, guardian, "Ana").await;

  let fetched = s.get_subject(id).await.unwrap().unwrap();
  assert_eq!(fetched.guardian_id, guardian);
  assert_eq!(fetched.display_name, "Ana");
  assert!(s.subject_exists(id).await.unwrap());
  assert_eq!(s.subject_owner(id).await.unwrap(), Some(guardian));
}

#[tokio::test]
async fn unknown_subject_has_no_owner() {
  let s = store().await;
  let id = Uuid::new_v4();
  assert!(s.get_subject(id).await.unwrap().is_none());
  assert!(!s.subject_exists(id).await.unwrap());
  assert_eq!(s.subject_owner(id).await.unwrap(), None);
}

#[tokio::test]
async fn list_subjects_is_scoped_to_guardian() {
  let s = store().await;
  let g1 = Uuid::new_v4();
  let g2 = Uuid::new_v4();
  let first = subject(&s, g1, "Ana").await;
  subject(&s, g2, "Ben").await;
  let second = subject(&s, g1, "Cara").await;

  let listed = s.list_subjects(g1).await.unwrap();
  let ids: Vec<Uuid> = listed.iter().map(|s| s.subject_id).collect();
  assert_eq!(ids, vec![second, first]);
}

#[tokio::test]
async fn remove_subject_cascades() {
  let s = store().await;
  let id = subject(&s, Uuid::new_v4(), "Ana").await;
  let ingestor = SampleIngestor::new(Arc::new(s.clone()));
  ingestor.ingest(id, 10.3, 123.9, "Home").await.unwrap();
  ingestor.ingest(id, 10.4, 123.9, "School").await.unwrap();
  s.upsert(fence(id, 10.3, 123.9, 200.0)).await.unwrap();

  assert!(s.remove_subject(id).await.unwrap());

  assert!(s.get_subject(id).await.unwrap().is_none());
  assert!(s.all_in_order(id).await.unwrap().is_empty());
  assert!(s.get(id).await.unwrap().is_none());
  assert!(!s.remove_subject(id).await.unwrap());
}

// ─── History ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn append_to_unknown_subject_is_not_found() {
  let s = store().await;
  let err = s
    .append(NewSample {
      subject_id:  Uuid::new_v4(),
      coordinate:  coord(0.0, 0.0),
      label:       "Nowhere".into(),
      observed_at: Utc::now(),
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn refresh_latest_without_history_is_not_found() {
  let s = store().await;
  let id = subject(&s, Uuid::new_v4(), "Ana").await;
  let err = s
    .refresh_latest(id, coord(0.0, 0.0), Utc::now())
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(kiddie_core::Error::NoHistory(_))
  ));
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn all_in_order_sorts_by_observed_at() {
  let s = store().await;
  let id = subject(&s, Uuid::new_v4(), "Ana").await;
  let now = Utc::now();

  // Physically inserted out of chronological order.
  for (label, offset) in [("B", 20), ("A", 10), ("C", 30)] {
    s.append(NewSample {
      subject_id:  id,
      coordinate:  coord(1.0, 1.0),
      label:       label.into(),
      observed_at: now + Duration::seconds(offset),
    })
    .await
    .unwrap();
  }

  let labels: Vec<String> = s
    .all_in_order(id)
    .await
    .unwrap()
    .into_iter()
    .map(|sample| sample.label)
    .collect();
  assert_eq!(labels, ["A", "B", "C"]);

  let latest = s.most_recent(id).await.unwrap().unwrap();
  assert_eq!(latest.label, "C");
}

#[tokio::test]
async fn refresh_latest_patches_only_the_tail() {
  let s = store().await;
  let id = subject(&s, Uuid::new_v4(), "Ana").await;
  let now = Utc::now();
  for (label, offset) in [("A", 0), ("B", 10)] {
    s.append(NewSample {
      subject_id:  id,
      coordinate:  coord(1.0, 1.0),
      label:       label.into(),
      observed_at: now + Duration::seconds(offset),
    })
    .await
    .unwrap();
  }

  let later = now + Duration::seconds(60);
  let refreshed = s.refresh_latest(id, coord(2.0, 2.0), later).await.unwrap();
  assert_eq!(refreshed.label, "B");
  assert_eq!(refreshed.latitude, 2.0);
  assert_eq!(refreshed.observed_at, later);

  let all = s.all_in_order(id).await.unwrap();
  assert_eq!(all.len(), 2);
  assert_eq!(all[0].latitude, 1.0);
  assert_eq!(all[0].observed_at, now);
}

#[tokio::test]
async fn delete_all_empties_history() {
  let s = store().await;
  let id = subject(&s, Uuid::new_v4(), "Ana").await;
  let ingestor = SampleIngestor::new(Arc::new(s.clone()));
  ingestor.ingest(id, 1.0, 1.0, "A").await.unwrap();
  ingestor.ingest(id, 2.0, 2.0, "B").await.unwrap();

  assert_eq!(s.delete_all(id).await.unwrap(), 2);
  assert!(s.most_recent(id).await.unwrap().is_none());
}

// ─── Ingestion ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn same_label_refreshes_timestamp() {
  let s = store().await;
  let id = subject(&s, Uuid::new_v4(), "Ana").await;
  let ingestor = SampleIngestor::new(Arc::new(s.clone()));

  let first = ingestor.ingest(id, 10.3, 123.9, "Cebu City").await.unwrap();
  assert_eq!(first.outcome, IngestOutcome::Created);

  let second = ingestor.ingest(id, 10.3, 123.9, "Cebu City").await.unwrap();
  assert_eq!(second.outcome, IngestOutcome::TimestampRefreshed);
  assert_eq!(second.sample.sample_id, first.sample.sample_id);

  let history = s.all_in_order(id).await.unwrap();
  assert_eq!(history.len(), 1);

  let latest = s.most_recent(id).await.unwrap().unwrap();
  assert!(latest.observed_at > first.sample.observed_at);
}

#[tokio::test]
async fn refresh_moves_coordinates() {
  let s = store().await;
  let id = subject(&s, Uuid::new_v4(), "Ana").await;
  let ingestor = SampleIngestor::new(Arc::new(s.clone()));

  ingestor.ingest(id, 10.3, 123.9, "Mall").await.unwrap();
  ingestor.ingest(id, 10.31, 123.91, "Mall").await.unwrap();

  let latest = s.most_recent(id).await.unwrap().unwrap();
  assert_eq!((latest.latitude, latest.longitude), (10.31, 123.91));
  assert_eq!(latest.label, "Mall");
}

#[tokio::test]
async fn different_label_grows_history() {
  let s = store().await;
  let id = subject(&s, Uuid::new_v4(), "Ana").await;
  let ingestor = SampleIngestor::new(Arc::new(s.clone()));

  ingestor.ingest(id, 10.3157, 123.8854, "Cebu City").await.unwrap();
  let second = ingestor.ingest(id, 14.5995, 120.9842, "Manila").await.unwrap();
  assert_eq!(second.outcome, IngestOutcome::Created);

  let history = s.all_in_order(id).await.unwrap();
  assert_eq!(history.len(), 2);
  assert_eq!(history[0].label, "Cebu City");
  assert_eq!(history[1].label, "Manila");
  assert!(history[0].observed_at < history[1].observed_at);
}

#[tokio::test]
async fn returning_to_an_earlier_label_appends() {
  let s = store().await;
  let id = subject(&s, Uuid::new_v4(), "Ana").await;
  let ingestor = SampleIngestor::new(Arc::new(s.clone()));

  for label in ["Home", "School", "Home"] {
    ingestor.ingest(id, 1.0, 1.0, label).await.unwrap();
  }
  assert_eq!(s.all_in_order(id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn invalid_coordinates_write_nothing() {
  let s = store().await;
  let id = subject(&s, Uuid::new_v4(), "Ana").await;
  let ingestor = SampleIngestor::new(Arc::new(s.clone()));

  for (lat, lon) in [(f64::NAN, 0.0), (0.0, f64::INFINITY), (91.0, 0.0), (0.0, 181.0)] {
    let err = ingestor.ingest(id, lat, lon, "Bad").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
  }
  assert!(s.all_in_order(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_same_label_ingests_do_not_duplicate() {
  let s = store().await;
  let id = subject(&s, Uuid::new_v4(), "Ana").await;
  let ingestor = Arc::new(SampleIngestor::new(Arc::new(s.clone())));

  let handles: Vec<_> = (0..16)
    .map(|_| {
      let ingestor = ingestor.clone();
      tokio::spawn(async move { ingestor.ingest(id, 1.0, 1.0, "Park").await })
    })
    .collect();

  let mut created = 0;
  for handle in handles {
    if handle.await.unwrap().unwrap().outcome == IngestOutcome::Created {
      created += 1;
    }
  }
  assert_eq!(created, 1);
  assert_eq!(s.all_in_order(id).await.unwrap().len(), 1);
}

// ─── Geofences ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_replaces_instead_of_duplicating() {
  let s = store().await;
  let id = subject(&s, Uuid::new_v4(), "Ana").await;

  let (first, outcome) = s.upsert(fence(id, 10.3, 123.9, 100.0)).await.unwrap();
  assert_eq!(outcome, UpsertOutcome::Created);
  assert_eq!(first.created_at, first.updated_at);

  let mut replacement = fence(id, 10.4, 124.0, 250.0);
  replacement.name = "School".into();
  let (second, outcome) = s.upsert(replacement).await.unwrap();
  assert_eq!(outcome, UpsertOutcome::Replaced);
  assert_eq!(second.geofence_id, first.geofence_id);
  assert_eq!(second.created_at, first.created_at);
  assert!(second.updated_at >= first.updated_at);

  let stored = s.get(id).await.unwrap().unwrap();
  assert_eq!(stored.radius_meters, 250.0);
  assert_eq!(stored.name, "School");
  assert_eq!(stored.center_latitude, 10.4);
}

#[tokio::test]
async fn upsert_rejects_bad_radius() {
  let s = store().await;
  let id = subject(&s, Uuid::new_v4(), "Ana").await;

  let mut input = fence(id, 10.3, 123.9, 100.0);
  input.radius_meters = 0.0;
  let err = s.upsert(input).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::InvalidInput);
  assert!(s.get(id).await.unwrap().is_none());
}

#[tokio::test]
async fn upsert_for_unknown_subject_is_not_found() {
  let s = store().await;
  let err = s
    .upsert(fence(Uuid::new_v4(), 0.0, 0.0, 10.0))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn delete_for_subject() {
  let s = store().await;
  let id = subject(&s, Uuid::new_v4(), "Ana").await;
  s.upsert(fence(id, 0.0, 0.0, 10.0)).await.unwrap();

  assert!(s.delete_for_subject(id).await.unwrap());
  assert!(!s.delete_for_subject(id).await.unwrap());
  assert!(s.get(id).await.unwrap().is_none());
}

// ─── Membership ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn evaluate_missing_data() {
  let s = store().await;
  let ingestor = SampleIngestor::new(Arc::new(s.clone()));

  let fenced = subject(&s, Uuid::new_v4(), "Ana").await;
  s.upsert(fence(fenced, 10.3, 123.9, 200.0)).await.unwrap();
  assert_eq!(evaluate(&s, fenced).await.unwrap(), MembershipResult::NoSample);

  let tracked = subject(&s, Uuid::new_v4(), "Ben").await;
  ingestor.ingest(tracked, 10.3, 123.9, "Home").await.unwrap();
  assert_eq!(evaluate(&s, tracked).await.unwrap(), MembershipResult::NoGeofence);
}

#[tokio::test]
async fn evaluate_boundary_is_inside() {
  let s = store().await;
  let id = subject(&s, Uuid::new_v4(), "Ana").await;
  let ingestor = SampleIngestor::new(Arc::new(s.clone()));

  let radius = distance_meters(10.3, 123.9, 10.3, 123.902);
  s.upsert(fence(id, 10.3, 123.9, radius)).await.unwrap();

  ingestor.ingest(id, 10.3, 123.902, "Edge").await.unwrap();
  assert_eq!(evaluate(&s, id).await.unwrap(), MembershipResult::Inside);

  // Roughly one meter further east.
  ingestor.ingest(id, 10.3, 123.902_01, "Past edge").await.unwrap();
  match evaluate(&s, id).await.unwrap() {
    MembershipResult::Outside { distance_meters } => assert!(distance_meters > radius),
    other => panic!("expected outside, got {other:?}"),
  }
}

#[tokio::test]
async fn end_to_end_scenario() {
  let s = store().await;
  let s1 = subject(&s, Uuid::new_v4(), "S1").await;
  let ingestor = SampleIngestor::new(Arc::new(s.clone()));

  s.upsert(fence(s1, 10.3000, 123.9000, 200.0)).await.unwrap();

  ingestor.ingest(s1, 10.3000, 123.9015, "Near Home").await.unwrap();
  assert_eq!(evaluate(&s, s1).await.unwrap(), MembershipResult::Inside);

  ingestor.ingest(s1, 10.3050, 123.9000, "Far Street").await.unwrap();
  match evaluate(&s, s1).await.unwrap() {
    MembershipResult::Outside { distance_meters } => {
      assert!((distance_meters - 556.0).abs() < 2.0, "got {distance_meters}");
    }
    other => panic!("expected outside, got {other:?}"),
  }
}

// ─── Views ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn overview_reports_membership_per_subject() {
  let s = store().await;
  let guardian = Uuid::new_v4();
  let ingestor = SampleIngestor::new(Arc::new(s.clone()));

  let home = subject(&s, guardian, "Ana").await;
  s.upsert(fence(home, 10.3, 123.9, 200.0)).await.unwrap();
  ingestor.ingest(home, 10.3, 123.9, "Home").await.unwrap();

  let untracked = subject(&s, guardian, "Ben").await;

  let views = guardian_overview(&s, guardian).await.unwrap();
  assert_eq!(views.len(), 2);
  assert_eq!(views[0].subject.subject_id, untracked);
  assert_eq!(views[0].membership, MembershipResult::NoGeofence);
  assert!(views[0].last_sample.is_none());
  assert_eq!(views[1].subject.subject_id, home);
  assert_eq!(views[1].membership, MembershipResult::Inside);

  let one = materialize(&s, s.get_subject(home).await.unwrap().unwrap())
    .await
    .unwrap();
  assert_eq!(one.last_sample.unwrap().label, "Home");
  assert_eq!(one.geofence.unwrap().radius_meters, 200.0);
}
