//! [`SqliteStore`] — the SQLite implementation of the `kiddie-core` store
//! traits.

use std::path::Path;

use chrono::{DateTime, Utc};
use kiddie_core::{
  geo::Coordinate,
  geofence::{GeofenceDefinition, NewGeofence, UpsertOutcome},
  sample::{NewSample, PositionSample},
  store::{GeofenceRegistry, HistoryStore, StoreBackend, SubjectDirectory},
  subject::{NewSubject, Subject},
};
use rusqlite::OptionalExtension as _;
use tracing::info;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    GEOFENCE_COLUMNS, RawGeofence, RawSample, RawSubject, SAMPLE_COLUMNS,
    SUBJECT_COLUMNS, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A location store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All
/// statements run on the connection's single background thread, so each
/// `call` below is atomic with respect to every other call.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

impl StoreBackend for SqliteStore {
  type Error = Error;
}

// ─── HistoryStore impl ───────────────────────────────────────────────────────

impl HistoryStore for SqliteStore {
  async fn append(&self, input: NewSample) -> Result<PositionSample> {
    let sample = PositionSample {
      sample_id:   Uuid::new_v4(),
      subject_id:  input.subject_id,
      latitude:    input.coordinate.latitude(),
      longitude:   input.coordinate.longitude(),
      label:       input.label,
      observed_at: input.observed_at,
    };

    let sample_id_str  = encode_uuid(sample.sample_id);
    let subject_id_str = encode_uuid(sample.subject_id);
    let at_str         = encode_dt(sample.observed_at);
    let label          = sample.label.clone();
    let (lat, lon)     = (sample.latitude, sample.longitude);

    // The EXISTS guard turns a dangling subject into zero inserted rows
    // instead of a foreign-key failure.
    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO position_samples
             (sample_id, subject_id, latitude, longitude, label, observed_at)
           SELECT ?1, ?2, ?3, ?4, ?5, ?6
           WHERE EXISTS (SELECT 1 FROM subjects WHERE subject_id = ?2)",
          rusqlite::params![sample_id_str, subject_id_str, lat, lon, label, at_str],
        )?)
      })
      .await?;

    if inserted == 0 {
      return Err(kiddie_core::Error::SubjectNotFound(sample.subject_id).into());
    }
    Ok(sample)
  }

  async fn refresh_latest(
    &self,
    subject_id: Uuid,
    coordinate: Coordinate,
    at:         DateTime<Utc>,
  ) -> Result<PositionSample> {
    let subject_id_str = encode_uuid(subject_id);
    let at_str         = encode_dt(at);
    let (lat, lon)     = (coordinate.latitude(), coordinate.longitude());

    let raw: Option<RawSample> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "UPDATE position_samples
                 SET latitude = ?2, longitude = ?3, observed_at = ?4
               WHERE seq = (
                 SELECT seq FROM position_samples
                 WHERE subject_id = ?1
                 ORDER BY observed_at DESC, seq DESC
                 LIMIT 1
               )
               RETURNING {SAMPLE_COLUMNS}"
            ),
            rusqlite::params![subject_id_str, lat, lon, at_str],
            RawSample::from_row,
          )
          .optional()?)
      })
      .await?;

    raw
      .ok_or(kiddie_core::Error::NoHistory(subject_id))?
      .into_sample()
  }

  async fn most_recent(&self, subject_id: Uuid) -> Result<Option<PositionSample>> {
    let subject_id_str = encode_uuid(subject_id);

    let raw: Option<RawSample> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {SAMPLE_COLUMNS} FROM position_samples
               WHERE subject_id = ?1
               ORDER BY observed_at DESC, seq DESC
               LIMIT 1"
            ),
            rusqlite::params![subject_id_str],
            RawSample::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSample::into_sample).transpose()
  }

  async fn all_in_order(&self, subject_id: Uuid) -> Result<Vec<PositionSample>> {
    let subject_id_str = encode_uuid(subject_id);

    let raws: Vec<RawSample> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SAMPLE_COLUMNS} FROM position_samples
           WHERE subject_id = ?1
           ORDER BY observed_at ASC, seq ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![subject_id_str], RawSample::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSample::into_sample).collect()
  }

  async fn delete_all(&self, subject_id: Uuid) -> Result<u64> {
    let subject_id_str = encode_uuid(subject_id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM position_samples WHERE subject_id = ?1",
          rusqlite::params![subject_id_str],
        )?)
      })
      .await?;

    Ok(removed as u64)
  }
}

// ─── GeofenceRegistry impl ───────────────────────────────────────────────────

impl GeofenceRegistry for SqliteStore {
  async fn upsert(
    &self,
    input: NewGeofence,
  ) -> Result<(GeofenceDefinition, UpsertOutcome)> {
    input.validate()?;

    let candidate_id   = Uuid::new_v4();
    let id_str         = encode_uuid(candidate_id);
    let subject_id_str = encode_uuid(input.subject_id);
    let now_str        = encode_dt(Utc::now());
    let name           = input.name;
    let (lat, lon)     = (input.center.latitude(), input.center.longitude());
    let radius         = input.radius_meters;

    // Single statement: insert, or overwrite everything but the id and
    // created_at of the existing row.
    let raw: Option<RawGeofence> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "INSERT INTO geofences (
                 geofence_id, subject_id, name,
                 center_latitude, center_longitude, radius_meters,
                 created_at, updated_at
               )
               SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7
               WHERE EXISTS (SELECT 1 FROM subjects WHERE subject_id = ?2)
               ON CONFLICT (subject_id) DO UPDATE SET
                 name             = excluded.name,
                 center_latitude  = excluded.center_latitude,
                 center_longitude = excluded.center_longitude,
                 radius_meters    = excluded.radius_meters,
                 updated_at       = excluded.updated_at
               RETURNING {GEOFENCE_COLUMNS}"
            ),
            rusqlite::params![id_str, subject_id_str, name, lat, lon, radius, now_str],
            RawGeofence::from_row,
          )
          .optional()?)
      })
      .await?;

    let fence = raw
      .ok_or(kiddie_core::Error::SubjectNotFound(input.subject_id))?
      .into_geofence()?;

    let outcome = if fence.geofence_id == candidate_id {
      UpsertOutcome::Created
    } else {
      UpsertOutcome::Replaced
    };
    info!(
      subject_id = %fence.subject_id,
      radius_meters = fence.radius_meters,
      ?outcome,
      "geofence saved"
    );
    Ok((fence, outcome))
  }

  async fn get(&self, subject_id: Uuid) -> Result<Option<GeofenceDefinition>> {
    let subject_id_str = encode_uuid(subject_id);

    let raw: Option<RawGeofence> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {GEOFENCE_COLUMNS} FROM geofences WHERE subject_id = ?1"),
            rusqlite::params![subject_id_str],
            RawGeofence::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawGeofence::into_geofence).transpose()
  }

  async fn delete_for_subject(&self, subject_id: Uuid) -> Result<bool> {
    let subject_id_str = encode_uuid(subject_id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM geofences WHERE subject_id = ?1",
          rusqlite::params![subject_id_str],
        )?)
      })
      .await?;

    Ok(removed > 0)
  }
}

// ─── SubjectDirectory impl ───────────────────────────────────────────────────

impl SubjectDirectory for SqliteStore {
  async fn register_subject(&self, input: NewSubject) -> Result<Subject> {
    let subject = Subject {
      subject_id:   Uuid::new_v4(),
      guardian_id:  input.guardian_id,
      display_name: input.display_name,
      created_at:   Utc::now(),
    };

    let id_str       = encode_uuid(subject.subject_id);
    let guardian_str = encode_uuid(subject.guardian_id);
    let name         = subject.display_name.clone();
    let at_str       = encode_dt(subject.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subjects (subject_id, guardian_id, display_name, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, guardian_str, name, at_str],
        )?;
        Ok(())
      })
      .await?;

    info!(subject_id = %subject.subject_id, guardian_id = %subject.guardian_id, "subject registered");
    Ok(subject)
  }

  async fn get_subject(&self, subject_id: Uuid) -> Result<Option<Subject>> {
    let id_str = encode_uuid(subject_id);

    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE subject_id = ?1"),
            rusqlite::params![id_str],
            RawSubject::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }

  async fn subject_exists(&self, subject_id: Uuid) -> Result<bool> {
    Ok(self.subject_owner(subject_id).await?.is_some())
  }

  async fn subject_owner(&self, subject_id: Uuid) -> Result<Option<Uuid>> {
    let id_str = encode_uuid(subject_id);

    let owner: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT guardian_id FROM subjects WHERE subject_id = ?1",
            rusqlite::params![id_str],
            |row| row.get(0),
          )
          .optional()?)
      })
      .await?;

    owner
      .map(|s| Uuid::parse_str(&s))
      .transpose()
      .map_err(Error::Uuid)
  }

  async fn list_subjects(&self, guardian_id: Uuid) -> Result<Vec<Subject>> {
    let guardian_str = encode_uuid(guardian_id);

    let raws: Vec<RawSubject> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBJECT_COLUMNS} FROM subjects
           WHERE guardian_id = ?1
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![guardian_str], RawSubject::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubject::into_subject).collect()
  }

  async fn remove_subject(&self, subject_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(subject_id);

    let (samples, fences, subjects) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let samples = tx.execute(
          "DELETE FROM position_samples WHERE subject_id = ?1",
          rusqlite::params![id_str],
        )?;
        let fences = tx.execute(
          "DELETE FROM geofences WHERE subject_id = ?1",
          rusqlite::params![id_str],
        )?;
        let subjects = tx.execute(
          "DELETE FROM subjects WHERE subject_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok((samples, fences, subjects))
      })
      .await?;

    if subjects > 0 {
      info!(%subject_id, samples, geofences = fences, "subject removed");
    }
    Ok(subjects > 0)
  }
}
