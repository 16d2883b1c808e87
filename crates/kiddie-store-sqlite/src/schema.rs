//! SQL schema for the Kiddie SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS subjects (
    subject_id    TEXT PRIMARY KEY,
    guardian_id   TEXT NOT NULL,
    display_name  TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

-- Append-only except for the most recent row of each subject, whose
-- position and observed_at may be refreshed in place.
CREATE TABLE IF NOT EXISTS position_samples (
    seq          INTEGER PRIMARY KEY AUTOINCREMENT,
    sample_id    TEXT NOT NULL UNIQUE,
    subject_id   TEXT NOT NULL REFERENCES subjects(subject_id),
    latitude     REAL NOT NULL CHECK (latitude  BETWEEN -90  AND 90),
    longitude    REAL NOT NULL CHECK (longitude BETWEEN -180 AND 180),
    label        TEXT NOT NULL,
    observed_at  TEXT NOT NULL    -- RFC 3339 UTC, fixed nanosecond width
);

-- One geofence per subject; writes go through INSERT .. ON CONFLICT.
CREATE TABLE IF NOT EXISTS geofences (
    geofence_id       TEXT PRIMARY KEY,
    subject_id        TEXT NOT NULL UNIQUE REFERENCES subjects(subject_id),
    name              TEXT NOT NULL,
    center_latitude   REAL NOT NULL,
    center_longitude  REAL NOT NULL,
    radius_meters     REAL NOT NULL CHECK (radius_meters > 0),
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS subjects_guardian_idx ON subjects(guardian_id);
CREATE INDEX IF NOT EXISTS samples_subject_time_idx
    ON position_samples(subject_id, observed_at);

PRAGMA user_version = 1;
";
