//! JSON REST API for the Kiddie location tracker.
//!
//! Exposes an axum [`Router`] backed by any store implementing the
//! `kiddie-core` history, geofence, and subject-directory traits.
//! Authentication, TLS, and transport concerns are the caller's
//! responsibility; see [`access`] for how the caller's identity arrives.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", kiddie_api::api_router(AppState::new(store.clone())))
//! ```

pub mod access;
pub mod error;
pub mod geofences;
pub mod input;
pub mod locations;
pub mod subjects;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use kiddie_core::{
  ingest::SampleIngestor,
  store::{GeofenceRegistry, HistoryStore, SubjectDirectory},
};

pub use error::ApiError;

/// State shared by all handlers.
pub struct AppState<S> {
  pub store:    Arc<S>,
  /// Serialises ingestion per subject; shares `store`.
  pub ingestor: Arc<SampleIngestor<S>>,
}

impl<S: HistoryStore> AppState<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self {
      ingestor: Arc::new(SampleIngestor::new(store.clone())),
      store,
    }
  }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    self.store.clone(),
      ingestor: self.ingestor.clone(),
    }
  }
}

/// Build a fully-materialised API router over `state`.
///
/// Routers built from clones of one [`AppState`] share its ingestor, and so
/// its per-subject locks. Build one `AppState` per store.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: HistoryStore + GeofenceRegistry + SubjectDirectory + 'static,
{
  Router::new()
    // Subjects
    .route("/subjects", get(subjects::list::<S>).post(subjects::create::<S>))
    .route(
      "/subjects/{id}",
      get(subjects::get_one::<S>).delete(subjects::remove::<S>),
    )
    .route("/subjects/{id}/membership", get(subjects::membership::<S>))
    // Locations
    .route("/locations", post(locations::ingest::<S>))
    .route("/locations/{id}", get(locations::latest::<S>))
    .route("/locations/{id}/history", get(locations::history::<S>))
    // Geofences
    .route("/geofences", post(geofences::upsert::<S>))
    .route("/geofences/{id}", get(geofences::get_one::<S>))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
