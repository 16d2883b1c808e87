//! Core types and trait definitions for the Kiddie location tracker.
//!
//! This crate holds the location and geofence evaluation engine: coordinate
//! validation and great-circle distance, the sample ingestion policy, and
//! inside/outside classification. It is free of HTTP and database
//! dependencies; storage backends implement the traits in [`store`].

// Native `async fn` in traits; the store traits spell out their `Send` bounds.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod geo;
pub mod geofence;
pub mod ingest;
pub mod membership;
pub mod sample;
pub mod store;
pub mod subject;
pub mod view;

pub use error::{Classify, Error, ErrorKind, Result};
