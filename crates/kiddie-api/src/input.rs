//! Request-body extraction.
//!
//! [`JsonBody`] replaces axum's `Json` extractor so that undecodable bodies
//! answer 400 with the usual `{"error": …}` shape.
//!
//! Browser forms and some device clients send coordinates as strings. Both
//! `12.5` and `"12.5"` are accepted; whether the value is finite and in range
//! is decided by `kiddie-core`, not here.

use axum::extract::FromRequest;
use serde::Deserialize;

use crate::error::ApiError;

/// A JSON request body; rejections become [`ApiError::BadRequest`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Number {
  Float(f64),
  Text(String),
}

impl Number {
  pub fn parse(&self, field: &str) -> Result<f64, ApiError> {
    match self {
      Number::Float(v) => Ok(*v),
      Number::Text(s) => s
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("{field} is not a number: {s:?}"))),
    }
  }
}

/// Parse a required field, reporting it by name when absent.
pub fn required(value: Option<&Number>, field: &str) -> Result<f64, ApiError> {
  value
    .ok_or_else(|| ApiError::BadRequest(format!("missing field: {field}")))?
    .parse(field)
}
