//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! | Variant | Status |
//! |---------|--------|
//! | `Unauthorized` | 401, empty body |
//! | `NotFound` | 404 |
//! | `BadRequest` | 400 |
//! | `Unsupported` | 501 |
//! | `Internal`, `Serialization` | 500 |

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use census_core::store::StoreError;
use serde_json::json;
use thiserror::Error;

pub(crate) const NOT_FOUND_MESSAGE: &str = "A database result was not found";
pub(crate) const UNHANDLED_MESSAGE: &str = "An unhandled exception has occurred";

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The specific cause is logged where it is detected and then dropped.
  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unsupported operation: {0}")]
  Unsupported(&'static str),

  #[error("internal error: {source}")]
  Internal {
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
    /// Put the error text in the response body (debug mode).
    expose: bool,
  },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl ApiError {
  /// Classify a store failure: not-found and bad input keep their meaning,
  /// everything else becomes an internal error.
  pub fn from_store<E: StoreError>(e: E, expose: bool) -> Self {
    let message = e.to_string();
    let mapped = match e.as_core() {
      Some(census_core::Error::NotFound { .. }) => Some(Self::NotFound(message)),
      Some(census_core::Error::Unsupported(op)) => Some(Self::Unsupported(*op)),
      Some(core) if core.is_invalid_input() => Some(Self::BadRequest(message)),
      _ => None,
    };
    mapped.unwrap_or_else(|| Self::Internal { source: Box::new(e), expose })
  }

  pub fn internal(
    e: impl std::error::Error + Send + Sync + 'static,
    expose: bool,
  ) -> Self {
    Self::Internal { source: Box::new(e), expose }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::Unauthorized => {
        tracing::warn!("Unauthorized access attempt has been made on the system");
        let mut res = StatusCode::UNAUTHORIZED.into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Bearer realm=\"census\""),
        );
        res
      }
      ApiError::NotFound(detail) => {
        tracing::debug!(%detail, "not found");
        message(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE)
      }
      ApiError::BadRequest(detail) => message(StatusCode::BAD_REQUEST, &detail),
      ApiError::Unsupported(op) => message(
        StatusCode::NOT_IMPLEMENTED,
        &format!("unsupported operation: {op}"),
      ),
      ApiError::Internal { source, expose } => {
        tracing::error!(error = %source, "{UNHANDLED_MESSAGE}");
        if expose {
          message(StatusCode::INTERNAL_SERVER_ERROR, &source.to_string())
        } else {
          message(StatusCode::INTERNAL_SERVER_ERROR, UNHANDLED_MESSAGE)
        }
      }
      ApiError::Serialization(e) => {
        tracing::error!(error = %e, "{UNHANDLED_MESSAGE}");
        message(StatusCode::INTERNAL_SERVER_ERROR, UNHANDLED_MESSAGE)
      }
    }
  }
}

fn message(status: StatusCode, message: &str) -> Response {
  (status, Json(json!({ "message": message }))).into_response()
}
