//! Error types for `census-core`.

use thiserror::Error;

use crate::entity::EntityId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{table} {id} not found")]
  NotFound { table: &'static str, id: EntityId },

  #[error("invalid value for field {field:?}: {reason}")]
  InvalidField { field: String, reason: String },

  #[error("missing required field {0:?}")]
  MissingField(&'static str),

  #[error("unknown field {0:?}")]
  UnknownField(String),

  #[error("unsupported operation: {0}")]
  Unsupported(&'static str),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
    Self::InvalidField { field: field.into(), reason: reason.into() }
  }

  /// True for failures caused by the caller's input rather than by storage.
  pub fn is_invalid_input(&self) -> bool {
    matches!(
      self,
      Self::InvalidField { .. } | Self::MissingField(_) | Self::UnknownField(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
