//! Error type for `census-store-sqlite`.

use census_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] census_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored column holds a value that does not match its declared kind.
  #[error("column decode error: {0}")]
  Decode(String),
}

impl StoreError for Error {
  fn as_core(&self) -> Option<&census_core::Error> {
    match self {
      Self::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
