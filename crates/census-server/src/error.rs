//! Start-up failures.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("configuration: {0}")]
  Config(#[from] config::ConfigError),

  #[error("database_uri must be set outside local mode")]
  MissingDatabaseUri,

  #[error("unsupported database_uri scheme {scheme:?}; only sqlite is available")]
  UnsupportedDatabaseUri { scheme: String },

  #[error("sqlite database_uri must not name a host, e.g. sqlite:///census.db")]
  DatabaseUriHost,

  #[error("cannot prepare data folder {path:?}: {source}")]
  DataFolder {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid cors_origin {0:?}")]
  CorsOrigin(String),

  #[error("store: {0}")]
  Store(#[from] census_store_sqlite::Error),

  #[error("token factory: {0}")]
  Token(#[from] census_api::auth::TokenError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
