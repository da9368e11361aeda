//! Runtime settings: built-in defaults, then an optional TOML file, then
//! `CENSUS_*` environment variables.

use std::{
  fs::{self, OpenOptions},
  path::{Path, PathBuf},
};

use census_api::ApiOptions;
use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;

use crate::error::{Error, Result};

pub const ENV_PREFIX: &str = "CENSUS";
pub const LOCAL_DB_FILE: &str = "local.db";
const MEMORY_DB: &str = ":memory:";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  pub title:                 String,
  /// `local` or `dev` select local mode (database in `data_folder`).
  pub environment:           String,
  pub bind:                  String,
  pub port:                  u16,
  pub debug:                 bool,
  pub url_prefix:            String,
  pub cors_origin:           String,
  pub data_folder:           PathBuf,
  pub database_uri:          Option<String>,
  /// Drop and recreate the schema at start-up.
  pub rebuild:               bool,
  pub swagger:               bool,
  pub swagger_doc_expansion: String,
  pub mask_swagger:          bool,
  pub validate:              bool,
  pub error_404_help:        bool,
}

impl Settings {
  /// Load from `file` (if it exists) and the process environment.
  pub fn load(file: &Path) -> Result<Self> {
    Self::load_from(file, Environment::with_prefix(ENV_PREFIX))
  }

  /// Load from `file` and an explicit environment source.
  pub fn load_from(file: &Path, env: Environment) -> Result<Self> {
    let temp = std::env::temp_dir();
    let settings = Config::builder()
      .set_default("title", "Census API")?
      .set_default("environment", "local")?
      .set_default("bind", "127.0.0.1")?
      .set_default("port", 5000)?
      .set_default("debug", false)?
      .set_default("url_prefix", "/api")?
      .set_default("cors_origin", "*")?
      .set_default("data_folder", temp.to_string_lossy().into_owned())?
      .set_default("rebuild", true)?
      .set_default("swagger", true)?
      .set_default("swagger_doc_expansion", "none")?
      .set_default("mask_swagger", false)?
      .set_default("validate", false)?
      .set_default("error_404_help", false)?
      .add_source(File::from(file).required(false))
      .add_source(env.try_parsing(true))
      .build()?;
    Ok(settings.try_deserialize()?)
  }

  pub fn is_local(&self) -> bool {
    let env = self.environment.trim();
    env.eq_ignore_ascii_case("local") || env.eq_ignore_ascii_case("dev")
  }

  /// `host:port` to listen on.
  pub fn address(&self) -> String { format!("{}:{}", self.bind, self.port) }

  /// Default log level when `RUST_LOG` is unset.
  pub fn log_level(&self) -> LevelFilter {
    if self.debug || self.is_local() {
      LevelFilter::DEBUG
    } else {
      LevelFilter::INFO
    }
  }

  /// Where the SQLite database lives.
  ///
  /// In local mode the data folder is created and `local.db` touched inside
  /// it. Otherwise `database_uri` is used: a plain path, or a SQLAlchemy
  /// style `sqlite:///relative.db`, `sqlite:////absolute.db` or `sqlite://`
  /// (in memory). Any other scheme is rejected.
  pub fn database_path(&self) -> Result<PathBuf> {
    if self.is_local() {
      let folder = &self.data_folder;
      let prepare = || -> std::io::Result<PathBuf> {
        fs::create_dir_all(folder)?;
        let path = folder.join(LOCAL_DB_FILE);
        OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(path)
      };
      return prepare()
        .map_err(|source| Error::DataFolder { path: folder.clone(), source });
    }

    let uri = self
      .database_uri
      .as_deref()
      .map(str::trim)
      .filter(|u| !u.is_empty())
      .ok_or(Error::MissingDatabaseUri)?;
    sqlite_path(uri)
  }

  pub fn api_options(&self) -> ApiOptions {
    ApiOptions {
      title:                 self.title.clone(),
      url_prefix:            self.url_prefix.clone(),
      debug:                 self.debug,
      validate:              self.validate,
      error_404_help:        self.error_404_help,
      swagger:               self.swagger,
      swagger_doc_expansion: self.swagger_doc_expansion.clone(),
      mask_swagger:          self.mask_swagger,
    }
  }
}

fn sqlite_path(uri: &str) -> Result<PathBuf> {
  let Some((scheme, rest)) = uri.split_once("://") else {
    return Ok(PathBuf::from(uri));
  };
  let sqlite = scheme.eq_ignore_ascii_case("sqlite")
    || scheme.to_ascii_lowercase().starts_with("sqlite+");
  if !sqlite {
    return Err(Error::UnsupportedDatabaseUri { scheme: scheme.to_string() });
  }

  // `rest` is `<host>/<path>`; SQLite URIs carry no host.
  match rest.strip_prefix('/') {
    Some("") => Ok(PathBuf::from(MEMORY_DB)),
    Some(path) => Ok(PathBuf::from(path)),
    None if rest.is_empty() => Ok(PathBuf::from(MEMORY_DB)),
    None => Err(Error::DatabaseUriHost),
  }
}
