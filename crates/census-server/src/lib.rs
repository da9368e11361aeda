//! Census server wiring: settings, launch arguments and application
//! bootstrap. The `census` binary is a thin shell over [`build`].

pub mod error;
pub mod launch;
pub mod settings;

pub use error::{Error, Result};
pub use settings::Settings;

use std::sync::Arc;

use axum::{Router, http::HeaderValue};
use census_api::{AppState, TokenFactory};
use census_store_sqlite::PersonAccess;
use tower_http::{
  cors::{AllowOrigin, Any, CorsLayer},
  trace::TraceLayer,
};

/// Open the database, seed it, and assemble the router with CORS and
/// request tracing.
pub async fn build(settings: &Settings) -> Result<Router> {
  let path = settings.database_path()?;
  tracing::info!(path = %path.display(), rebuild = settings.rebuild, "opening database");
  let store = PersonAccess::open(&path, settings.rebuild).await?;
  store.seed_system().await?;
  tracing::info!("database ready");

  let tokens = TokenFactory::new()?;
  let state = AppState::new(Arc::new(store), Arc::new(tokens), settings.api_options());

  Ok(
    census_api::app(state)
      .layer(cors_layer(&settings.cors_origin)?)
      .layer(TraceLayer::new_for_http()),
  )
}

/// `*` allows any origin; otherwise a comma-separated list of origins.
pub fn cors_layer(origin: &str) -> Result<CorsLayer> {
  let allow = if origin.trim() == "*" {
    AllowOrigin::any()
  } else {
    let origins = origin
      .split(',')
      .map(str::trim)
      .filter(|o| !o.is_empty())
      .map(|o| HeaderValue::from_str(o).map_err(|_| Error::CorsOrigin(o.to_string())))
      .collect::<Result<Vec<_>>>()?;
    if origins.is_empty() {
      return Err(Error::CorsOrigin(origin.to_string()));
    }
    AllowOrigin::list(origins)
  };
  Ok(
    CorsLayer::new()
      .allow_origin(allow)
      .allow_methods(Any)
      .allow_headers(Any),
  )
}
