//! JSON REST API for Census.
//!
//! Exposes an axum [`Router`] backed by any
//! [`census_core::store::EntityStore`] for [`Person`]. Transport concerns
//! (CORS, request tracing, the listener) are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = census_api::app(AppState::new(store, tokens, options));
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod docs;
pub mod error;
pub mod mask;
pub mod person;
pub mod status;
pub mod token;

use std::sync::Arc;

use axum::{
  Json, Router,
  extract::State,
  http::{StatusCode, Uri},
  response::{IntoResponse, Response},
  routing::get,
};
use census_core::{person::Person, store::EntityStore};
use serde_json::json;

pub use auth::{Authenticated, TokenFactory};
pub use error::ApiError;

/// Behaviour switches taken from the server settings.
#[derive(Debug, Clone)]
pub struct ApiOptions {
  pub title:                 String,
  pub url_prefix:            String,
  /// Expose error text in 500 responses.
  pub debug:                 bool,
  /// Reject payload keys that are not declared fields.
  pub validate:              bool,
  /// List the available endpoints in route-not-found responses.
  pub error_404_help:        bool,
  pub swagger:               bool,
  pub swagger_doc_expansion: String,
  /// Document the `X-Fields` header on person operations.
  pub mask_swagger:          bool,
}

impl Default for ApiOptions {
  fn default() -> Self {
    Self {
      title:                 "Census API".to_string(),
      url_prefix:            "/api".to_string(),
      debug:                 false,
      validate:              false,
      error_404_help:        false,
      swagger:               true,
      swagger_doc_expansion: "none".to_string(),
      mask_swagger:          false,
    }
  }
}

impl ApiOptions {
  /// The URL prefix normalised to `/segment` form, or `""` for the root.
  pub fn prefix(&self) -> String {
    let trimmed = self.url_prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
      String::new()
    } else {
      format!("/{trimmed}")
    }
  }

  /// Paths served by [`routes`], prefixed, for 404 help and the API document.
  pub fn endpoints(&self) -> Vec<String> {
    let prefix = self.prefix();
    let mut paths = vec!["/status", "/token", "/person", "/person/{id}"];
    if self.swagger {
      paths.push("/swagger.json");
    }
    paths.into_iter().map(|p| format!("{prefix}{p}")).collect()
  }
}

/// Shared state handed to every handler.
pub struct AppState<S> {
  pub store:   Arc<S>,
  pub tokens:  Arc<TokenFactory>,
  pub options: Arc<ApiOptions>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      tokens:  Arc::clone(&self.tokens),
      options: Arc::clone(&self.options),
    }
  }
}

impl<S> AppState<S> {
  pub fn new(store: Arc<S>, tokens: Arc<TokenFactory>, options: ApiOptions) -> Self {
    Self { store, tokens, options: Arc::new(options) }
  }
}

impl<S: EntityStore<Person>> AppState<S> {
  pub(crate) fn store_error(&self, e: S::Error) -> ApiError {
    ApiError::from_store(e, self.options.debug)
  }
}

/// The API routes, unprefixed and still awaiting their state.
pub fn routes<S>(options: &ApiOptions) -> Router<AppState<S>>
where
  S: EntityStore<Person> + 'static,
{
  let router = Router::new()
    .route("/status", get(status::get))
    .route("/token", get(token::issue::<S>))
    .route("/person", get(person::list::<S>).post(person::create::<S>))
    .route(
      "/person/{id}",
      get(person::get_one::<S>)
        .put(person::update::<S>)
        .delete(person::delete::<S>),
    );

  if options.swagger {
    router.route("/swagger.json", get(docs::swagger::<S>))
  } else {
    router
  }
}

/// Build the full application: routes mounted under the configured prefix
/// with a JSON fallback for unknown paths.
pub fn app<S>(state: AppState<S>) -> Router<()>
where
  S: EntityStore<Person> + 'static,
{
  let prefix = state.options.prefix();
  let routes = routes::<S>(&state.options);
  let router = if prefix.is_empty() {
    Router::new().merge(routes)
  } else {
    Router::new().nest(&prefix, routes)
  };
  router.fallback(route_not_found::<S>).with_state(state)
}

async fn route_not_found<S>(State(state): State<AppState<S>>, uri: Uri) -> Response
where
  S: Send + Sync,
{
  let mut message =
    "The requested URL was not found on the server.".to_string();
  if state.options.error_404_help {
    message.push_str(&format!(
      " You have requested this URI [{}] but did you mean one of: {}?",
      uri.path(),
      state.options.endpoints().join(", "),
    ));
  }
  tracing::debug!(path = %uri.path(), "no route");
  (StatusCode::NOT_FOUND, Json(json!({ "message": message }))).into_response()
}

#[cfg(test)]
mod tests;
