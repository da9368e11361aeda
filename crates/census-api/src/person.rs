//! Handlers for `/person` endpoints. All require a bearer token.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/person` | Optional `?include_inactive=true` |
//! | `POST`   | `/person` | Body: field mapping; 201 with the stored row |
//! | `GET`    | `/person/{id}` | Inactive rows are returned too |
//! | `PUT`    | `/person/{id}` | Body: partial field mapping; 204 |
//! | `DELETE` | `/person/{id}` | Soft delete; `?persistent=false` is 501 |
//!
//! Read responses honour the `X-Fields` mask (see [`crate::mask`]).

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode},
  response::{IntoResponse, Response},
};
use census_core::{
  entity::{EntityId, FieldMap},
  mapping::validate_payload,
  person::Person,
  store::EntityStore,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{AppState, auth::Authenticated, error::ApiError, mask};

fn masked<T: serde::Serialize>(
  headers: &HeaderMap,
  body: &T,
) -> Result<Json<Value>, ApiError> {
  Ok(Json(mask::apply(headers, serde_json::to_value(body)?)))
}

fn check_payload(strict: bool, data: &FieldMap) -> Result<(), ApiError> {
  if strict {
    validate_payload::<Person>(data)
      .map_err(|e| ApiError::BadRequest(e.to_string()))?;
  }
  Ok(())
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub include_inactive: bool,
}

/// `GET /person[?include_inactive=true]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Query(params): Query<ListParams>,
  headers: HeaderMap,
) -> Result<Json<Value>, ApiError>
where
  S: EntityStore<Person>,
{
  let people = state
    .store
    .list(params.include_inactive)
    .await
    .map_err(|e| state.store_error(e))?;
  masked(&headers, &people)
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /person`: body `{"first_name":"Ann","last_name":"Lee"}`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  headers: HeaderMap,
  Json(data): Json<FieldMap>,
) -> Result<Response, ApiError>
where
  S: EntityStore<Person>,
{
  check_payload(state.options.validate, &data)?;
  let person = state
    .store
    .create(auth.actor(), data)
    .await
    .map_err(|e| state.store_error(e))?;
  tracing::info!(id = ?person.id, "person created");
  Ok((StatusCode::CREATED, masked(&headers, &person)?).into_response())
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /person/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(id): Path<EntityId>,
  headers: HeaderMap,
) -> Result<Json<Value>, ApiError>
where
  S: EntityStore<Person>,
{
  let person = state.store.get(id).await.map_err(|e| state.store_error(e))?;
  masked(&headers, &person)
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /person/{id}`: absent keys keep their current value.
pub async fn update<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<EntityId>,
  Json(data): Json<FieldMap>,
) -> Result<StatusCode, ApiError>
where
  S: EntityStore<Person>,
{
  check_payload(state.options.validate, &data)?;
  state
    .store
    .update(auth.actor(), id, data)
    .await
    .map_err(|e| state.store_error(e))?;
  tracing::info!(id, "person updated");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Delete ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
  #[serde(default = "persistent_default")]
  pub persistent: bool,
}

fn persistent_default() -> bool { true }

/// `DELETE /person/{id}[?persistent=false]`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<EntityId>,
  Query(params): Query<DeleteParams>,
) -> Result<StatusCode, ApiError>
where
  S: EntityStore<Person>,
{
  state
    .store
    .delete(auth.actor(), id, params.persistent)
    .await
    .map_err(|e| state.store_error(e))?;
  tracing::info!(id, "person deactivated");
  Ok(StatusCode::NO_CONTENT)
}
