//! `GET /token`: hand out a demo bearer token, no authentication.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct TokenBody {
  pub token: String,
}

pub async fn issue<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<TokenBody>, ApiError>
where
  S: Send + Sync,
{
  let token = state
    .tokens
    .make_token()
    .map_err(|e| ApiError::internal(e, state.options.debug))?;
  tracing::info!("issued demo token");
  Ok(Json(TokenBody { token }))
}
