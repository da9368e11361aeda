//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  body::{Body, to_bytes},
  http::{Request, StatusCode, header},
  response::Response,
};
use census_store_sqlite::PersonAccess;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::{ApiOptions, AppState, TokenFactory, app};

async fn make_state(options: ApiOptions) -> AppState<PersonAccess> {
  let store = PersonAccess::open_in_memory().await.unwrap();
  store.seed_system().await.unwrap();
  AppState::new(
    Arc::new(store),
    Arc::new(TokenFactory::new().unwrap()),
    options,
  )
}

async fn call(
  state: &AppState<PersonAccess>,
  method: &str,
  uri: &str,
  token: Option<&str>,
  headers: Vec<(&str, &str)>,
  body: Option<Value>,
) -> Response {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(token) = token {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
  }
  for (k, v) in headers {
    builder = builder.header(k, v);
  }
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  app(state.clone()).oneshot(builder.body(body).unwrap()).await.unwrap()
}

async fn json_body(resp: Response) -> Value {
  let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

async fn token(state: &AppState<PersonAccess>) -> String {
  let resp = call(state, "GET", "/api/token", None, vec![], None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  json_body(resp).await["token"].as_str().unwrap().to_string()
}

async fn create_ann(state: &AppState<PersonAccess>, token: &str) -> i64 {
  let resp = call(
    state,
    "POST",
    "/api/person",
    Some(token),
    vec![],
    Some(json!({ "first_name": "Ann", "last_name": "Lee" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  json_body(resp).await["id"].as_i64().unwrap()
}

// ─── Status / token ───────────────────────────────────────────────────────────

#[tokio::test]
async fn status_is_online_without_auth() {
  let state = make_state(ApiOptions::default()).await;
  let resp = call(&state, "GET", "/api/status", None, vec![], None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await, json!({ "message": "Online" }));
}

#[tokio::test]
async fn status_ignores_a_bad_token() {
  let state = make_state(ApiOptions::default()).await;
  let resp =
    call(&state, "GET", "/api/status", Some("junk"), vec![], None).await;
  assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn issued_token_is_recorded() {
  let state = make_state(ApiOptions::default()).await;
  let token = token(&state).await;
  assert!(state.tokens.validate(&token).is_ok());
  assert_eq!(state.tokens.issued_count(), 1);
}

// ─── Auth ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn token_then_create_then_unauthenticated_fetch() {
  let state = make_state(ApiOptions::default()).await;
  let token = token(&state).await;

  let resp = call(
    &state,
    "POST",
    "/api/person",
    Some(token.as_str()),
    vec![],
    Some(json!({ "first_name": "Ann", "last_name": "Lee" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body = json_body(resp).await;
  assert_eq!(body["first_name"], "Ann");
  assert_eq!(body["active"], true);
  let id = body["id"].as_i64().unwrap();

  let resp =
    call(&state, "GET", &format!("/api/person/{id}"), None, vec![], None).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  assert!(bytes.is_empty());
}

#[tokio::test]
async fn unknown_token_is_unauthorized_everywhere() {
  let state = make_state(ApiOptions::default()).await;
  let other = TokenFactory::new().unwrap().make_token().unwrap();

  for (method, uri) in [
    ("GET", "/api/person"),
    ("GET", "/api/person/1"),
    ("DELETE", "/api/person/1"),
  ] {
    let resp = call(&state, method, uri, Some(other.as_str()), vec![], None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
  }
}

#[tokio::test]
async fn raw_token_without_bearer_prefix_is_accepted() {
  let state = make_state(ApiOptions::default()).await;
  let token = token(&state).await;
  let resp = call(
    &state,
    "GET",
    "/api/person/1",
    None,
    vec![("authorization", token.as_str())],
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await["first_name"], "System");
}

// ─── Person CRUD ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_person_is_404_with_fixed_message() {
  let state = make_state(ApiOptions::default()).await;
  let token = token(&state).await;
  let resp =
    call(&state, "GET", "/api/person/999", Some(token.as_str()), vec![], None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  assert_eq!(
    json_body(resp).await,
    json!({ "message": "A database result was not found" })
  );
}

#[tokio::test]
async fn create_without_required_field_is_400() {
  let state = make_state(ApiOptions::default()).await;
  let token = token(&state).await;
  let resp = call(
    &state,
    "POST",
    "/api/person",
    Some(token.as_str()),
    vec![],
    Some(json!({ "first_name": "Ann" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let msg = json_body(resp).await["message"].as_str().unwrap().to_string();
  assert!(msg.contains("last_name"), "{msg}");
}

#[tokio::test]
async fn update_is_204_and_changes_the_row() {
  let state = make_state(ApiOptions::default()).await;
  let token = token(&state).await;
  let id = create_ann(&state, &token).await;

  let resp = call(
    &state,
    "PUT",
    &format!("/api/person/{id}"),
    Some(token.as_str()),
    vec![],
    Some(json!({ "middle_name": "Q" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);

  let resp =
    call(&state, "GET", &format!("/api/person/{id}"), Some(token.as_str()), vec![], None)
      .await;
  let body = json_body(resp).await;
  assert_eq!(body["middle_name"], "Q");
  assert_eq!(body["first_name"], "Ann");
}

#[tokio::test]
async fn update_of_missing_person_is_404() {
  let state = make_state(ApiOptions::default()).await;
  let token = token(&state).await;
  let resp = call(
    &state,
    "PUT",
    "/api/person/999",
    Some(token.as_str()),
    vec![],
    Some(json!({ "first_name": "Zed" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_hides_row_from_default_listing() {
  let state = make_state(ApiOptions::default()).await;
  let token = token(&state).await;
  let id = create_ann(&state, &token).await;

  let resp =
    call(&state, "DELETE", &format!("/api/person/{id}"), Some(token.as_str()), vec![], None)
      .await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);

  let resp = call(&state, "GET", "/api/person", Some(token.as_str()), vec![], None).await;
  let listed = json_body(resp).await;
  let ids: Vec<i64> = listed
    .as_array()
    .unwrap()
    .iter()
    .map(|p| p["id"].as_i64().unwrap())
    .collect();
  assert_eq!(ids, vec![1]);

  let resp = call(
    &state,
    "GET",
    "/api/person?include_inactive=true",
    Some(token.as_str()),
    vec![],
    None,
  )
  .await;
  assert_eq!(json_body(resp).await.as_array().unwrap().len(), 2);

  let resp =
    call(&state, "GET", &format!("/api/person/{id}"), Some(token.as_str()), vec![], None)
      .await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await["active"], false);
}

#[tokio::test]
async fn non_persistent_delete_is_501() {
  let state = make_state(ApiOptions::default()).await;
  let token = token(&state).await;
  let id = create_ann(&state, &token).await;
  let resp = call(
    &state,
    "DELETE",
    &format!("/api/person/{id}?persistent=false"),
    Some(token.as_str()),
    vec![],
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn field_mask_limits_response_keys() {
  let state = make_state(ApiOptions::default()).await;
  let token = token(&state).await;
  let resp = call(
    &state,
    "GET",
    "/api/person/1",
    Some(token.as_str()),
    vec![("x-fields", "{id,last_name}")],
    None,
  )
  .await;
  assert_eq!(json_body(resp).await, json!({ "id": 1, "last_name": "System" }));
}

#[tokio::test]
async fn strict_mode_rejects_unknown_keys() {
  let payload = json!({ "first_name": "Ann", "last_name": "Lee", "nick": "A" });

  let lax = make_state(ApiOptions::default()).await;
  let token = token(&lax).await;
  let resp =
    call(&lax, "POST", "/api/person", Some(token.as_str()), vec![], Some(payload.clone()))
      .await;
  assert_eq!(resp.status(), StatusCode::CREATED);

  let strict =
    make_state(ApiOptions { validate: true, ..ApiOptions::default() }).await;
  let token = self::token(&strict).await;
  let resp =
    call(&strict, "POST", "/api/person", Some(token.as_str()), vec![], Some(payload))
      .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ─── Routing ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_route_is_json_404() {
  let state = make_state(ApiOptions::default()).await;
  let resp = call(&state, "GET", "/api/nope", None, vec![], None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  let msg = json_body(resp).await["message"].as_str().unwrap().to_string();
  assert!(!msg.contains("did you mean"));
}

#[tokio::test]
async fn unknown_route_lists_endpoints_when_help_is_on() {
  let state =
    make_state(ApiOptions { error_404_help: true, ..ApiOptions::default() })
      .await;
  let resp = call(&state, "GET", "/nope", None, vec![], None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  let msg = json_body(resp).await["message"].as_str().unwrap().to_string();
  assert!(msg.contains("/api/person/{id}"), "{msg}");
}

#[tokio::test]
async fn swagger_document_follows_setting() {
  let on = make_state(ApiOptions::default()).await;
  let resp = call(&on, "GET", "/api/swagger.json", None, vec![], None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let doc = json_body(resp).await;
  assert!(doc["openapi"].as_str().unwrap().starts_with("3."));
  assert_eq!(doc["x-doc-expansion"], "none");
  assert!(doc["paths"]["/person/{id}"]["delete"].is_object());

  let off =
    make_state(ApiOptions { swagger: false, ..ApiOptions::default() }).await;
  let resp = call(&off, "GET", "/api/swagger.json", None, vec![], None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_prefix_mounts_at_root() {
  let state =
    make_state(ApiOptions { url_prefix: "/".into(), ..ApiOptions::default() })
      .await;
  let resp = call(&state, "GET", "/status", None, vec![], None).await;
  assert_eq!(resp.status(), StatusCode::OK);
}
