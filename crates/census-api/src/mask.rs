//! `X-Fields` response masks.
//!
//! A client may send `X-Fields: first_name,last_name` (or the braced form
//! `{first_name,last_name}`) to receive only those keys of each object.

use axum::http::HeaderMap;
use serde_json::Value;

pub const HEADER: &str = "x-fields";

/// Parse the mask header. `None` means no mask was requested.
pub fn requested(headers: &HeaderMap) -> Option<Vec<String>> {
  let raw = headers.get(HEADER)?.to_str().ok()?.trim();
  let inner = raw
    .strip_prefix('{')
    .and_then(|s| s.strip_suffix('}'))
    .unwrap_or(raw);
  let fields: Vec<String> = inner
    .split(',')
    .map(str::trim)
    .filter(|f| !f.is_empty())
    .map(str::to_string)
    .collect();
  (!fields.is_empty()).then_some(fields)
}

/// Apply the mask in `headers` to an object or an array of objects.
pub fn apply(headers: &HeaderMap, value: Value) -> Value {
  match requested(headers) {
    Some(fields) => project(value, &fields),
    None => value,
  }
}

fn project(value: Value, fields: &[String]) -> Value {
  match value {
    Value::Object(mut map) => {
      let kept = fields
        .iter()
        .map(|f| (f.clone(), map.remove(f).unwrap_or(Value::Null)))
        .collect();
      Value::Object(kept)
    }
    Value::Array(items) => {
      Value::Array(items.into_iter().map(|v| project(v, fields)).collect())
    }
    other => other,
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;
  use serde_json::json;

  use super::*;

  fn with_mask(mask: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(HEADER, HeaderValue::from_static(mask));
    headers
  }

  #[test]
  fn no_header_leaves_value_alone() {
    let v = json!({"id": 1, "first_name": "Ann"});
    assert_eq!(apply(&HeaderMap::new(), v.clone()), v);
  }

  #[test]
  fn braced_and_bare_forms_agree() {
    assert_eq!(
      requested(&with_mask("{id, first_name}")),
      requested(&with_mask("id,first_name")),
    );
    assert_eq!(requested(&with_mask("{}")), None);
  }

  #[test]
  fn arrays_are_masked_per_item_and_unknown_keys_become_null() {
    let v = json!([
      {"id": 1, "first_name": "Ann", "last_name": "Lee"},
      {"id": 2, "first_name": "Bo", "last_name": "Ng"},
    ]);
    let masked = apply(&with_mask("first_name,nickname"), v);
    assert_eq!(
      masked,
      json!([
        {"first_name": "Ann", "nickname": null},
        {"first_name": "Bo", "nickname": null},
      ])
    );
  }
}
