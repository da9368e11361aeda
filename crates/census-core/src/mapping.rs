//! Mapping from a loosely-typed [`FieldMap`] onto an [`Entity`].
//!
//! Scalars are set directly. Date and date-time fields arrive as strings and
//! are parsed here; RFC 3339, naive `YYYY-MM-DD HH:MM:SS` (taken as UTC) and
//! bare dates are accepted. Keys that are not declared fields are ignored by
//! [`apply_fields`]; strict callers run [`validate_payload`] first.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::{
  Error, Result,
  entity::{Entity, Field, FieldKind, FieldMap, FieldValue},
};

const NAIVE_DATETIME_FORMATS: &[&str] =
  &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Apply every declared field present in `data` to `entity`.
///
/// Absent keys leave the current value untouched, so the same function serves
/// create (blank entity) and update (loaded entity).
pub fn apply_fields<E: Entity>(entity: &mut E, data: &FieldMap) -> Result<()> {
  for field in E::FIELDS {
    let Some(raw) = data.get(field.name) else { continue };
    let value = coerce(field, raw)?;
    entity.set_field(field.name, value)?;
  }
  Ok(())
}

/// Every non-nullable field must be present and non-null in `data`.
pub fn check_required<E: Entity>(data: &FieldMap) -> Result<()> {
  for field in E::FIELDS.iter().filter(|f| !f.nullable) {
    match data.get(field.name) {
      None | Some(Value::Null) => return Err(Error::MissingField(field.name)),
      Some(_) => {}
    }
  }
  Ok(())
}

/// Reject keys that are not writable fields of `E`, including `id` and the
/// audit columns.
pub fn validate_payload<E: Entity>(data: &FieldMap) -> Result<()> {
  match data.keys().find(|k| E::field_spec(k).is_none()) {
    Some(unknown) => Err(Error::UnknownField(unknown.clone())),
    None => Ok(()),
  }
}

/// Convert one JSON value to the declared kind of `field`.
pub fn coerce(field: &Field, raw: &Value) -> Result<FieldValue> {
  if raw.is_null() {
    return if field.nullable {
      Ok(FieldValue::Null)
    } else {
      Err(Error::invalid(field.name, "may not be null"))
    };
  }

  let value = match (field.kind, raw) {
    (FieldKind::Text, Value::String(s)) => {
      if let Some(max) = field.max_len
        && s.chars().count() > max
      {
        return Err(Error::invalid(
          field.name,
          format!("longer than {max} characters"),
        ));
      }
      FieldValue::Text(s.clone())
    }
    (FieldKind::Integer, Value::Number(n)) => n
      .as_i64()
      .map(FieldValue::Integer)
      .ok_or_else(|| Error::invalid(field.name, "expected an integer"))?,
    (FieldKind::Bool, Value::Bool(b)) => FieldValue::Bool(*b),
    (FieldKind::DateTime, Value::String(s)) => parse_datetime(s)
      .map(FieldValue::DateTime)
      .ok_or_else(|| Error::invalid(field.name, format!("cannot parse {s:?}")))?,
    (FieldKind::Date, Value::String(s)) => parse_date(s)
      .map(FieldValue::Date)
      .ok_or_else(|| Error::invalid(field.name, format!("cannot parse {s:?}")))?,
    (kind, other) => {
      return Err(Error::invalid(
        field.name,
        format!("expected {}, got {}", kind.describe(), json_type(other)),
      ));
    }
  };

  Ok(value)
}

pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
  let s = s.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  for fmt in NAIVE_DATETIME_FORMATS {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
      return Some(naive.and_utc());
    }
  }
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|naive| naive.and_utc())
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
  NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
    .ok()
    .or_else(|| parse_datetime(s).map(|dt| dt.date_naive()))
}

fn json_type(v: &Value) -> &'static str {
  match v {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}
