//! Encoding and decoding helpers between domain values and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, dates as `YYYY-MM-DD`, booleans
//! as integers.

use census_core::entity::{Entity, EntityId, Field, FieldKind, FieldValue};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Value as SqlValue;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── FieldValue ──────────────────────────────────────────────────────────────

pub fn encode_value(v: &FieldValue) -> SqlValue {
  match v {
    FieldValue::Null => SqlValue::Null,
    FieldValue::Text(s) => SqlValue::Text(s.clone()),
    FieldValue::Integer(n) => SqlValue::Integer(*n),
    FieldValue::Bool(b) => SqlValue::Integer(i64::from(*b)),
    FieldValue::DateTime(dt) => SqlValue::Text(encode_dt(*dt)),
    FieldValue::Date(d) => SqlValue::Text(encode_date(*d)),
  }
}

pub fn decode_value(field: &Field, v: SqlValue) -> Result<FieldValue> {
  match (field.kind, v) {
    (_, SqlValue::Null) => Ok(FieldValue::Null),
    (FieldKind::Text, SqlValue::Text(s)) => Ok(FieldValue::Text(s)),
    (FieldKind::Integer, SqlValue::Integer(n)) => Ok(FieldValue::Integer(n)),
    (FieldKind::Bool, SqlValue::Integer(n)) => Ok(FieldValue::Bool(n != 0)),
    (FieldKind::DateTime, SqlValue::Text(s)) => decode_dt(&s).map(FieldValue::DateTime),
    (FieldKind::Date, SqlValue::Text(s)) => decode_date(&s).map(FieldValue::Date),
    (kind, other) => Err(Error::Decode(format!(
      "column {:?} holds {other:?}, expected {}",
      field.name,
      kind.describe()
    ))),
  }
}

/// Declared fields of `entity` in column order, encoded for binding.
pub fn encode_fields<E: Entity>(entity: &E) -> Vec<SqlValue> {
  E::FIELDS
    .iter()
    .map(|f| entity.field(f.name).unwrap_or(FieldValue::Null))
    .map(|v| encode_value(&v))
    .collect()
}

// ─── Row type ────────────────────────────────────────────────────────────────

/// Raw values read directly from an entity row, in the column order produced
/// by [`crate::schema::select_columns`].
pub struct RawRow {
  pub id:          EntityId,
  pub fields:      Vec<SqlValue>,
  pub active:      bool,
  pub created_by:  EntityId,
  pub created_on:  String,
  pub modified_by: EntityId,
  pub modified_on: String,
}

impl RawRow {
  pub fn read(row: &rusqlite::Row<'_>, field_count: usize) -> rusqlite::Result<Self> {
    let fields = (1..=field_count)
      .map(|i| row.get::<_, SqlValue>(i))
      .collect::<rusqlite::Result<Vec<_>>>()?;
    let audit_at = field_count + 1;
    Ok(Self {
      id: row.get(0)?,
      fields,
      active:      row.get(audit_at)?,
      created_by:  row.get(audit_at + 1)?,
      created_on:  row.get(audit_at + 2)?,
      modified_by: row.get(audit_at + 3)?,
      modified_on: row.get(audit_at + 4)?,
    })
  }

  pub fn into_entity<E: Entity>(self) -> Result<E> {
    let mut entity = E::default();
    entity.set_id(self.id);

    for (field, raw) in E::FIELDS.iter().zip(self.fields) {
      let value = decode_value(field, raw)?;
      entity.set_field(field.name, value)?;
    }

    let audit = entity.audit_mut();
    audit.active = self.active;
    audit.created_by = self.created_by;
    audit.created_on = decode_dt(&self.created_on)?;
    audit.modified_by = self.modified_by;
    audit.modified_on = decode_dt(&self.modified_on)?;

    Ok(entity)
  }
}
