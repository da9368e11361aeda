//! The [`Entity`] trait and the loosely-typed values that flow through it.
//!
//! An entity declares its table and its caller-writable fields. The identity
//! column (`id`) and the [`Audit`] columns are common to every entity and are
//! never part of [`Entity::FIELDS`], so input can never overwrite them.

use std::fmt::Debug;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::{Error, Result, audit::Audit};

/// Primary key type shared by every table.
pub type EntityId = i64;

/// A loosely-typed field mapping, as decoded from a JSON request body.
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

// ─── Field declarations ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
  Text,
  Integer,
  Bool,
  DateTime,
  Date,
}

impl FieldKind {
  pub fn describe(self) -> &'static str {
    match self {
      Self::Text => "a string",
      Self::Integer => "an integer",
      Self::Bool => "a boolean",
      Self::DateTime => "a date-time string",
      Self::Date => "a date string",
    }
  }
}

/// Declaration of one writable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
  pub name:     &'static str,
  pub kind:     FieldKind,
  pub nullable: bool,
  /// Maximum length in characters, for text fields.
  pub max_len:  Option<usize>,
}

impl Field {
  pub const fn new(name: &'static str, kind: FieldKind) -> Self {
    Self { name, kind, nullable: false, max_len: None }
  }

  pub const fn text(name: &'static str, max_len: usize) -> Self {
    Self { name, kind: FieldKind::Text, nullable: false, max_len: Some(max_len) }
  }

  pub const fn nullable(self) -> Self { Self { nullable: true, ..self } }
}

// ─── Values ──────────────────────────────────────────────────────────────────

/// A single column value, independent of any storage engine.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
  Null,
  Text(String),
  Integer(i64),
  Bool(bool),
  DateTime(DateTime<Utc>),
  Date(NaiveDate),
}

impl FieldValue {
  pub fn is_null(&self) -> bool { matches!(self, Self::Null) }

  /// Unwrap a required text value for `field`.
  pub fn into_text(self, field: &str) -> Result<String> {
    match self {
      Self::Text(s) => Ok(s),
      Self::Null => Err(Error::invalid(field, "may not be null")),
      _ => Err(Error::invalid(field, "expected a string")),
    }
  }

  /// Unwrap an optional text value for `field`.
  pub fn into_opt_text(self, field: &str) -> Result<Option<String>> {
    match self {
      Self::Null => Ok(None),
      other => other.into_text(field).map(Some),
    }
  }
}

impl From<Option<String>> for FieldValue {
  fn from(value: Option<String>) -> Self {
    value.map_or(Self::Null, Self::Text)
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// A persisted record with an integer identity and audit fields.
///
/// `Default` must produce a blank, unsaved entity (`id() == None`).
pub trait Entity:
  Debug + Clone + Default + Serialize + Send + Sync + 'static
{
  /// Table name; also used in not-found messages.
  const TABLE: &'static str;

  /// Writable fields, in column order.
  const FIELDS: &'static [Field];

  fn id(&self) -> Option<EntityId>;

  /// Assigned once by storage. Never called with a different id for a row
  /// that already has one.
  fn set_id(&mut self, id: EntityId);

  fn audit(&self) -> &Audit;

  fn audit_mut(&mut self) -> &mut Audit;

  /// Current value of a declared field. Unknown names yield `None`.
  fn field(&self, name: &str) -> Option<FieldValue>;

  /// Set a declared field from an already-coerced value.
  fn set_field(&mut self, name: &str, value: FieldValue) -> Result<()>;

  /// Look up the declaration for `name`.
  fn field_spec(name: &str) -> Option<&'static Field> {
    Self::FIELDS.iter().find(|f| f.name == name)
  }
}
