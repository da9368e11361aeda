//! SQL generated from entity declarations.
//!
//! Every table gets an integer `id` primary key, the declared fields, and the
//! five audit columns. The actor columns reference `person(id)`; the check is
//! deferred to commit so the self-referencing System row can be inserted.

use census_core::{
  entity::{Entity, FieldKind},
  person::Person,
};

/// Connection-level settings, executed once per connection.
pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

pub const AUDIT_COLUMNS: [&str; 5] =
  ["active", "created_by", "created_on", "modified_by", "modified_on"];

fn sql_type(kind: FieldKind) -> &'static str {
  match kind {
    FieldKind::Text | FieldKind::DateTime | FieldKind::Date => "TEXT",
    FieldKind::Integer | FieldKind::Bool => "INTEGER",
  }
}

/// DDL for `E`; idempotent thanks to `IF NOT EXISTS`.
pub fn create_table<E: Entity>() -> String {
  let table = E::TABLE;
  let actors = Person::TABLE;

  let mut columns = vec!["id          INTEGER PRIMARY KEY AUTOINCREMENT".to_owned()];
  for field in E::FIELDS {
    let mut column = format!("{:<11} {}", field.name, sql_type(field.kind));
    if !field.nullable {
      column.push_str(" NOT NULL");
    }
    if let Some(max) = field.max_len {
      column.push_str(&format!(" CHECK (length({}) <= {max})", field.name));
    }
    columns.push(column);
  }
  columns.extend([
    "active      INTEGER NOT NULL".to_owned(),
    format!(
      "created_by  INTEGER NOT NULL REFERENCES {actors}(id) DEFERRABLE INITIALLY DEFERRED"
    ),
    "created_on  TEXT NOT NULL".to_owned(),
    format!(
      "modified_by INTEGER NOT NULL REFERENCES {actors}(id) DEFERRABLE INITIALLY DEFERRED"
    ),
    "modified_on TEXT NOT NULL".to_owned(),
  ]);

  format!(
    "CREATE TABLE IF NOT EXISTS {table} (\n    {}\n);\n\
     CREATE INDEX IF NOT EXISTS {table}_active_idx ON {table}(active);\n",
    columns.join(",\n    ")
  )
}

pub fn drop_table<E: Entity>() -> String {
  format!("DROP TABLE IF EXISTS {};", E::TABLE)
}

/// `id, <fields>, <audit columns>`: the order [`crate::encode::RawRow`]
/// reads.
pub fn select_columns<E: Entity>() -> String {
  std::iter::once("id")
    .chain(E::FIELDS.iter().map(|f| f.name))
    .chain(AUDIT_COLUMNS)
    .collect::<Vec<_>>()
    .join(", ")
}

/// Writable columns for INSERT/UPDATE: fields then audit columns.
pub fn write_columns<E: Entity>() -> Vec<&'static str> {
  E::FIELDS.iter().map(|f| f.name).chain(AUDIT_COLUMNS).collect()
}
