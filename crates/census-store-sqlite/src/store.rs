//! [`DatabaseAccess`]: the SQLite implementation of [`EntityStore`].

use std::{marker::PhantomData, path::Path};

use census_core::{
  entity::{Entity, EntityId, FieldMap},
  mapping::{apply_fields, check_required},
  store::EntityStore,
};
use chrono::Utc;
use rusqlite::{OptionalExtension as _, types::Value as SqlValue};

use crate::{
  Error, Result,
  encode::{RawRow, encode_dt, encode_fields},
  schema::{PRAGMAS, create_table, drop_table, select_columns, write_columns},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Generic data access for entity type `E`, backed by a single SQLite file.
///
/// The inner connection is reference-counted, so clones share it.
pub struct DatabaseAccess<E> {
  conn:    tokio_rusqlite::Connection,
  _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for DatabaseAccess<E> {
  fn clone(&self) -> Self {
    Self { conn: self.conn.clone(), _entity: PhantomData }
  }
}

impl<E: Entity> DatabaseAccess<E> {
  /// Open (or create) a store at `path`. With `rebuild`, the table is dropped
  /// and recreated from the entity declaration, erasing all rows.
  pub async fn open(path: impl AsRef<Path>, rebuild: bool) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::with_connection(conn, rebuild).await
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::with_connection(conn, false).await
  }

  /// Use an existing connection, e.g. to keep several entity tables in one
  /// database file.
  pub async fn with_connection(
    conn: tokio_rusqlite::Connection,
    rebuild: bool,
  ) -> Result<Self> {
    let store = Self { conn, _entity: PhantomData };
    store.init_schema(rebuild).await?;
    Ok(store)
  }

  async fn init_schema(&self, rebuild: bool) -> Result<()> {
    let mut batch = String::from(PRAGMAS);
    if rebuild {
      batch.push_str(&drop_table::<E>());
    }
    batch.push_str(&create_table::<E>());

    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&batch)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Load row `id`, or `None` if absent.
  pub(crate) async fn find(&self, id: EntityId) -> Result<Option<E>> {
    let sql = format!(
      "SELECT {} FROM {} WHERE id = ?1",
      select_columns::<E>(),
      E::TABLE
    );
    let field_count = E::FIELDS.len();

    let raw: Option<RawRow> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(&sql, rusqlite::params![id], |row| RawRow::read(row, field_count))
          .optional()?)
      })
      .await?;

    raw.map(RawRow::into_entity).transpose()
  }

  /// Insert `entity` and return its id. An entity that already carries an id
  /// is inserted under that id.
  pub(crate) async fn insert(&self, entity: &E) -> Result<EntityId> {
    let mut columns = write_columns::<E>();
    let mut values = self.row_values(entity);
    if let Some(id) = entity.id() {
      columns.insert(0, "id");
      values.insert(0, SqlValue::Integer(id));
    }

    let placeholders = (1..=columns.len())
      .map(|i| format!("?{i}"))
      .collect::<Vec<_>>()
      .join(", ");
    let sql = format!(
      "INSERT INTO {} ({}) VALUES ({placeholders})",
      E::TABLE,
      columns.join(", ")
    );

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(id)
  }

  /// Write every column of an already-stored entity back to its row.
  async fn save(&self, id: EntityId, entity: &E) -> Result<()> {
    let columns = write_columns::<E>();
    let assignments = columns
      .iter()
      .enumerate()
      .map(|(i, c)| format!("{c} = ?{}", i + 1))
      .collect::<Vec<_>>()
      .join(", ");
    let sql = format!(
      "UPDATE {} SET {assignments} WHERE id = ?{}",
      E::TABLE,
      columns.len() + 1
    );

    let mut values = self.row_values(entity);
    values.push(SqlValue::Integer(id));

    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params_from_iter(values))?))
      .await?;

    if changed == 0 {
      return Err(not_found::<E>(id));
    }
    Ok(())
  }

  fn row_values(&self, entity: &E) -> Vec<SqlValue> {
    let audit = entity.audit();
    let mut values = encode_fields(entity);
    values.extend([
      SqlValue::Integer(i64::from(audit.active)),
      SqlValue::Integer(audit.created_by),
      SqlValue::Text(encode_dt(audit.created_on)),
      SqlValue::Integer(audit.modified_by),
      SqlValue::Text(encode_dt(audit.modified_on)),
    ]);
    values
  }
}

fn not_found<E: Entity>(id: EntityId) -> Error {
  Error::Core(census_core::Error::NotFound { table: E::TABLE, id })
}

// ─── EntityStore impl ────────────────────────────────────────────────────────

impl<E: Entity> EntityStore<E> for DatabaseAccess<E> {
  type Error = Error;

  async fn get(&self, id: EntityId) -> Result<E> {
    self.find(id).await?.ok_or_else(|| not_found::<E>(id))
  }

  async fn list(&self, include_inactive: bool) -> Result<Vec<E>> {
    let filter = if include_inactive { "" } else { " WHERE active = 1" };
    let sql = format!(
      "SELECT {} FROM {}{filter} ORDER BY id",
      select_columns::<E>(),
      E::TABLE
    );
    let field_count = E::FIELDS.len();

    let raws: Vec<RawRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], |row| RawRow::read(row, field_count))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRow::into_entity).collect()
  }

  async fn create(&self, actor: EntityId, data: FieldMap) -> Result<E> {
    check_required::<E>(&data)?;

    let mut entity = E::default();
    apply_fields(&mut entity, &data)?;
    entity.audit_mut().stamp_created(actor, Utc::now());

    let id = self.insert(&entity).await?;
    self.get(id).await
  }

  async fn update(&self, actor: EntityId, id: EntityId, data: FieldMap) -> Result<E> {
    let mut entity = self.get(id).await?;
    apply_fields(&mut entity, &data)?;
    entity.audit_mut().stamp_modified(actor, Utc::now());

    self.save(id, &entity).await?;
    self.get(id).await
  }

  async fn delete(&self, actor: EntityId, id: EntityId, persistent: bool) -> Result<E> {
    if !persistent {
      return Err(census_core::Error::Unsupported("non-persistent delete").into());
    }

    let mut entity = self.get(id).await?;
    let audit = entity.audit_mut();
    audit.stamp_modified(actor, Utc::now());
    audit.active = false;

    self.save(id, &entity).await?;
    Ok(entity)
  }
}
