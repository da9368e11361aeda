//! The `EntityStore` trait: generic create/read/update/soft-delete.
//!
//! Implemented by storage backends (e.g. `census-store-sqlite`). The API layer
//! depends on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  Error,
  entity::{Entity, EntityId, FieldMap},
};

/// Lets callers find the domain failure inside a backend-specific error, so
/// "not found" and "bad input" can be told apart from storage faults.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn as_core(&self) -> Option<&Error>;
}

/// Generic data access for one entity type.
///
/// All methods return `Send` futures so the trait can be used from axum
/// handlers on a multi-threaded runtime.
pub trait EntityStore<E: Entity>: Send + Sync {
  type Error: StoreError;

  /// Load one row by id, whether active or not.
  /// Fails with [`Error::NotFound`] when no row matches.
  fn get(
    &self,
    id: EntityId,
  ) -> impl Future<Output = Result<E, Self::Error>> + Send + '_;

  /// All rows in id order. Soft-deleted rows are included only when
  /// `include_inactive` is set.
  fn list(
    &self,
    include_inactive: bool,
  ) -> impl Future<Output = Result<Vec<E>, Self::Error>> + Send + '_;

  /// Build an entity from `data`, stamp it as created by `actor`, persist it
  /// and return the stored row.
  fn create(
    &self,
    actor: EntityId,
    data: FieldMap,
  ) -> impl Future<Output = Result<E, Self::Error>> + Send + '_;

  /// Apply `data` to row `id`, re-stamp the modification fields and persist.
  fn update(
    &self,
    actor: EntityId,
    id: EntityId,
    data: FieldMap,
  ) -> impl Future<Output = Result<E, Self::Error>> + Send + '_;

  /// Soft-delete row `id` by clearing its `active` flag.
  ///
  /// `persistent = false` (physical removal) is declared but not
  /// implemented and fails with [`Error::Unsupported`].
  fn delete(
    &self,
    actor: EntityId,
    id: EntityId,
    persistent: bool,
  ) -> impl Future<Output = Result<E, Self::Error>> + Send + '_;
}
