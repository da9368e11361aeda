//! Audit fields carried by every entity.
//!
//! The stamp is applied by the data-access layer on every mutation and is
//! never removed. `active = false` marks a soft-deleted row that remains
//! available for audit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// The bootstrap "System" person. It is the acting user for every mutation
/// until real identity lookup exists.
pub const SYSTEM_ACTOR: EntityId = 1;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Audit {
  /// Soft-delete flag; `false` once the row has been deleted.
  pub active:      bool,
  pub created_by:  EntityId,
  pub created_on:  DateTime<Utc>,
  pub modified_by: EntityId,
  pub modified_on: DateTime<Utc>,
}

impl Audit {
  /// Stamp a freshly built entity. Also sets the modification pair so a new
  /// row never carries an empty `modified_on`.
  pub fn stamp_created(&mut self, actor: EntityId, at: DateTime<Utc>) {
    self.active = true;
    self.created_by = actor;
    self.created_on = at;
    self.stamp_modified(actor, at);
  }

  pub fn stamp_modified(&mut self, actor: EntityId, at: DateTime<Utc>) {
    self.modified_by = actor;
    self.modified_on = at;
  }
}
