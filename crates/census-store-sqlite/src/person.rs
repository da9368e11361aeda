//! Person-specific data access.

use census_core::{audit::SYSTEM_ACTOR, person::Person};
use chrono::Utc;

use crate::{DatabaseAccess, Result};

/// Data access for [`Person`]; the generic CRUD operations come from
/// [`DatabaseAccess`].
pub type PersonAccess = DatabaseAccess<Person>;

impl DatabaseAccess<Person> {
  /// Insert the bootstrap "System" person under [`SYSTEM_ACTOR`] unless that
  /// row already exists. Every audit stamp in the demo points at this row.
  pub async fn seed_system(&self) -> Result<Person> {
    if let Some(existing) = self.find(SYSTEM_ACTOR).await? {
      return Ok(existing);
    }

    let mut system = Person::new("System", Some("System".to_owned()), "System");
    system.id = Some(SYSTEM_ACTOR);
    system.audit.stamp_created(SYSTEM_ACTOR, Utc::now());

    self.insert(&system).await?;
    Ok(self.find(SYSTEM_ACTOR).await?.unwrap_or(system))
  }
}
