//! Person, the one resource exposed by the API.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  audit::Audit,
  entity::{Entity, EntityId, Field, FieldValue},
};

const NAME_LEN: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
  /// Assigned by storage; immutable afterwards.
  pub id:          Option<EntityId>,
  pub first_name:  String,
  pub middle_name: Option<String>,
  pub last_name:   String,
  #[serde(flatten)]
  pub audit:       Audit,
}

impl Person {
  pub fn new(
    first_name: impl Into<String>,
    middle_name: Option<String>,
    last_name: impl Into<String>,
  ) -> Self {
    Self {
      first_name: first_name.into(),
      middle_name,
      last_name: last_name.into(),
      ..Default::default()
    }
  }
}

impl Entity for Person {
  const TABLE: &'static str = "person";
  const FIELDS: &'static [Field] = &[
    Field::text("first_name", NAME_LEN),
    Field::text("middle_name", NAME_LEN).nullable(),
    Field::text("last_name", NAME_LEN),
  ];

  fn id(&self) -> Option<EntityId> { self.id }

  fn set_id(&mut self, id: EntityId) { self.id = Some(id); }

  fn audit(&self) -> &Audit { &self.audit }

  fn audit_mut(&mut self) -> &mut Audit { &mut self.audit }

  fn field(&self, name: &str) -> Option<FieldValue> {
    match name {
      "first_name" => Some(FieldValue::Text(self.first_name.clone())),
      "middle_name" => Some(self.middle_name.clone().into()),
      "last_name" => Some(FieldValue::Text(self.last_name.clone())),
      _ => None,
    }
  }

  fn set_field(&mut self, name: &str, value: FieldValue) -> Result<()> {
    match name {
      "first_name" => self.first_name = value.into_text(name)?,
      "middle_name" => self.middle_name = value.into_opt_text(name)?,
      "last_name" => self.last_name = value.into_text(name)?,
      other => return Err(Error::UnknownField(other.to_owned())),
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::mapping::apply_fields;

  #[test]
  fn maps_names_from_payload() {
    let data = json!({ "first_name": "Ann", "last_name": "Lee", "middle_name": null });
    let mut p = Person::default();
    apply_fields(&mut p, data.as_object().unwrap()).unwrap();

    assert_eq!(p.first_name, "Ann");
    assert_eq!(p.last_name, "Lee");
    assert_eq!(p.middle_name, None);
  }

  #[test]
  fn serialises_audit_fields_flat() {
    let mut p = Person::new("Ann", Some("Q".into()), "Lee");
    p.set_id(3);
    p.audit.active = true;

    let v = serde_json::to_value(&p).unwrap();
    assert_eq!(v["id"], 3);
    assert_eq!(v["first_name"], "Ann");
    assert_eq!(v["middle_name"], "Q");
    assert_eq!(v["active"], true);
    assert!(v.get("created_on").is_some());
    assert!(v.get("audit").is_none());
  }

  #[test]
  fn rejects_unknown_field_name() {
    let mut p = Person::default();
    let err = p.set_field("nickname", FieldValue::Text("x".into())).unwrap_err();
    assert!(matches!(err, Error::UnknownField(_)));
  }
}
