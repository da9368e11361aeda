//! `GET /swagger.json`: an OpenAPI description of the API.
//!
//! Built with utoipa's runtime builders. Model schemas come from each
//! entity's field declarations, so adding a field to [`Person`] updates the
//! document.

use axum::{Json, extract::State};
use census_core::{
  entity::{Entity, FieldKind},
  person::Person,
};
use serde_json::{Value, json};
use utoipa::openapi::{
  OpenApi, OpenApiBuilder, RefOr, Required,
  content::ContentBuilder,
  info::InfoBuilder,
  path::{
    HttpMethod, Operation, OperationBuilder, Parameter, ParameterBuilder,
    ParameterIn, PathItemBuilder, PathsBuilder,
  },
  request_body::RequestBodyBuilder,
  response::ResponseBuilder,
  schema::{
    ArrayBuilder, ComponentsBuilder, KnownFormat, ObjectBuilder, Ref, Schema,
    SchemaFormat, Type,
  },
  security::{ApiKey, ApiKeyValue, SecurityRequirement, SecurityScheme},
  server::ServerBuilder,
};

use crate::{ApiOptions, AppState, error::ApiError};

const JSON: &str = "application/json";
const SECURITY: &str = "Bearer Auth";

pub async fn swagger<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Value>, ApiError>
where
  S: Send + Sync,
{
  let mut doc = serde_json::to_value(document(&state.options))?;
  doc["x-doc-expansion"] = json!(state.options.swagger_doc_expansion);
  Ok(Json(doc))
}

// ─── Document ─────────────────────────────────────────────────────────────────

/// Build the whole document for `options`.
pub fn document(options: &ApiOptions) -> OpenApi {
  let prefix = options.prefix();
  let server_url = if prefix.is_empty() { "/".to_string() } else { prefix };
  let mask = options.mask_swagger;

  let status = operation("status", "Report that the service is online")
    .response("200", response("Success", None));
  let token = operation("token", "Issue a demo bearer token")
    .response("200", response("Success", None));

  let list = secured("List people")
    .parameter(
      ParameterBuilder::new()
        .name("include_inactive")
        .parameter_in(ParameterIn::Query)
        .required(Required::False)
        .schema(Some(object(Type::Boolean))),
    )
    .response("200", response("Success", Some(person_list())));
  let create = secured("Create a person")
    .request_body(Some(payload()))
    .response("201", response("Created", Some(person_ref())))
    .response("400", response("Invalid payload", None));
  let get_one = secured("Fetch one person")
    .parameter(id_param())
    .response("200", response("Success", Some(person_ref())))
    .response("404", response("Not found", None));
  let update = secured("Update a person")
    .parameter(id_param())
    .request_body(Some(payload()))
    .response("204", response("Updated", None))
    .response("400", response("Invalid payload", None))
    .response("404", response("Not found", None));
  let delete = secured("Deactivate a person")
    .parameter(id_param())
    .parameter(
      ParameterBuilder::new()
        .name("persistent")
        .parameter_in(ParameterIn::Query)
        .required(Required::False)
        .schema(Some(RefOr::T(Schema::Object(
          ObjectBuilder::new()
            .schema_type(Type::Boolean)
            .default(Some(json!(true)))
            .build(),
        )))),
    )
    .response("204", response("Deactivated", None))
    .response("404", response("Not found", None))
    .response("501", response("Non-persistent delete is not implemented", None));

  let paths = PathsBuilder::new()
    .path("/status", PathItemBuilder::new().operation(HttpMethod::Get, status.build()).build())
    .path("/token", PathItemBuilder::new().operation(HttpMethod::Get, token.build()).build())
    .path(
      "/person",
      PathItemBuilder::new()
        .operation(HttpMethod::Get, with_mask(list, mask))
        .operation(HttpMethod::Post, with_mask(create, mask))
        .build(),
    )
    .path(
      "/person/{id}",
      PathItemBuilder::new()
        .operation(HttpMethod::Get, with_mask(get_one, mask))
        .operation(HttpMethod::Put, update.build())
        .operation(HttpMethod::Delete, delete.build())
        .build(),
    );

  let components = ComponentsBuilder::new()
    .schema("Person", definition::<Person>(true))
    .schema("PersonInput", definition::<Person>(false))
    .security_scheme(
      SECURITY,
      SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("Authorization"))),
    )
    .build();

  OpenApiBuilder::new()
    .info(
      InfoBuilder::new()
        .title(options.title.clone())
        .version(env!("CARGO_PKG_VERSION"))
        .build(),
    )
    .servers(Some(vec![ServerBuilder::new().url(server_url).build()]))
    .paths(paths.build())
    .components(Some(components))
    .build()
}

/// Schema for `E`. With `stored` set, the id and audit columns are included
/// as read-only properties.
pub fn definition<E: Entity>(stored: bool) -> RefOr<Schema> {
  let mut builder = ObjectBuilder::new().schema_type(Type::Object);

  if stored {
    builder = builder.property("id", read_only(Type::Integer, None));
  }
  for field in E::FIELDS {
    let (ty, format) = match field.kind {
      FieldKind::Text => (Type::String, None),
      FieldKind::Integer => (Type::Integer, None),
      FieldKind::Bool => (Type::Boolean, None),
      FieldKind::DateTime => (Type::String, Some(KnownFormat::DateTime)),
      FieldKind::Date => (Type::String, Some(KnownFormat::Date)),
    };
    let schema = ObjectBuilder::new()
      .schema_type(ty)
      .format(format.map(SchemaFormat::KnownFormat))
      .max_length(field.max_len);
    builder = builder.property(field.name, RefOr::T(Schema::Object(schema.build())));
    if !field.nullable {
      builder = builder.required(field.name);
    }
  }
  if stored {
    builder = builder
      .property("active", read_only(Type::Boolean, None))
      .property("created_by", read_only(Type::Integer, None))
      .property("created_on", read_only(Type::String, Some(KnownFormat::DateTime)))
      .property("modified_by", read_only(Type::Integer, None))
      .property("modified_on", read_only(Type::String, Some(KnownFormat::DateTime)));
  }

  RefOr::T(Schema::Object(builder.build()))
}

// ─── Builders ─────────────────────────────────────────────────────────────────

fn operation(tag: &str, summary: &str) -> OperationBuilder {
  OperationBuilder::new()
    .tags(Some(vec![tag.to_string()]))
    .summary(Some(summary))
}

fn secured(summary: &str) -> OperationBuilder {
  operation("person", summary)
    .security(SecurityRequirement::new(SECURITY, Vec::<String>::new()))
    .response("401", response("Unauthorized", None))
}

fn with_mask(op: OperationBuilder, mask: bool) -> Operation {
  if mask { op.parameter(mask_param()).build() } else { op.build() }
}

fn mask_param() -> Parameter {
  ParameterBuilder::new()
    .name("X-Fields")
    .parameter_in(ParameterIn::Header)
    .required(Required::False)
    .description(Some("An optional fields mask"))
    .schema(Some(RefOr::T(Schema::Object(
      ObjectBuilder::new()
        .schema_type(Type::String)
        .format(Some(SchemaFormat::Custom("mask".to_string())))
        .build(),
    ))))
    .build()
}

fn id_param() -> Parameter {
  ParameterBuilder::new()
    .name("id")
    .parameter_in(ParameterIn::Path)
    .required(Required::True)
    .schema(Some(object(Type::Integer)))
    .build()
}

fn payload() -> utoipa::openapi::request_body::RequestBody {
  RequestBodyBuilder::new()
    .content(
      JSON,
      ContentBuilder::new()
        .schema(Some(RefOr::<Schema>::Ref(Ref::from_schema_name("PersonInput"))))
        .build(),
    )
    .required(Some(Required::True))
    .build()
}

fn person_ref() -> RefOr<Schema> {
  RefOr::Ref(Ref::from_schema_name("Person"))
}

fn person_list() -> RefOr<Schema> {
  RefOr::T(Schema::Array(ArrayBuilder::new().items(person_ref()).build()))
}

fn response(
  description: &str,
  body: Option<RefOr<Schema>>,
) -> RefOr<utoipa::openapi::response::Response> {
  let builder = ResponseBuilder::new().description(description);
  let builder = match body {
    Some(schema) => {
      builder.content(JSON, ContentBuilder::new().schema(Some(schema)).build())
    }
    None => builder,
  };
  RefOr::T(builder.build())
}

fn object(ty: Type) -> RefOr<Schema> {
  RefOr::T(Schema::Object(ObjectBuilder::new().schema_type(ty).build()))
}

fn read_only(ty: Type, format: Option<KnownFormat>) -> RefOr<Schema> {
  RefOr::T(Schema::Object(
    ObjectBuilder::new()
      .schema_type(ty)
      .format(format.map(SchemaFormat::KnownFormat))
      .read_only(Some(true))
      .build(),
  ))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn json_of<T: serde::Serialize>(v: &T) -> Value {
    serde_json::to_value(v).unwrap()
  }

  #[test]
  fn input_definition_lists_required_fields_only() {
    let def = json_of(&definition::<Person>(false));
    assert_eq!(def["required"], json!(["first_name", "last_name"]));
    assert!(def["properties"].get("id").is_none());
    assert_eq!(def["properties"]["middle_name"]["maxLength"], json!(100));
  }

  #[test]
  fn stored_definition_marks_audit_columns_read_only() {
    let def = json_of(&definition::<Person>(true));
    assert_eq!(def["properties"]["id"]["readOnly"], json!(true));
    assert_eq!(def["properties"]["created_on"]["format"], json!("date-time"));
  }

  #[test]
  fn mask_header_is_documented_only_when_enabled() {
    let plain = json_of(&document(&ApiOptions::default()));
    let params = &plain["paths"]["/person/{id}"]["get"]["parameters"];
    assert_eq!(params.as_array().map(Vec::len), Some(1));

    let masked = json_of(&document(&ApiOptions {
      mask_swagger: true,
      ..ApiOptions::default()
    }));
    let params = &masked["paths"]["/person/{id}"]["get"]["parameters"];
    assert_eq!(params[1]["name"], json!("X-Fields"));
    assert_eq!(params[1]["in"], json!("header"));
  }

  #[test]
  fn person_routes_require_the_bearer_scheme() {
    let doc = json_of(&document(&ApiOptions::default()));
    assert_eq!(
      doc["paths"]["/person"]["post"]["security"],
      json!([{ "Bearer Auth": [] }])
    );
    assert!(doc["paths"]["/status"]["get"].get("security").is_none());
    assert_eq!(
      doc["components"]["securitySchemes"]["Bearer Auth"]["name"],
      json!("Authorization")
    );
  }

  #[test]
  fn server_url_follows_prefix() {
    let doc = json_of(&document(&ApiOptions {
      url_prefix: "/".into(),
      ..ApiOptions::default()
    }));
    assert_eq!(doc["servers"][0]["url"], json!("/"));
    let doc = json_of(&document(&ApiOptions::default()));
    assert_eq!(doc["servers"][0]["url"], json!("/api"));
  }
}
