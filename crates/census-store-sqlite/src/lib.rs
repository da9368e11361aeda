//! SQLite backend for the Census API.
//!
//! [`DatabaseAccess`] is a generic data-access object: one instance per
//! [`census_core::entity::Entity`] type, with SQL derived from the entity's
//! field declarations. All database access runs on `tokio_rusqlite`'s
//! dedicated thread so the async runtime is never blocked.

mod encode;
mod person;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use person::PersonAccess;
pub use store::DatabaseAccess;
