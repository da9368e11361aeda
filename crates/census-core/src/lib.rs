//! Core types and trait definitions for the Census API.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! declares the entities, the audit stamp, the loosely-typed field mapper,
//! and the [`store::EntityStore`] trait that storage backends implement.

// Native `async fn` in traits; the trait spells out `Send` bounds itself.
#![allow(async_fn_in_trait)]

pub mod audit;
pub mod entity;
pub mod error;
pub mod mapping;
pub mod person;
pub mod store;

pub use error::{Error, Result};
