// src/catalog/mod.rs

//! Catalog of registered scripts.
//!
//! - [`model`] holds the record types.
//! - [`store`] is the SQLite-backed `CatalogStore`. Every operation opens its
//!   own connection and (re)creates the `scripts` table if it is missing.

pub mod model;
pub mod store;

pub use model::{NewScript, ScriptRecord};
pub use store::CatalogStore;
