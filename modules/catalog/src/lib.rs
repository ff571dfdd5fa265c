//! Generic attribute store with an access-controlled, dynamically
//! filtered query engine.
//!
//! Entities (blocks, elements, sections, points, users, groups, files)
//! carry a dynamic set of typed attributes — localized strings, long
//! descriptions, directory-backed points, numeric counters and file
//! references — plus a row-level permission list. Writes reconcile
//! stored attribute rows against a submitted desired state inside one
//! transaction; reads compile untyped filter/sort parameters into scoped
//! relational queries where pagination is always applied last.

pub mod api;
pub mod domain;
pub mod infra;

pub use domain::service::{Catalog, CatalogConfig};
pub use infra::storage::migrations::Migrator;
