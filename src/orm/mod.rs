//! Lightweight object mapping over the row API: declared columns, a
//! generated id mapping, and queries that yield typed model instances.

pub mod column;
pub mod database;
pub mod mapping;
pub mod model;

pub use column::{Column, ForeignKey};
pub use database::{Database, ModelPager, Query};
pub use mapping::{generate_mapping, DatabaseMapping, ModelMapping};
pub use model::{MappingSpec, Model, ModelColumn, ModelColumns};

#[cfg(test)]
pub(crate) mod testutil;
