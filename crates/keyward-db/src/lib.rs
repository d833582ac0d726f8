//! keyward database adapters.
//!
//! Two interchangeable implementations of the `keyward-core` repository
//! traits:
//! - [`relational`]: PostgreSQL via `sqlx`, soft delete through a nullable
//!   `deleted_at` column.
//! - [`document`]: SurrealDB, soft delete through an explicit `active`
//!   flag and identifiers stored through a private binary codec.
//!
//! Both translate driver errors into the shared taxonomy through
//! [`DbError`].

pub mod document;
mod error;
pub mod relational;

pub use document::{DocumentConfig, DocumentStore};
pub use error::{DbError, DbResult};
pub use relational::{RelationalConfig, RelationalStore};
