//! `tn-store` — tabular persistence for the `transnetmap` workspace.
//!
//! Every persisted artefact (network tables, baseline matrices, physical
//! value sets, edge lists, optimisation tables, zone snapshots) is a named
//! table inside a named namespace.  The pipeline only ever talks to the
//! [`TabularStore`] trait, so the backend can be swapped without touching
//! domain code.
//!
//! | Module     | Contents                                                   |
//! |------------|------------------------------------------------------------|
//! | [`table`]  | `Value` cells and the column-named `Table`                 |
//! | [`filter`] | `Filter` row predicates used by `read`                     |
//! | [`store`]  | `TabularStore` trait and `IfExists`                        |
//! | [`memory`] | `MemoryStore`, the in-process backend used by tests        |
//! | `sqlite`   | `SqliteStore` (feature `sqlite`)                           |
//! | [`error`]  | `StoreError`, `StoreResult`                                |
//!
//! # Write discipline
//!
//! Tables are never patched in place.  `write` with [`IfExists::Replace`]
//! swaps the whole table, and backends must make that swap atomic so readers
//! see either the old or the new version.

pub mod error;
pub mod filter;
pub mod memory;
pub mod store;
pub mod table;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use error::{StoreError, StoreResult};
pub use filter::Filter;
pub use memory::MemoryStore;
pub use store::{IfExists, TabularStore};
pub use table::{Table, Value};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
