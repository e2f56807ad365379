//! Error types for tn-store.

use thiserror::Error;

/// Errors raised by a [`TabularStore`](crate::TabularStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("table {namespace}.{table} does not exist")]
    NotFound { namespace: String, table: String },

    #[error("table {namespace}.{table} already exists")]
    AlreadyExists { namespace: String, table: String },

    #[error("column {0:?} not found")]
    MissingColumn(String),

    #[error("row has {got} values but the table has {expected} columns")]
    Arity { expected: usize, got: usize },

    #[error("column {column:?} holds {found}, expected {expected}")]
    Type { column: String, expected: &'static str, found: &'static str },

    #[error("refusing to write empty table {0}")]
    Empty(String),

    #[error("duplicate values in {table} for unique columns ({columns})")]
    UniqueViolation { table: String, columns: String },

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;
