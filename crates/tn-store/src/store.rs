//! The storage trait the pipeline is written against.

use crate::{Filter, StoreResult, Table};

/// Behaviour of [`TabularStore::write`] when the target table exists.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IfExists {
    /// Refuse with [`StoreError::AlreadyExists`](crate::StoreError::AlreadyExists).
    Fail,
    /// Atomically replace the whole table.
    Replace,
}

/// Named tables grouped in named namespaces.
///
/// Namespaces exist implicitly once a table has been written into them.
pub trait TabularStore {
    /// `true` if at least one table lives in `namespace`.
    fn namespace_exists(&self, namespace: &str) -> StoreResult<bool>;

    fn exists(&self, namespace: &str, table: &str) -> StoreResult<bool>;

    /// Column names of an existing table, in stored order.
    fn columns(&self, namespace: &str, table: &str) -> StoreResult<Vec<String>>;

    /// Read the rows matching `filter`, optionally projected on `columns`
    /// (in the given order).  Reading an absent table is
    /// [`StoreError::NotFound`](crate::StoreError::NotFound).
    fn read(
        &self,
        namespace: &str,
        table: &str,
        columns: Option<&[&str]>,
        filter: &Filter,
    ) -> StoreResult<Table>;

    /// Persist `data` as `namespace.table`.
    fn write(&mut self, namespace: &str, table: &str, data: &Table, mode: IfExists) -> StoreResult<()>;

    /// Declare `columns` unique on an existing table.  Fails if the data
    /// already violates the constraint.
    fn add_unique_constraint(&mut self, namespace: &str, table: &str, columns: &[&str]) -> StoreResult<()>;

    /// Names of the tables in `namespace` starting with `prefix`, sorted.
    fn list_tables(&self, namespace: &str, prefix: &str) -> StoreResult<Vec<String>>;
}
