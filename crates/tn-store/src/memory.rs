//! In-process backend.
//!
//! Holds every table in a `BTreeMap` keyed by `(namespace, table)`.  Used by
//! the pipeline tests and by callers that only need transient results.

use std::collections::BTreeMap;

use crate::{Filter, IfExists, StoreError, StoreResult, Table, TabularStore};

struct StoredTable {
    data:   Table,
    unique: Vec<Vec<String>>,
}

/// [`TabularStore`] kept entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: BTreeMap<(String, String), StoredTable>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `write` calls since construction.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Unique constraints declared on a table, in declaration order.
    pub fn unique_constraints(&self, namespace: &str, table: &str) -> StoreResult<&[Vec<String>]> {
        Ok(&self.get(namespace, table)?.unique)
    }

    fn get(&self, namespace: &str, table: &str) -> StoreResult<&StoredTable> {
        self.tables
            .get(&(namespace.to_owned(), table.to_owned()))
            .ok_or_else(|| not_found(namespace, table))
    }
}

fn not_found(namespace: &str, table: &str) -> StoreError {
    StoreError::NotFound { namespace: namespace.to_owned(), table: table.to_owned() }
}

impl TabularStore for MemoryStore {
    fn namespace_exists(&self, namespace: &str) -> StoreResult<bool> {
        Ok(self.tables.keys().any(|(ns, _)| ns == namespace))
    }

    fn exists(&self, namespace: &str, table: &str) -> StoreResult<bool> {
        Ok(self.tables.contains_key(&(namespace.to_owned(), table.to_owned())))
    }

    fn columns(&self, namespace: &str, table: &str) -> StoreResult<Vec<String>> {
        Ok(self.get(namespace, table)?.data.columns().to_vec())
    }

    fn read(
        &self,
        namespace: &str,
        table: &str,
        columns: Option<&[&str]>,
        filter: &Filter,
    ) -> StoreResult<Table> {
        let data = &self.get(namespace, table)?.data;
        for c in filter.referenced_columns() {
            data.column_index(c)?;
        }

        let mut selected = Table::new(data.columns().iter().cloned());
        for row in data.rows() {
            if filter.matches(data, row)? {
                selected.push_row(row.clone())?;
            }
        }
        match columns {
            Some(names) => selected.project(names),
            None => Ok(selected),
        }
    }

    fn write(&mut self, namespace: &str, table: &str, data: &Table, mode: IfExists) -> StoreResult<()> {
        let key = (namespace.to_owned(), table.to_owned());
        if mode == IfExists::Fail && self.tables.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                namespace: namespace.to_owned(),
                table: table.to_owned(),
            });
        }
        if data.is_empty() {
            return Err(StoreError::Empty(format!("{namespace}.{table}")));
        }
        // A replaced table starts without constraints, as a freshly created one.
        self.tables.insert(key, StoredTable { data: data.clone(), unique: Vec::new() });
        self.writes += 1;
        Ok(())
    }

    fn add_unique_constraint(&mut self, namespace: &str, table: &str, columns: &[&str]) -> StoreResult<()> {
        let stored = self
            .tables
            .get_mut(&(namespace.to_owned(), table.to_owned()))
            .ok_or_else(|| not_found(namespace, table))?;
        if stored.data.has_duplicates(columns)? {
            return Err(StoreError::UniqueViolation {
                table: format!("{namespace}.{table}"),
                columns: columns.join(", "),
            });
        }
        stored.unique.push(columns.iter().map(|c| (*c).to_owned()).collect());
        Ok(())
    }

    fn list_tables(&self, namespace: &str, prefix: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .tables
            .keys()
            .filter(|(ns, name)| ns == namespace && name.starts_with(prefix))
            .map(|(_, name)| name.clone())
            .collect())
    }
}
