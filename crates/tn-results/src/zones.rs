//! Zone registry: which zone ids a snapshot may be requested for.

use tn_core::NodeId;
use tn_store::{Filter, TabularStore};

use crate::{ResultsError, ResultsResult};

/// Zones table of the baseline model (`id`, `nptmid`).
pub struct ZoneRegistry<'a, S: TabularStore + ?Sized> {
    store:  &'a S,
    schema: &'a str,
    table:  &'a str,
}

impl<'a, S: TabularStore + ?Sized> ZoneRegistry<'a, S> {
    pub fn new(store: &'a S, schema: &'a str, table: &'a str) -> Self {
        Self { store, schema, table }
    }

    pub fn exists(&self, zone: NodeId) -> ResultsResult<bool> {
        if !self.store.exists(self.schema, self.table)? {
            return Err(ResultsError::Precondition(format!(
                "zones table {}.{} does not exist; import the zones first",
                self.schema, self.table
            )));
        }
        let rows = self.store.read(self.schema, self.table, Some(&["id"][..]), &Filter::eq("id", i64::from(zone)))?;
        Ok(!rows.is_empty())
    }

    /// Fail with [`ResultsError::InvalidZone`] unless `zone` is registered.
    pub fn require(&self, zone: NodeId) -> ResultsResult<()> {
        if self.exists(zone)? {
            Ok(())
        } else {
            Err(ResultsError::InvalidZone { zone, table: format!("{}.{}", self.schema, self.table) })
        }
    }
}
