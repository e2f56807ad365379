//! Access to physical value sets persisted in a tabular store.

use tn_core::KNOWN_IMPACTS;
use tn_core::config::{impact_table_name, travel_time_table_name};
use tn_store::{Filter, IfExists, TabularStore};

use crate::{ImpactTable, PvsError, PvsResult, TravelTimeSet};

/// Source of physical value sets, keyed by set number.
pub trait PvsProvider {
    fn load_travel_time_set(&self, number: u32) -> PvsResult<TravelTimeSet>;

    fn load_impact_set(&self, name: &str, number: u32) -> PvsResult<ImpactTable>;

    /// Known impact names for which set `number` exists, sorted.
    fn available_impacts(&self, number: u32) -> PvsResult<Vec<String>>;
}

/// [`PvsProvider`] reading from one namespace of a [`TabularStore`].
pub struct StorePvsProvider<'a, S: TabularStore + ?Sized> {
    store:  &'a S,
    schema: &'a str,
}

impl<'a, S: TabularStore + ?Sized> StorePvsProvider<'a, S> {
    pub fn new(store: &'a S, schema: &'a str) -> Self {
        Self { store, schema }
    }

    fn require(&self, table: &str) -> PvsResult<()> {
        if self.store.exists(self.schema, table)? {
            Ok(())
        } else {
            Err(PvsError::SetNotFound { namespace: self.schema.to_owned(), table: table.to_owned() })
        }
    }
}

impl<S: TabularStore + ?Sized> PvsProvider for StorePvsProvider<'_, S> {
    fn load_travel_time_set(&self, number: u32) -> PvsResult<TravelTimeSet> {
        let table = travel_time_table_name(number);
        self.require(&table)?;
        let data = self.store.read(self.schema, &table, None, &Filter::All)?;
        TravelTimeSet::from_table(&table, &data)
    }

    fn load_impact_set(&self, name: &str, number: u32) -> PvsResult<ImpactTable> {
        let table = impact_table_name(name, number);
        self.require(&table)?;
        let data = self.store.read(self.schema, &table, None, &Filter::All)?;
        ImpactTable::from_table(name, &data)
    }

    fn available_impacts(&self, number: u32) -> PvsResult<Vec<String>> {
        let mut names = Vec::new();
        for name in KNOWN_IMPACTS {
            if self.store.exists(self.schema, &impact_table_name(name, number))? {
                names.push(name.to_owned());
            }
        }
        Ok(names)
    }
}

// ── Writers ───────────────────────────────────────────────────────────────────

/// Persist travel-time set `number` in `schema`.
pub fn save_travel_time_set<S: TabularStore + ?Sized>(
    store:  &mut S,
    schema: &str,
    number: u32,
    set:    &TravelTimeSet,
    mode:   IfExists,
) -> PvsResult<()> {
    let table = travel_time_table_name(number);
    store.write(schema, &table, &set.to_table()?, mode)?;
    store.add_unique_constraint(schema, &table, &["name"])?;
    log::info!("travel-time set written to {schema}.{table}");
    Ok(())
}

/// Persist impact set `impacts` as set `number` in `schema`.
pub fn save_impact_set<S: TabularStore + ?Sized>(
    store:   &mut S,
    schema:  &str,
    number:  u32,
    impacts: &ImpactTable,
    mode:    IfExists,
) -> PvsResult<()> {
    let table = impact_table_name(impacts.name(), number);
    store.write(schema, &table, &impacts.to_table()?, mode)?;
    store.add_unique_constraint(schema, &table, &["type", "impact_value"])?;
    log::info!("{} impact set written to {schema}.{table}", impacts.name());
    Ok(())
}
