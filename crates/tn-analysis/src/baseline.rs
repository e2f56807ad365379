//! Baseline model access.
//!
//! The baseline (NPTM) stores one table per mode with the columns
//! `from, to, type, time, length, path`.  Callers express the slice they need
//! as a [`Filter`]; [`touching_nodes`] and [`touching_zone`] build the two
//! slices the pipeline uses.

use tn_core::config::AnalysisConfig;
use tn_core::{BaselineRow, Mode, NodeId};
use tn_store::{Filter, IfExists, TabularStore, Table, Value};

use crate::codec;
use crate::{AnalysisError, AnalysisResult};

pub const COLUMNS: [&str; 6] = ["from", "to", "type", "time", "length", "path"];

/// Source of baseline rows for one mode.
pub trait BaselineProvider {
    /// Rows of the `mode` table matching `filter`, in stored order.
    fn read(&self, mode: Mode, filter: &Filter) -> AnalysisResult<Vec<BaselineRow>>;
}

/// Rows of `mode` with either end in `nodes`, excluding self pairs.
pub fn touching_nodes(mode: Mode, nodes: &[NodeId]) -> Filter {
    let ids: Vec<i64> = nodes.iter().map(|&n| i64::from(n)).collect();
    Filter::And(vec![
        Filter::Or(vec![Filter::is_in("from", ids.iter().copied()), Filter::is_in("to", ids)]),
        Filter::columns_differ("from", "to"),
        Filter::eq("type", mode.edge_type().code() as i64),
    ])
}

/// Connected rows of `mode` starting or ending at `zone`.
pub fn touching_zone(mode: Mode, zone: NodeId) -> Filter {
    Filter::And(vec![
        Filter::Or(vec![Filter::eq("from", i64::from(zone)), Filter::eq("to", i64::from(zone))]),
        Filter::eq("type", mode.edge_type().code() as i64),
    ])
}

// ── Store-backed provider ─────────────────────────────────────────────────────

pub struct StoreBaseline<'a, S: TabularStore + ?Sized> {
    store:     &'a S,
    schema:    &'a str,
    imt_table: &'a str,
    pt_table:  &'a str,
}

impl<'a, S: TabularStore + ?Sized> StoreBaseline<'a, S> {
    pub fn new(store: &'a S, schema: &'a str, imt_table: &'a str, pt_table: &'a str) -> Self {
        Self { store, schema, imt_table, pt_table }
    }

    pub fn from_config(store: &'a S, config: &'a AnalysisConfig) -> Self {
        Self::new(store, &config.nptm_schema, &config.imt_table, &config.pt_table)
    }

    fn table(&self, mode: Mode) -> &'a str {
        match mode {
            Mode::Imt => self.imt_table,
            Mode::Pt  => self.pt_table,
        }
    }
}

impl<S: TabularStore + ?Sized> BaselineProvider for StoreBaseline<'_, S> {
    fn read(&self, mode: Mode, filter: &Filter) -> AnalysisResult<Vec<BaselineRow>> {
        let table = self.table(mode);
        if !self.store.exists(self.schema, table)? {
            return Err(AnalysisError::Precondition(format!(
                "baseline table {}.{table} ({mode}) does not exist; import the baseline model first",
                self.schema
            )));
        }
        let data = self.store.read(self.schema, table, Some(&COLUMNS), filter)?;
        let rows = decode_rows(&data, table)?;
        log::debug!("{} {mode} baseline rows read from {}.{table}", rows.len(), self.schema);
        Ok(rows)
    }
}

// ── Table conversion ──────────────────────────────────────────────────────────

pub fn decode_rows(data: &Table, name: &str) -> AnalysisResult<Vec<BaselineRow>> {
    let [from, to, ty, time, length, path] = codec::indices(data, COLUMNS)?;
    let ctx = |c: &str| format!("{name}.{c}");
    data.rows()
        .iter()
        .map(|row| {
            Ok(BaselineRow {
                from:      codec::node(&row[from], &ctx("from"))?,
                to:        codec::node(&row[to], &ctx("to"))?,
                edge_type: codec::edge_type(&row[ty], &ctx("type"))?,
                time:      codec::opt_float(&row[time], &ctx("time"))?,
                length:    codec::opt_float(&row[length], &ctx("length"))?,
                path:      codec::path(&row[path], &ctx("path"))?,
            })
        })
        .collect()
}

pub fn rows_to_table(rows: &[BaselineRow]) -> AnalysisResult<Table> {
    let mut table = Table::with_capacity(COLUMNS, rows.len());
    for r in rows {
        table.push_row(vec![
            Value::from(i64::from(r.from)),
            Value::from(i64::from(r.to)),
            Value::Int(r.edge_type.code() as i64),
            Value::from(r.time),
            Value::from(r.length),
            codec::path_value(&r.path),
        ])?;
    }
    Ok(table)
}

pub fn save_baseline<S: TabularStore + ?Sized>(
    store:     &mut S,
    namespace: &str,
    table:     &str,
    rows:      &[BaselineRow],
    mode:      IfExists,
) -> AnalysisResult<()> {
    store.write(namespace, table, &rows_to_table(rows)?, mode)?;
    store.add_unique_constraint(namespace, table, &["from", "to"])?;
    log::info!("{} baseline rows written to {namespace}.{table}", rows.len());
    Ok(())
}
