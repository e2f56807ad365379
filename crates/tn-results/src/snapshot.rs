//! Zone snapshots (`results_{zone}`).
//!
//! A snapshot gathers, for one zone, every row a map of that zone needs:
//!
//! | Part          | Source                                         | Type         |
//! |---------------|------------------------------------------------|--------------|
//! | improved      | optimisation rows starting or ending at zone   | `with-NTS`   |
//! | extension     | extension-mode baseline rows not improved      | `extend-NTS` |
//! | reference IMT | IMT baseline rows at zone                      | `IMT`        |
//! | reference PT  | PT baseline rows at zone                       | `PT`         |
//!
//! Improved rows carry impacts aggregated along their path; baseline rows
//! are single edges with `nb_edges = 1`.  Rows are sorted by
//! `(from, to, type)`, which must be unique.

use rustc_hash::FxHashSet;

use tn_analysis::{BaselineProvider, EdgeList, baseline, codec};
use tn_core::config::AnalysisConfig;
use tn_core::{BaselineRow, Edge, EdgeType, Mode, NodeId, PathRecord};
use tn_store::{Table, Value};

use crate::impacts::ImpactAggregator;
use crate::{ResultsError, ResultsResult};

/// Columns preceding the impact columns.
pub const LEADING_COLUMNS: [&str; 5] = ["from", "to", "type", "time", "length"];
/// Columns following the impact columns.
pub const TRAILING_COLUMNS: [&str; 2] = ["nb_edges", "path"];

/// Every column a snapshot carrying `impacts` must have, in stored order.
pub fn snapshot_columns(impacts: &[String]) -> Vec<String> {
    LEADING_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(impacts.iter().cloned())
        .chain(TRAILING_COLUMNS.iter().map(|c| c.to_string()))
        .collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct SnapshotRow {
    pub from:      NodeId,
    pub to:        NodeId,
    pub edge_type: EdgeType,
    pub time:      f32,
    pub length:    f32,
    pub impacts:   Vec<f32>,
    pub nb_edges:  u16,
    pub path:      Vec<NodeId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ZoneSnapshot {
    pub zone:    NodeId,
    pub impacts: Vec<String>,
    pub rows:    Vec<SnapshotRow>,
}

impl ZoneSnapshot {
    pub fn table_name(&self) -> String {
        AnalysisConfig::snapshot_table(self.zone)
    }

    pub fn to_table(&self) -> ResultsResult<Table> {
        let mut table = Table::with_capacity(snapshot_columns(&self.impacts), self.rows.len());
        for r in &self.rows {
            let mut row = vec![
                Value::from(i64::from(r.from)),
                Value::from(i64::from(r.to)),
                Value::Int(r.edge_type.code() as i64),
                Value::from(r.time),
                Value::from(r.length),
            ];
            row.extend(r.impacts.iter().map(|&v| Value::from(v)));
            row.push(Value::Int(r.nb_edges as i64));
            row.push(codec::path_value(&r.path));
            table.push_row(row)?;
        }
        Ok(table)
    }
}

/// Inputs of one snapshot computation.
pub struct SnapshotInputs<'a> {
    pub extension:    Mode,
    /// Optimisation rows touching the zone.
    pub optimisation: &'a [PathRecord],
    /// Edge list carrying every impact in `impacts`.
    pub edges:        &'a EdgeList,
    pub baseline:     &'a dyn BaselineProvider,
    pub aggregator:   &'a ImpactAggregator,
    pub impacts:      &'a [String],
}

/// Compute the snapshot of `zone`.
pub fn build_zone_snapshot(zone: NodeId, inputs: &SnapshotInputs<'_>) -> ResultsResult<ZoneSnapshot> {
    if inputs.optimisation.is_empty() {
        return Err(ResultsError::EmptyResult(format!("optimisation rows of zone {zone}")));
    }
    let improved: Vec<SnapshotRow> = inputs
        .aggregator
        .aggregate_paths(inputs.optimisation, inputs.edges, inputs.impacts)?
        .into_iter()
        .map(|p| SnapshotRow {
            from:      p.record.from,
            to:        p.record.to,
            edge_type: p.record.edge_type,
            time:      p.record.time,
            length:    p.length,
            impacts:   p.impacts,
            nb_edges:  p.record.nb_edges,
            path:      p.record.path,
        })
        .collect();

    let imt = reference_rows(zone, Mode::Imt, inputs)?;
    let pt = reference_rows(zone, Mode::Pt, inputs)?;

    let covered: FxHashSet<(NodeId, NodeId)> = improved.iter().map(|r| (r.from, r.to)).collect();
    let extension_source = match inputs.extension {
        Mode::Imt => &imt,
        Mode::Pt  => &pt,
    };
    let extension: Vec<SnapshotRow> = extension_source
        .iter()
        .filter(|r| !covered.contains(&(r.from, r.to)))
        .map(|r| SnapshotRow { edge_type: EdgeType::ExtendNts, ..r.clone() })
        .collect();

    log::info!(
        "zone {zone}: {} improved, {} extension, {} IMT, {} PT rows",
        improved.len(),
        extension.len(),
        imt.len(),
        pt.len()
    );

    let mut rows = improved;
    rows.extend(extension);
    rows.extend(imt);
    rows.extend(pt);
    rows.sort_by_key(|r| (r.from, r.to, r.edge_type));
    if let Some(w) = rows.windows(2).find(|w| (w[0].from, w[0].to, w[0].edge_type) == (w[1].from, w[1].to, w[1].edge_type)) {
        return Err(ResultsError::Inconsistency(format!(
            "zone {zone} snapshot has duplicate rows for {}-{} ({})",
            w[0].from, w[0].to, w[0].edge_type
        )));
    }
    Ok(ZoneSnapshot { zone, impacts: inputs.impacts.to_vec(), rows })
}

/// Connected baseline rows of `mode` at `zone`, with their edge impacts.
fn reference_rows(zone: NodeId, mode: Mode, inputs: &SnapshotInputs<'_>) -> ResultsResult<Vec<SnapshotRow>> {
    let rows: Vec<BaselineRow> = inputs.baseline.read(mode, &baseline::touching_zone(mode, zone))?;
    let edges: Vec<Edge> = rows
        .iter()
        .map(|r| {
            r.as_edge().ok_or_else(|| {
                ResultsError::Inconsistency(format!("{mode} baseline row {}-{} has no time or length", r.from, r.to))
            })
        })
        .collect::<ResultsResult<_>>()?;

    let columns: Vec<Vec<f32>> = inputs
        .impacts
        .iter()
        .map(|name| inputs.aggregator.edge_values(name, &edges))
        .collect::<ResultsResult<_>>()?;

    Ok(rows
        .into_iter()
        .zip(edges)
        .enumerate()
        .map(|(i, (r, e))| SnapshotRow {
            from:      e.from,
            to:        e.to,
            edge_type: e.edge_type,
            time:      e.time,
            length:    e.length,
            impacts:   columns.iter().map(|c| c[i]).collect(),
            nb_edges:  1,
            path:      r.path,
        })
        .collect())
}
