//! All-pairs shortest paths and the optimisation table.
//!
//! [`ShortestPathEngine`] runs one Dijkstra per source over the edge-list
//! graph and keeps the pairs for which the combined network is strictly
//! faster than the baseline's direct time.  Pairs the baseline does not
//! connect are dropped.  Surviving rows are typed `with-NTS`.
//!
//! Sources are independent: with the `parallel` feature they run on the
//! Rayon pool, and the output order is the same as the sequential run.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use tn_core::config::OPTIMISATION_TABLE;
use tn_core::{EdgeType, Mode, NodeId, PathRecord};
use tn_store::{Filter, IfExists, TabularStore, Table, Value};

use crate::baseline::BaselineProvider;
use crate::codec;
use crate::dijkstra;
use crate::edgelist::EdgeList;
use crate::graph::DiGraph;
use crate::{AnalysisError, AnalysisResult};

pub const COLUMNS: [&str; 6] = ["from", "to", "type", "time", "nb_edges", "path"];

// ── PathObserver ──────────────────────────────────────────────────────────────

/// Progress hooks for the all-pairs phase.  Default methods are no-ops.
///
/// Called from worker threads when the `parallel` feature is on.
pub trait PathObserver: Sync {
    fn on_start(&self, _sources: usize) {}

    fn on_source_done(&self, _source: NodeId, _reached: usize) {}

    fn on_finish(&self, _pairs: usize) {}
}

pub struct NoopObserver;

impl PathObserver for NoopObserver {}

// ── ShortestPathEngine ────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default)]
pub struct ShortestPathOptions {
    /// Largest path cost explored, in minutes.  `None` is unbounded.
    pub cutoff: Option<f64>,
}

/// A shortest path between two distinct nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct ShortestPath {
    pub from: NodeId,
    pub to:   NodeId,
    pub time: f64,
    pub path: Vec<NodeId>,
}

#[derive(Default)]
pub struct ShortestPathEngine {
    options: ShortestPathOptions,
}

impl ShortestPathEngine {
    pub fn new(options: ShortestPathOptions) -> Self {
        Self { options }
    }

    /// Shortest paths between every ordered pair of distinct reachable
    /// nodes, sorted by `(from,to)`.
    pub fn all_pairs(&self, graph: &DiGraph, observer: &dyn PathObserver) -> AnalysisResult<Vec<ShortestPath>> {
        if graph.is_empty() {
            return Err(AnalysisError::EmptyGraph);
        }
        let sources = graph.node_count() as u32;
        observer.on_start(sources as usize);

        #[cfg(feature = "parallel")]
        let per_source: Vec<Vec<ShortestPath>> =
            (0..sources).into_par_iter().map(|s| self.from_source(graph, s, observer)).collect();
        #[cfg(not(feature = "parallel"))]
        let per_source: Vec<Vec<ShortestPath>> =
            (0..sources).map(|s| self.from_source(graph, s, observer)).collect();

        let mut paths: Vec<ShortestPath> = per_source.into_iter().flatten().collect();
        paths.sort_by_key(|p| (p.from, p.to));
        observer.on_finish(paths.len());
        log::info!("{} shortest paths over {} nodes", paths.len(), graph.node_count());
        Ok(paths)
    }

    fn from_source(&self, graph: &DiGraph, source: u32, observer: &dyn PathObserver) -> Vec<ShortestPath> {
        let tree = dijkstra::single_source(graph, source, self.options.cutoff);
        let from = graph.node_id(source);
        let paths: Vec<ShortestPath> = tree
            .reached()
            .filter(|&t| t != source)
            .filter_map(|t| {
                Some(ShortestPath {
                    from,
                    to:   graph.node_id(t),
                    time: tree.distance(t)?,
                    path: tree.path_to(graph, t),
                })
            })
            .collect();
        observer.on_source_done(from, paths.len());
        paths
    }

    /// Optimisation table of `edges` against the `mode` baseline.
    pub fn compute_all_pairs(
        &self,
        edges:    &EdgeList,
        baseline: &dyn BaselineProvider,
        mode:     Mode,
        observer: &dyn PathObserver,
    ) -> AnalysisResult<OptimisationTable> {
        let graph = DiGraph::from_edges(edges.edges());
        let paths = self.all_pairs(&graph, observer)?;

        let times: FxHashMap<(NodeId, NodeId), f32> = baseline
            .read(mode, &Filter::All)?
            .into_iter()
            .filter_map(|r| Some(((r.from, r.to), r.time?)))
            .collect();
        let table = improvements(paths, &times);
        if table.is_empty() {
            log::warn!("no pair is improved over the {mode} baseline");
        } else {
            log::info!("{} pairs improved over the {mode} baseline", table.len());
        }
        Ok(table)
    }
}

/// Keep paths strictly faster than the baseline time of the same pair.
///
/// Path times are narrowed to `f32` before comparing.
pub fn improvements(paths: Vec<ShortestPath>, baseline: &FxHashMap<(NodeId, NodeId), f32>) -> OptimisationTable {
    let rows = paths
        .into_iter()
        .filter_map(|p| {
            let time = p.time as f32;
            let reference = *baseline.get(&(p.from, p.to))?;
            if time < reference {
                PathRecord::from_path(EdgeType::WithNts, time, p.path)
            } else {
                None
            }
        })
        .collect();
    OptimisationTable { rows }
}

// ── OptimisationTable ─────────────────────────────────────────────────────────

/// Improved paths, sorted by `(from,to)`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OptimisationTable {
    rows: Vec<PathRecord>,
}

impl OptimisationTable {
    pub fn new(rows: Vec<PathRecord>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[PathRecord] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<PathRecord> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_table(&self) -> AnalysisResult<Table> {
        let mut table = Table::with_capacity(COLUMNS, self.rows.len());
        for r in &self.rows {
            table.push_row(vec![
                Value::from(i64::from(r.from)),
                Value::from(i64::from(r.to)),
                Value::Int(r.edge_type.code() as i64),
                Value::from(r.time),
                Value::Int(r.nb_edges as i64),
                codec::path_value(&r.path),
            ])?;
        }
        Ok(table)
    }

    pub fn from_table(data: &Table, name: &str) -> AnalysisResult<OptimisationTable> {
        let [from, to, ty, time, nb_edges, path] = codec::indices(data, COLUMNS)?;
        let ctx = |c: &str| format!("{name}.{c}");
        let rows = data
            .rows()
            .iter()
            .map(|row| {
                let nb = row[nb_edges]
                    .as_i64()
                    .and_then(|n| u16::try_from(n).ok())
                    .ok_or_else(|| AnalysisError::Corrupt {
                        context: ctx("nb_edges"),
                        reason:  format!("expected an edge count, found {}", row[nb_edges]),
                    })?;
                Ok(PathRecord {
                    from:      codec::node(&row[from], &ctx("from"))?,
                    to:        codec::node(&row[to], &ctx("to"))?,
                    edge_type: codec::edge_type(&row[ty], &ctx("type"))?,
                    time:      codec::float(&row[time], &ctx("time"))?,
                    nb_edges:  nb,
                    path:      codec::path(&row[path], &ctx("path"))?,
                })
            })
            .collect::<AnalysisResult<Vec<_>>>()?;
        Ok(OptimisationTable { rows })
    }
}

// ── Persistence ───────────────────────────────────────────────────────────────

pub fn save_optimisation<S: TabularStore + ?Sized>(
    store:     &mut S,
    namespace: &str,
    table:     &OptimisationTable,
    mode:      IfExists,
) -> AnalysisResult<()> {
    store.write(namespace, OPTIMISATION_TABLE, &table.to_table()?, mode)?;
    store.add_unique_constraint(namespace, OPTIMISATION_TABLE, &["from", "to"])?;
    log::info!("optimisation written to {namespace}.{OPTIMISATION_TABLE} ({} rows)", table.len());
    Ok(())
}

/// Read the persisted optimisation rows matching `filter`.
pub fn load_optimisation<S: TabularStore + ?Sized>(
    store:     &S,
    namespace: &str,
    filter:    &Filter,
) -> AnalysisResult<OptimisationTable> {
    if !store.exists(namespace, OPTIMISATION_TABLE)? {
        return Err(AnalysisError::Precondition(format!(
            "optimisation {namespace}.{OPTIMISATION_TABLE} does not exist; run the shortest-path optimisation first"
        )));
    }
    let data = store.read(namespace, OPTIMISATION_TABLE, Some(&COLUMNS), filter)?;
    if data.is_empty() {
        return Err(AnalysisError::EmptyResult(format!("{namespace}.{OPTIMISATION_TABLE}")));
    }
    OptimisationTable::from_table(&data, OPTIMISATION_TABLE)
}
