//! Edge-list construction.
//!
//! The edge list fuses two sources into one directed edge per `(from,to)`:
//!
//! 1. **network edges**: every new-network link in both directions, its time
//!    computed from the travel-time set of its level;
//! 2. **baseline edges**: the extension mode's baseline rows touching any
//!    network node, excluding self pairs.
//!
//! Both are concatenated (network first), stably sorted by
//! `(from, to, time)`, and only the first row of each `(from,to)` run is
//! kept.  The fastest edge therefore wins and exact ties go to the network.
//!
//! Network edges slower than their baseline counterpart are reported in an
//! [`IrrelevantReport`] so the network design can be reviewed.

use std::collections::BTreeMap;
use std::io::Write;

use rustc_hash::FxHashMap;

use tn_core::config::EDGELIST_TABLE;
use tn_core::{Edge, EdgeType, Mode, NodeId};
use tn_pvs::{TimeFunctionRegistry, TravelTimeSet};
use tn_store::{Filter, IfExists, TabularStore, Table, Value};

use crate::baseline::{self, BaselineProvider};
use crate::codec;
use crate::network::NetworkLink;
use crate::{AnalysisError, AnalysisResult};

pub const COLUMNS: [&str; 5] = ["from", "to", "type", "time", "length"];

// ── EdgeList ──────────────────────────────────────────────────────────────────

/// Deduplicated directed edges, optionally carrying one impact column per
/// impact name (values aligned with `edges`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgeList {
    edges:   Vec<Edge>,
    impacts: BTreeMap<String, Vec<f32>>,
}

impl EdgeList {
    pub fn new(edges: Vec<Edge>) -> Self {
        Self { edges, impacts: BTreeMap::new() }
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Sorted, distinct node ids appearing at either end of an edge.
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.edges.iter().flat_map(|e| [e.from, e.to]).collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }

    /// `(from,to) -> position` over all edges.
    pub fn index(&self) -> FxHashMap<(NodeId, NodeId), usize> {
        self.edges.iter().enumerate().map(|(i, e)| (e.key(), i)).collect()
    }

    /// Impact names carried, sorted.
    pub fn impact_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.impacts.keys().map(String::as_str)
    }

    pub fn impact(&self, name: &str) -> Option<&[f32]> {
        self.impacts.get(name).map(Vec::as_slice)
    }

    /// Attach or overwrite the `name` column; `values` align with `edges`.
    pub fn set_impact(&mut self, name: &str, values: Vec<f32>) -> AnalysisResult<()> {
        if values.len() != self.edges.len() {
            return Err(AnalysisError::Corrupt {
                context: format!("edge list impact {name}"),
                reason:  format!("{} values for {} edges", values.len(), self.edges.len()),
            });
        }
        self.impacts.insert(name.to_owned(), values);
        Ok(())
    }

    pub fn clear_impacts(&mut self) {
        self.impacts.clear();
    }

    pub fn to_table(&self) -> AnalysisResult<Table> {
        let columns = COLUMNS.iter().map(|c| c.to_string()).chain(self.impacts.keys().cloned());
        let mut table = Table::with_capacity(columns, self.edges.len());
        for (i, e) in self.edges.iter().enumerate() {
            let mut row = vec![
                Value::from(i64::from(e.from)),
                Value::from(i64::from(e.to)),
                Value::Int(e.edge_type.code() as i64),
                Value::from(e.time),
                Value::from(e.length),
            ];
            row.extend(self.impacts.values().map(|v| Value::from(v[i])));
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Decode a stored edge list.  Every column besides the five base
    /// columns is read as an impact column.
    pub fn from_table(data: &Table, name: &str) -> AnalysisResult<EdgeList> {
        let [from, to, ty, time, length] = codec::indices(data, COLUMNS)?;
        let ctx = |c: &str| format!("{name}.{c}");
        let edges = data
            .rows()
            .iter()
            .map(|row| {
                Ok(Edge {
                    from:      codec::node(&row[from], &ctx("from"))?,
                    to:        codec::node(&row[to], &ctx("to"))?,
                    edge_type: codec::edge_type(&row[ty], &ctx("type"))?,
                    time:      codec::float(&row[time], &ctx("time"))?,
                    length:    codec::float(&row[length], &ctx("length"))?,
                })
            })
            .collect::<AnalysisResult<Vec<_>>>()?;

        let mut list = EdgeList::new(edges);
        for (col, column) in data.columns().iter().enumerate() {
            if COLUMNS.contains(&column.as_str()) {
                continue;
            }
            let context = ctx(column);
            let values = data
                .rows()
                .iter()
                .map(|row| codec::float(&row[col], &context))
                .collect::<AnalysisResult<Vec<_>>>()?;
            list.impacts.insert(column.clone(), values);
        }
        Ok(list)
    }
}

// ── Irrelevant edges ──────────────────────────────────────────────────────────

/// A network edge slower than the baseline for the same `(from,to)`.
#[derive(Clone, Debug, PartialEq)]
pub struct IrrelevantEdge {
    pub from:           NodeId,
    pub to:             NodeId,
    pub network_type:   EdgeType,
    pub network_time:   f32,
    pub network_length: f32,
    pub nptm_type:      EdgeType,
    pub nptm_time:      f32,
    pub nptm_length:    f32,
}

/// Network edges beaten by the baseline, sorted by
/// `(network_time, nptm_time)`.  Empty when every network edge is relevant.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IrrelevantReport {
    rows: Vec<IrrelevantEdge>,
}

impl IrrelevantReport {
    pub const COLUMNS: [&'static str; 8] = [
        "from",
        "to",
        "network_type",
        "network_time",
        "network_length",
        "nptm_type",
        "nptm_time",
        "nptm_length",
    ];

    pub fn rows(&self) -> &[IrrelevantEdge] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows with type names rendered as strings.
    pub fn to_table(&self) -> AnalysisResult<Table> {
        let mut table = Table::with_capacity(Self::COLUMNS, self.rows.len());
        for r in &self.rows {
            table.push_row(vec![
                Value::from(i64::from(r.from)),
                Value::from(i64::from(r.to)),
                Value::from(r.network_type.as_str()),
                Value::from(r.network_time),
                Value::from(r.network_length),
                Value::from(r.nptm_type.as_str()),
                Value::from(r.nptm_time),
                Value::from(r.nptm_length),
            ])?;
        }
        Ok(table)
    }

    /// Write the report as `;`-separated CSV.
    pub fn write_csv<W: Write>(&self, writer: W) -> AnalysisResult<()> {
        let mut wtr = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);
        wtr.write_record(Self::COLUMNS)?;
        for r in &self.rows {
            wtr.write_record([
                r.from.to_string(),
                r.to.to_string(),
                r.network_type.to_string(),
                r.network_time.to_string(),
                r.network_length.to_string(),
                r.nptm_type.to_string(),
                r.nptm_time.to_string(),
                r.nptm_length.to_string(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }
}

// ── EdgeListBuilder ───────────────────────────────────────────────────────────

/// Builds the edge list of one network for one extension mode.
pub struct EdgeListBuilder<'a> {
    travel_time: &'a TravelTimeSet,
    registry:    &'a TimeFunctionRegistry,
    extension:   Mode,
}

impl<'a> EdgeListBuilder<'a> {
    pub fn new(travel_time: &'a TravelTimeSet, registry: &'a TimeFunctionRegistry, extension: Mode) -> Self {
        Self { travel_time, registry, extension }
    }

    /// Directed network edges: each study-area link forward, then each link
    /// reversed.
    ///
    /// `time = tf(length · ff, ts, aa, ad) + a_it + b_it` in minutes, with
    /// the length in metres; the edge length is stored in kilometres.  A
    /// time that is not finite or is negative is
    /// [`AnalysisError::InvalidEdgeTime`].
    pub fn network_edges(&self, links: &[NetworkLink]) -> AnalysisResult<Vec<Edge>> {
        let tf = self.registry.lookup(&self.travel_time.tf_name)?;
        let forward: Vec<Edge> = links
            .iter()
            .filter(|l| l.id_a.in_study_area() && l.id_b.in_study_area())
            .map(|l| {
                let p = self.travel_time.level(l.level);
                let length_m = l.length_m * p.fractal_factor;
                let time = (tf(length_m, p.top_speed, p.acceleration, p.deceleration)
                    + p.a_interface
                    + p.b_interface) as f32;
                if !time.is_finite() || time < 0.0 {
                    return Err(AnalysisError::InvalidEdgeTime { from: l.id_a, to: l.id_b, level: l.level, time });
                }
                Ok(Edge {
                    from:      l.id_a,
                    to:        l.id_b,
                    edge_type: l.level.edge_type(),
                    time,
                    length:    (length_m / 1_000.0) as f32,
                })
            })
            .collect::<AnalysisResult<_>>()?;
        let reversed: Vec<Edge> = forward.iter().map(Edge::reversed).collect();
        let mut edges = forward;
        edges.extend(reversed);
        Ok(edges)
    }

    pub fn build(
        &self,
        links:    &[NetworkLink],
        baseline: &dyn BaselineProvider,
    ) -> AnalysisResult<(EdgeList, IrrelevantReport)> {
        let network = self.network_edges(links)?;
        if network.is_empty() {
            return Err(AnalysisError::EmptyEdgeList("no network link inside the study area".into()));
        }

        let mut nodes: Vec<NodeId> = network.iter().flat_map(|e| [e.from, e.to]).collect();
        nodes.sort_unstable();
        nodes.dedup();
        let slice: Vec<Edge> = baseline
            .read(self.extension, &baseline::touching_nodes(self.extension, &nodes))?
            .iter()
            .filter_map(|r| r.as_edge())
            .collect();
        log::info!(
            "{} network edges over {} nodes, {} {} baseline edges",
            network.len(),
            nodes.len(),
            slice.len(),
            self.extension
        );

        let report = irrelevant_edges(&network, &slice);
        if report.is_empty() {
            log::info!("all network edges are relevant");
        } else {
            log::warn!("{} network edges are slower than the baseline", report.rows.len());
        }

        let mut edges = network;
        edges.extend(slice);
        let total = edges.len();
        edges.sort_by(|a, b| a.key().cmp(&b.key()).then(a.time.total_cmp(&b.time)));
        edges.dedup_by_key(|e| e.key());
        log::debug!("{} duplicate (from,to) pairs dropped", total - edges.len());

        if edges.is_empty() {
            return Err(AnalysisError::EmptyEdgeList("no edge left after deduplication".into()));
        }
        log::info!("edge list built: {} edges", edges.len());
        Ok((EdgeList::new(edges), report))
    }
}

/// Network edges strictly slower than their baseline counterpart.
fn irrelevant_edges(network: &[Edge], baseline: &[Edge]) -> IrrelevantReport {
    let by_key: FxHashMap<(NodeId, NodeId), &Edge> = baseline.iter().rev().map(|e| (e.key(), e)).collect();
    let mut rows: Vec<IrrelevantEdge> = network
        .iter()
        .filter_map(|n| {
            let b = by_key.get(&n.key())?;
            (n.time > b.time).then(|| IrrelevantEdge {
                from:           n.from,
                to:             n.to,
                network_type:   n.edge_type,
                network_time:   n.time,
                network_length: n.length,
                nptm_type:      b.edge_type,
                nptm_time:      b.time,
                nptm_length:    b.length,
            })
        })
        .collect();
    rows.sort_by(|a, b| {
        a.network_time
            .total_cmp(&b.network_time)
            .then(a.nptm_time.total_cmp(&b.nptm_time))
    });
    IrrelevantReport { rows }
}

// ── Persistence ───────────────────────────────────────────────────────────────

/// Persist `list` as the `edgelist` table of `namespace`, unique on
/// `(from,to)`.
pub fn save_edgelist<S: TabularStore + ?Sized>(
    store:     &mut S,
    namespace: &str,
    list:      &EdgeList,
    mode:      IfExists,
) -> AnalysisResult<()> {
    store.write(namespace, EDGELIST_TABLE, &list.to_table()?, mode)?;
    store.add_unique_constraint(namespace, EDGELIST_TABLE, &["from", "to"])?;
    log::info!("edge list written to {namespace}.{EDGELIST_TABLE} ({} edges)", list.len());
    Ok(())
}

/// Columns of the persisted edge list.
pub fn edgelist_columns<S: TabularStore + ?Sized>(store: &S, namespace: &str) -> AnalysisResult<Vec<String>> {
    require_edgelist(store, namespace)?;
    Ok(store.columns(namespace, EDGELIST_TABLE)?)
}

/// Read the persisted edge list.
///
/// `impacts` selects the impact columns to load alongside the base columns
/// (`None` loads them all).
pub fn load_edgelist<S: TabularStore + ?Sized>(
    store:     &S,
    namespace: &str,
    impacts:   Option<&[&str]>,
    filter:    &Filter,
) -> AnalysisResult<EdgeList> {
    require_edgelist(store, namespace)?;
    let projection: Option<Vec<&str>> = impacts.map(|names| COLUMNS.iter().chain(names).copied().collect());
    let data = store.read(namespace, EDGELIST_TABLE, projection.as_deref(), filter)?;
    if data.is_empty() {
        return Err(AnalysisError::EmptyResult(format!("{namespace}.{EDGELIST_TABLE}")));
    }
    EdgeList::from_table(&data, EDGELIST_TABLE)
}

fn require_edgelist<S: TabularStore + ?Sized>(store: &S, namespace: &str) -> AnalysisResult<()> {
    if store.exists(namespace, EDGELIST_TABLE)? {
        Ok(())
    } else {
        Err(AnalysisError::Precondition(format!(
            "edge list {namespace}.{EDGELIST_TABLE} does not exist; build the edge list first"
        )))
    }
}
