//! Directed weighted graph in CSR form.
//!
//! Node ids are sparse zone numbers, so the graph keeps its own dense
//! indices: `node_ids[i]` is the id of index `i`, assigned in ascending id
//! order.  The outgoing edges of index `i` occupy
//!
//! ```text
//! edge_to[ node_out_start[i] .. node_out_start[i+1] ]
//! ```
//!
//! with their weights (travel time in minutes) in `edge_weight`.

use std::ops::Range;

use rustc_hash::FxHashMap;

use tn_core::{Edge, NodeId};

/// Sentinel for "no node".
pub const NO_NODE: u32 = u32::MAX;

pub struct DiGraph {
    /// Id of each dense index, ascending.
    pub node_ids: Vec<NodeId>,

    /// CSR row pointer; length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    /// Destination index of each edge.
    pub edge_to: Vec<u32>,

    pub edge_weight: Vec<f64>,

    index: FxHashMap<NodeId, u32>,
}

impl DiGraph {
    /// Graph over `edges`, weighted by `time`.
    pub fn from_edges(edges: &[Edge]) -> DiGraph {
        let mut b = DiGraphBuilder::with_capacity(edges.len());
        for e in edges {
            b.add_edge(e.from, e.to, e.time as f64);
        }
        b.build()
    }

    pub fn node_count(&self) -> usize {
        self.node_ids.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edge_to.is_empty()
    }

    #[inline]
    pub fn node_id(&self, index: u32) -> NodeId {
        self.node_ids[index as usize]
    }

    pub fn node_index(&self, id: NodeId) -> Option<u32> {
        self.index.get(&id).copied()
    }

    /// Edge positions leaving `node`.
    #[inline]
    pub fn out_edges(&self, node: u32) -> Range<usize> {
        let start = self.node_out_start[node as usize] as usize;
        let end   = self.node_out_start[node as usize + 1] as usize;
        start..end
    }
}

// ── DiGraphBuilder ────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct DiGraphBuilder {
    raw: Vec<(NodeId, NodeId, f64)>,
}

impl DiGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(edges: usize) -> Self {
        Self { raw: Vec::with_capacity(edges) }
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId, weight: f64) {
        self.raw.push((from, to, weight));
    }

    pub fn edge_count(&self) -> usize {
        self.raw.len()
    }

    /// Assign dense indices and build the CSR arrays.
    ///
    /// O(E log E) for the edge sort.
    pub fn build(self) -> DiGraph {
        let mut node_ids: Vec<NodeId> = self.raw.iter().flat_map(|&(a, b, _)| [a, b]).collect();
        node_ids.sort_unstable();
        node_ids.dedup();
        let index: FxHashMap<NodeId, u32> =
            node_ids.iter().enumerate().map(|(i, &id)| (id, i as u32)).collect();

        // Every id was inserted above.
        let dense = |id: NodeId| index.get(&id).copied().unwrap_or(NO_NODE);
        let mut raw: Vec<(u32, u32, f64)> =
            self.raw.into_iter().map(|(a, b, w)| (dense(a), dense(b), w)).collect();
        raw.sort_by_key(|&(a, b, _)| (a, b));

        let node_count = node_ids.len();
        let mut node_out_start = vec![0u32; node_count + 1];
        for &(a, _, _) in &raw {
            node_out_start[a as usize + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, raw.len());

        DiGraph {
            edge_to: raw.iter().map(|&(_, b, _)| b).collect(),
            edge_weight: raw.iter().map(|&(_, _, w)| w).collect(),
            node_ids,
            node_out_start,
            index,
        }
    }
}
