//! Single-source Dijkstra over a [`DiGraph`].

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use tn_core::NodeId;

use crate::graph::{DiGraph, NO_NODE};

/// Distances and predecessor tree from one source.
pub struct SingleSource {
    source: u32,
    /// Best cost per node index; `f64::INFINITY` when unreached.
    dist:   Vec<f64>,
    /// Predecessor index on the best path; [`NO_NODE`] for the source and
    /// unreached nodes.
    prev:   Vec<u32>,
}

impl SingleSource {
    pub fn source(&self) -> u32 {
        self.source
    }

    pub fn distance(&self, target: u32) -> Option<f64> {
        let d = self.dist[target as usize];
        d.is_finite().then_some(d)
    }

    /// Reached node indices (the source included), ascending.
    pub fn reached(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.dist.len() as u32).filter(|&i| self.dist[i as usize].is_finite())
    }

    /// Node ids from the source to `target`, both included.  Empty when
    /// `target` was not reached.
    pub fn path_to(&self, graph: &DiGraph, target: u32) -> Vec<NodeId> {
        if !self.dist[target as usize].is_finite() {
            return Vec::new();
        }
        let mut path = vec![graph.node_id(target)];
        let mut cur = target;
        while self.prev[cur as usize] != NO_NODE {
            cur = self.prev[cur as usize];
            path.push(graph.node_id(cur));
        }
        path.reverse();
        path
    }
}

/// Shortest costs from `source` to every node reachable within `cutoff`
/// (unbounded when `None`).
pub fn single_source(graph: &DiGraph, source: u32, cutoff: Option<f64>) -> SingleSource {
    let n = graph.node_count();
    let mut dist = vec![f64::INFINITY; n];
    let mut prev = vec![NO_NODE; n];
    dist[source as usize] = 0.0;

    // Min-heap on (cost, index); the index breaks ties deterministically.
    let mut heap: BinaryHeap<Reverse<(OrderedFloat<f64>, u32)>> = BinaryHeap::new();
    heap.push(Reverse((OrderedFloat(0.0), source)));

    while let Some(Reverse((OrderedFloat(cost), node))) = heap.pop() {
        // Skip stale heap entries.
        if cost > dist[node as usize] {
            continue;
        }
        for e in graph.out_edges(node) {
            let next = graph.edge_to[e];
            let new_cost = cost + graph.edge_weight[e];
            if cutoff.is_some_and(|c| new_cost > c) {
                continue;
            }
            if new_cost < dist[next as usize] {
                dist[next as usize] = new_cost;
                prev[next as usize] = node;
                heap.push(Reverse((OrderedFloat(new_cost), next)));
            }
        }
    }

    SingleSource { source, dist, prev }
}
