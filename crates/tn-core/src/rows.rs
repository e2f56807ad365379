//! Row types shared by the edge list, the optimisation table, and the
//! baseline model.
//!
//! Times are minutes and lengths kilometres, both stored as `f32` (the width
//! of the persisted columns).  Computations that accumulate along paths work
//! in `f64` and narrow at the end.

use crate::codes::EdgeType;
use crate::ids::NodeId;

// ── Edge ──────────────────────────────────────────────────────────────────────

/// One directed edge of the edge list.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub from:      NodeId,
    pub to:        NodeId,
    pub edge_type: EdgeType,
    /// Travel time in minutes; the single optimisation metric.
    pub time:      f32,
    /// Physical length in kilometres.
    pub length:    f32,
}

impl Edge {
    #[inline]
    pub fn key(&self) -> (NodeId, NodeId) {
        (self.from, self.to)
    }

    /// The same edge in the opposite direction.
    pub fn reversed(&self) -> Edge {
        Edge { from: self.to, to: self.from, ..self.clone() }
    }
}

// ── PathRecord ────────────────────────────────────────────────────────────────

/// One row of the optimisation table, or of the path-carrying part of a zone
/// snapshot.
///
/// `path` starts at `from`, ends at `to`, and `nb_edges == path.len() - 1`.
#[derive(Clone, Debug, PartialEq)]
pub struct PathRecord {
    pub from:      NodeId,
    pub to:        NodeId,
    pub edge_type: EdgeType,
    pub time:      f32,
    pub nb_edges:  u16,
    pub path:      Vec<NodeId>,
}

impl PathRecord {
    /// Build a record from a node sequence, deriving `from`, `to` and
    /// `nb_edges`.  Returns `None` for a sequence shorter than two nodes.
    pub fn from_path(edge_type: EdgeType, time: f32, path: Vec<NodeId>) -> Option<PathRecord> {
        let (&from, &to) = (path.first()?, path.last()?);
        if path.len() < 2 {
            return None;
        }
        Some(PathRecord {
            from,
            to,
            edge_type,
            time,
            nb_edges: (path.len() - 1) as u16,
            path,
        })
    }

    #[inline]
    pub fn key(&self) -> (NodeId, NodeId) {
        (self.from, self.to)
    }

    /// Consecutive `(path[i], path[i + 1])` segments in path order.
    pub fn segments(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.path.windows(2).map(|w| (w[0], w[1]))
    }
}

// ── BaselineRow ───────────────────────────────────────────────────────────────

/// One origin-destination pair of the baseline model for a single mode.
///
/// `time` and `length` are `None` when the model has no connection for the
/// pair; such rows carry the `withoutIMT` / `withoutPT` type.
#[derive(Clone, Debug, PartialEq)]
pub struct BaselineRow {
    pub from:      NodeId,
    pub to:        NodeId,
    pub edge_type: EdgeType,
    pub time:      Option<f32>,
    pub length:    Option<f32>,
    pub path:      Vec<NodeId>,
}

impl BaselineRow {
    /// Convert to an [`Edge`] when the row is connected.
    pub fn as_edge(&self) -> Option<Edge> {
        Some(Edge {
            from:      self.from,
            to:        self.to,
            edge_type: self.edge_type,
            time:      self.time?,
            length:    self.length?,
        })
    }
}
