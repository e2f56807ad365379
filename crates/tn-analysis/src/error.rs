//! Error types for tn-analysis.

use thiserror::Error;

use tn_core::{CoreError, NetworkLevel, NodeId};
use tn_pvs::PvsError;
use tn_store::StoreError;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Pvs(#[from] PvsError),

    /// An upstream table or step is missing; the message names it.
    #[error("{0}")]
    Precondition(String),

    #[error("the edge list is empty: {0}")]
    EmptyEdgeList(String),

    #[error("link {from}->{to} ({level:?} level): travel time {time} is not a finite non-negative number")]
    InvalidEdgeTime { from: NodeId, to: NodeId, level: NetworkLevel, time: f32 },

    #[error("the graph is empty or contains no edges; ensure the edge list is valid")]
    EmptyGraph,

    #[error("no rows in {0}")]
    EmptyResult(String),

    #[error("{metric}: {count} (from,to) pairs have conflicting duplicate values")]
    ConflictingDuplicates { metric: String, count: usize },

    #[error("invalid zone ids: {0}")]
    InvalidZoneIds(String),

    /// A stored cell could not be decoded into its domain type.
    #[error("{context}: {reason}")]
    Corrupt { context: String, reason: String },
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
