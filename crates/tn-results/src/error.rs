//! Error types for tn-results.

use thiserror::Error;

use tn_analysis::AnalysisError;
use tn_core::{CoreError, EdgeType, NodeId};
use tn_pvs::PvsError;
use tn_store::StoreError;

#[derive(Debug, Error)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Pvs(#[from] PvsError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// An upstream table, step, or manager state is missing.
    #[error("{0}")]
    Precondition(String),

    /// Computed data violates an invariant (nulls, duplicates, dangling
    /// path segments).
    #[error("inconsistent data: {0}")]
    Inconsistency(String),

    #[error("impact set {impact} has no value for type {edge_type}")]
    MissingImpactType { impact: String, edge_type: EdgeType },

    #[error(
        "impacts {} exist in the edge list but have no impact set; replace all impacts to restore consistency",
        .impacts.join(", ")
    )]
    InconsistentImpacts { impacts: Vec<String> },

    #[error("no rows in {0}")]
    EmptyResult(String),

    #[error("invalid zone id {zone} in {table}; list the zones table to browse valid ids")]
    InvalidZone { zone: NodeId, table: String },
}

pub type ResultsResult<T> = Result<T, ResultsError>;
