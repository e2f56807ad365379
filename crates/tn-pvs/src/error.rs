//! Error types for tn-pvs.

use thiserror::Error;

use tn_core::CoreError;
use tn_store::StoreError;

/// Errors raised while loading or validating a physical value set.
#[derive(Debug, Error)]
pub enum PvsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{source_name}: missing required columns: {}", .missing.join(", "))]
    MissingColumns { source_name: String, missing: Vec<String> },

    #[error("{source_name}: unexpected columns: {}", .unexpected.join(", "))]
    UnexpectedColumns { source_name: String, unexpected: Vec<String> },

    #[error("{set}: missing required parameters: {}", .keys.join(", "))]
    MissingKeys { set: String, keys: Vec<String> },

    #[error("invalid value for parameter {name:?}: {value:?}")]
    InvalidValue { name: String, value: String },

    /// Speeds, accelerations and fractal factors must be positive, the
    /// deceleration non-zero, and interface times non-negative.
    #[error("{set}: parameters out of range: {}", .names.join(", "))]
    OutOfRange { set: String, names: Vec<String> },

    #[error("invalid impact table {impact}: {reason}")]
    InvalidImpactTable { impact: String, reason: String },

    #[error("unknown impact {0:?}: expected one of CO2, EP, TCO")]
    UnknownImpact(String),

    #[error("time function {0:?} is already registered")]
    DuplicateTimeFunction(String),

    #[error("time function {name:?} is not registered; available: {available}")]
    UnknownTimeFunction { name: String, available: String },

    #[error("physical value set {table} not found in {namespace}: import it first")]
    SetNotFound { namespace: String, table: String },
}

/// Alias for `Result<T, PvsError>`.
pub type PvsResult<T> = Result<T, PvsError>;
