//! Workspace base error type.
//!
//! Downstream crates define their own error enums and wrap `CoreError` as one
//! variant via `#[from]`.

use thiserror::Error;

/// Errors raised while decoding codes or validating configuration.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown edge type code {0}")]
    UnknownTypeCode(i8),

    #[error("unknown edge type name {0:?}")]
    UnknownTypeName(String),

    #[error("unknown network level code {0}")]
    UnknownLevel(i8),

    #[error("invalid network extension type {0:?}: expected \"IMT\" or \"PT\"")]
    InvalidMode(String),

    #[error("missing required parameters: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("node id {0} does not fit the 16-bit node id range")]
    NodeIdRange(i64),
}

/// Shorthand result type for `tn-core`.
pub type CoreResult<T> = Result<T, CoreError>;
