//! `tn-core` — foundational types for the `transnetmap` workspace.
//!
//! This crate is a dependency of every other `tn-*` crate.  It has no `tn-*`
//! dependencies and only two external ones (`thiserror` and `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`ids`]     | `NodeId` (zone / station identifier)                      |
//! | [`codes`]   | `EdgeType`, `NetworkLevel`, `Mode`, known impact names    |
//! | [`rows`]    | `Edge`, `PathRecord`, `BaselineRow`                       |
//! | [`config`]  | `RawConfig` → `AnalysisConfig` validation, table naming   |
//! | [`error`]   | `CoreError`, `CoreResult`                                 |

pub mod codes;
pub mod config;
pub mod error;
pub mod ids;
pub mod rows;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use codes::{EdgeType, KNOWN_IMPACTS, Mode, NetworkLevel, is_known_impact};
pub use config::{AnalysisConfig, RawConfig};
pub use error::{CoreError, CoreResult};
pub use ids::NodeId;
pub use rows::{BaselineRow, Edge, PathRecord};
