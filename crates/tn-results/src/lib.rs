//! `tn-results` — impacts on edges and paths, zone snapshots, and the
//! consistency of what is persisted.
//!
//! | Module          | Contents                                                 |
//! |-----------------|----------------------------------------------------------|
//! | [`impacts`]     | `ImpactAggregator`: per-edge lookup, per-path totals      |
//! | [`snapshot`]    | `ZoneSnapshot` and its composition                        |
//! | [`zones`]       | `ZoneRegistry`                                            |
//! | [`confirm`]     | `Confirmation` for irreversible operations                |
//! | [`consistency`] | `UpdatePlan`, `ConsistencyManager`, persisted states      |
//! | [`error`]       | `ResultsError`, `ResultsResult`                           |

pub mod confirm;
pub mod consistency;
pub mod error;
pub mod impacts;
pub mod snapshot;
pub mod zones;

#[cfg(test)]
mod tests;

pub use confirm::{AlwaysConfirm, Confirmation, PromptConfirm};
pub use consistency::{ConsistencyManager, NetworkState, ReplaceOutcome, UpdatePlan, ZoneOutcome, ZoneState};
pub use error::{ResultsError, ResultsResult};
pub use impacts::{AggregatedPath, ImpactAggregator};
pub use snapshot::{SnapshotInputs, SnapshotRow, ZoneSnapshot, build_zone_snapshot, snapshot_columns};
pub use zones::ZoneRegistry;
