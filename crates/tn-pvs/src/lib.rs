//! `tn-pvs` — physical value sets and travel-time functions.
//!
//! A physical value set (PVS) is a numbered bundle of parameters, versioned
//! independently of the networks it is applied to.  There are two kinds:
//!
//! | Module          | Contents                                               |
//! |-----------------|--------------------------------------------------------|
//! | [`time_fn`]     | `TimeFunctionRegistry`, built-ins `suarm` and `constant_speed` |
//! | [`travel_time`] | `TravelTimeSet`: kinematic parameters per network level |
//! | [`impact`]      | `ImpactTable`: per-type impact step functions          |
//! | [`loader`]      | `;`-separated CSV import of both kinds                 |
//! | [`provider`]    | `PvsProvider` trait, store-backed reader and writers   |
//! | [`error`]       | `PvsError`, `PvsResult`                                |

pub mod error;
pub mod impact;
pub mod loader;
pub mod provider;
pub mod time_fn;
pub mod travel_time;

#[cfg(test)]
mod tests;

pub use error::{PvsError, PvsResult};
pub use impact::{Breakpoints, ImpactRow, ImpactTable};
pub use loader::{load_impacts_csv, load_impacts_reader, load_travel_time_csv, load_travel_time_reader};
pub use provider::{PvsProvider, StorePvsProvider, save_impact_set, save_travel_time_set};
pub use time_fn::{TimeFunction, TimeFunctionRegistry, constant_speed, suarm};
pub use travel_time::{LevelParams, ParamEntry, TravelTimeSet};
