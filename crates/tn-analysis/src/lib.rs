//! `tn-analysis` — from network links to improved shortest paths.
//!
//! | Module           | Contents                                                  |
//! |------------------|-----------------------------------------------------------|
//! | [`network`]      | `NetworkLink`, CSV import, network table access           |
//! | [`od`]           | Zones, OD-matrix completion, baseline assembly            |
//! | [`baseline`]     | `BaselineProvider` trait, store-backed provider, slices   |
//! | [`edgelist`]     | `EdgeListBuilder`, `EdgeList`, `IrrelevantReport`         |
//! | [`graph`]        | `DiGraph` (CSR) and its builder                           |
//! | [`dijkstra`]     | Single-source Dijkstra with optional cutoff               |
//! | [`optimisation`] | `ShortestPathEngine`, `OptimisationTable`, `PathObserver` |
//! | [`codec`]        | Cell decoding shared with downstream crates               |
//! | [`error`]        | `AnalysisError`, `AnalysisResult`                         |
//!
//! # Feature flags
//!
//! | Feature    | Effect                                      |
//! |------------|---------------------------------------------|
//! | `parallel` | Per-source Dijkstra runs on the Rayon pool  |

pub mod baseline;
pub mod codec;
pub mod dijkstra;
pub mod edgelist;
pub mod error;
pub mod graph;
pub mod network;
pub mod od;
pub mod optimisation;


pub use baseline::{BaselineProvider, StoreBaseline};
pub use edgelist::{
    EdgeList, EdgeListBuilder, IrrelevantEdge, IrrelevantReport, edgelist_columns, load_edgelist,
    save_edgelist,
};
pub use error::{AnalysisError, AnalysisResult};
pub use graph::{DiGraph, DiGraphBuilder};
pub use network::{NetworkLink, load_network_csv, load_network_reader, read_network, save_network};
pub use od::{OdOptions, OdValue, RawOdValue, ZoneRecord, assemble_baseline, complete_od, validate_zone_ids};
pub use optimisation::{
    NoopObserver, OptimisationTable, PathObserver, ShortestPath, ShortestPathEngine, ShortestPathOptions,
    load_optimisation, save_optimisation,
};
