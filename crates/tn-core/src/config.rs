//! Typed analysis configuration.
//!
//! A [`RawConfig`] is what a TOML file deserialises into: every field is
//! optional so that validation can report *all* missing fields at once.
//! [`RawConfig::validate`] turns it into an [`AnalysisConfig`] whose fields
//! are guaranteed present.
//!
//! ```toml
//! network_number = 7
//! pvs_number     = 1
//! extension      = "IMT"
//! nptm_schema    = "nptm_2017"
//! zones_table    = "zones"
//! imt_table      = "od_imt"
//! pt_table       = "od_pt"
//! database       = "transnetmap.db"
//! ```
//!
//! All persisted table names are derived here so that every crate agrees on
//! them.

use std::path::PathBuf;

use serde::Deserialize;

use crate::codes::Mode;
use crate::{CoreError, CoreResult};

pub const DEFAULT_NETWORK_SCHEMA: &str = "networks";
pub const DEFAULT_PVS_SCHEMA: &str = "physical_values";

/// Name of the edge-list table inside the results namespace.
pub const EDGELIST_TABLE: &str = "edgelist";
/// Name of the optimisation table inside the results namespace.
pub const OPTIMISATION_TABLE: &str = "optimisation";
/// Prefix shared by every zone snapshot table.
pub const SNAPSHOT_PREFIX: &str = "results_";

/// Table holding travel-time set `number`.
pub fn travel_time_table_name(number: u32) -> String {
    format!("travel_time_set_{number}")
}

/// Table holding impact set `name` of set `number`.
pub fn impact_table_name(name: &str, number: u32) -> String {
    format!("impacts_{name}_{number}")
}

// ── RawConfig ─────────────────────────────────────────────────────────────────

/// Unvalidated configuration, as read from TOML.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    pub network_number: Option<u32>,
    pub pvs_number:     Option<u32>,
    pub extension:      Option<String>,
    pub nptm_schema:    Option<String>,
    pub zones_table:    Option<String>,
    pub imt_table:      Option<String>,
    pub pt_table:       Option<String>,
    pub network_schema: Option<String>,
    pub pvs_schema:     Option<String>,
    pub database:       Option<PathBuf>,
}

impl RawConfig {
    /// Check that every required field is present and well formed.
    ///
    /// Missing fields are collected and reported together in
    /// [`CoreError::MissingFields`]; an unknown `extension` is reported as
    /// [`CoreError::InvalidMode`].
    pub fn validate(self) -> CoreResult<AnalysisConfig> {
        let mut missing = Vec::new();
        if self.network_number.is_none() { missing.push("network_number"); }
        if self.pvs_number.is_none()     { missing.push("pvs_number"); }
        if self.extension.is_none()      { missing.push("extension"); }
        if blank(&self.nptm_schema)      { missing.push("nptm_schema"); }
        if blank(&self.zones_table)      { missing.push("zones_table"); }
        if blank(&self.imt_table)        { missing.push("imt_table"); }
        if blank(&self.pt_table)         { missing.push("pt_table"); }

        let (
            Some(network_number),
            Some(pvs_number),
            Some(extension),
            Some(nptm_schema),
            Some(zones_table),
            Some(imt_table),
            Some(pt_table),
        ) = (
            self.network_number,
            self.pvs_number,
            self.extension,
            self.nptm_schema,
            self.zones_table,
            self.imt_table,
            self.pt_table,
        )
        else {
            return Err(CoreError::MissingFields(missing));
        };
        if !missing.is_empty() {
            return Err(CoreError::MissingFields(missing));
        }

        let extension = extension.parse::<Mode>()?;
        let network_schema = self.network_schema.unwrap_or_else(|| DEFAULT_NETWORK_SCHEMA.to_owned());
        let pvs_schema = self.pvs_schema.unwrap_or_else(|| DEFAULT_PVS_SCHEMA.to_owned());
        for (field, value) in [("network_schema", &network_schema), ("pvs_schema", &pvs_schema)] {
            if value.trim().is_empty() {
                return Err(CoreError::Config(format!("`{field}` must not be empty")));
            }
        }

        Ok(AnalysisConfig {
            network_number,
            pvs_number,
            extension,
            nptm_schema,
            zones_table,
            imt_table,
            pt_table,
            network_schema,
            pvs_schema,
            database: self.database,
        })
    }
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|s| s.trim().is_empty())
}

// ── AnalysisConfig ────────────────────────────────────────────────────────────

/// Validated configuration of one analysis run: which network, which physical
/// value set, which baseline model and which extension mode.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisConfig {
    pub network_number: u32,
    pub pvs_number:     u32,
    pub extension:      Mode,
    pub nptm_schema:    String,
    pub zones_table:    String,
    pub imt_table:      String,
    pub pt_table:       String,
    pub network_schema: String,
    pub pvs_schema:     String,
    pub database:       Option<PathBuf>,
}

impl AnalysisConfig {
    /// Namespace holding `edgelist`, `optimisation` and the zone snapshots,
    /// e.g. `results_7_pvs1_imt_nptm_2017`.
    pub fn results_schema(&self) -> String {
        format!(
            "results_{}_pvs{}_{}_{}",
            self.network_number,
            self.pvs_number,
            self.extension.as_str().to_lowercase(),
            self.nptm_schema,
        )
    }

    /// Network table inside [`network_schema`](Self::network_schema).
    pub fn network_table(&self) -> String {
        format!("network_{}_{}", self.network_number, self.nptm_schema)
    }

    /// Baseline table inside [`nptm_schema`](Self::nptm_schema) for `mode`.
    pub fn baseline_table(&self, mode: Mode) -> &str {
        match mode {
            Mode::Imt => &self.imt_table,
            Mode::Pt  => &self.pt_table,
        }
    }

    /// Travel-time set inside [`pvs_schema`](Self::pvs_schema).
    pub fn travel_time_table(&self) -> String {
        travel_time_table_name(self.pvs_number)
    }

    /// Impact set for impact `name` inside [`pvs_schema`](Self::pvs_schema).
    pub fn impact_table(&self, name: &str) -> String {
        impact_table_name(name, self.pvs_number)
    }

    /// Zone snapshot table inside the results namespace.
    pub fn snapshot_table(zone: impl std::fmt::Display) -> String {
        format!("{SNAPSHOT_PREFIX}{zone}")
    }
}
