//! Integer codes stored in the `type` and `level` columns.
//!
//! The numeric values are part of the persisted table contract and must not
//! change.  `EdgeType` variants are declared in ascending code order so the
//! derived `Ord` sorts exactly like the stored integers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

// ── Impacts ───────────────────────────────────────────────────────────────────

/// Impact names the workspace knows how to compute, in sorted order.
pub const KNOWN_IMPACTS: [&str; 3] = ["CO2", "EP", "TCO"];

/// `true` if `name` is one of [`KNOWN_IMPACTS`].
pub fn is_known_impact(name: &str) -> bool {
    KNOWN_IMPACTS.contains(&name)
}

// ── EdgeType ──────────────────────────────────────────────────────────────────

/// Category of an edge or path row.
///
/// | Variant      | Code | Meaning                                          |
/// |--------------|------|--------------------------------------------------|
/// | `WithoutPt`  | -2   | baseline PT pair with no connection              |
/// | `WithoutImt` | -1   | baseline IMT pair with no connection             |
/// | `Imt`        | 1    | baseline individual motorised transport          |
/// | `Pt`         | 2    | baseline public transport                        |
/// | `NtsLower`   | 3    | new network, lower level                         |
/// | `NtsMain`    | 4    | new network, main level                          |
/// | `NtsHigher`  | 5    | new network, higher level                        |
/// | `WithNts`    | 6    | improved shortest path through the new network   |
/// | `ExtendNts`  | 7    | baseline pair used to extend the new network     |
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum EdgeType {
    WithoutPt,
    WithoutImt,
    Imt,
    Pt,
    NtsLower,
    NtsMain,
    NtsHigher,
    WithNts,
    ExtendNts,
}

impl EdgeType {
    pub const ALL: [EdgeType; 9] = [
        EdgeType::WithoutPt,
        EdgeType::WithoutImt,
        EdgeType::Imt,
        EdgeType::Pt,
        EdgeType::NtsLower,
        EdgeType::NtsMain,
        EdgeType::NtsHigher,
        EdgeType::WithNts,
        EdgeType::ExtendNts,
    ];

    /// Types every impact table must define a value for.  Derived categories
    /// (`WithNts`, `ExtendNts`) and the no-connection sentinels are excluded.
    pub const IMPACT_REQUIRED: [EdgeType; 5] = [
        EdgeType::Imt,
        EdgeType::Pt,
        EdgeType::NtsLower,
        EdgeType::NtsMain,
        EdgeType::NtsHigher,
    ];

    pub fn code(self) -> i8 {
        match self {
            EdgeType::WithoutPt  => -2,
            EdgeType::WithoutImt => -1,
            EdgeType::Imt        => 1,
            EdgeType::Pt         => 2,
            EdgeType::NtsLower   => 3,
            EdgeType::NtsMain    => 4,
            EdgeType::NtsHigher  => 5,
            EdgeType::WithNts    => 6,
            EdgeType::ExtendNts  => 7,
        }
    }

    pub fn from_code(code: i8) -> Result<EdgeType, CoreError> {
        EdgeType::ALL
            .into_iter()
            .find(|t| t.code() == code)
            .ok_or(CoreError::UnknownTypeCode(code))
    }

    /// Public name, as used in impact tables and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeType::WithoutPt  => "withoutPT",
            EdgeType::WithoutImt => "withoutIMT",
            EdgeType::Imt        => "IMT",
            EdgeType::Pt         => "PT",
            EdgeType::NtsLower   => "NTS-lower",
            EdgeType::NtsMain    => "NTS-main",
            EdgeType::NtsHigher  => "NTS-higher",
            EdgeType::WithNts    => "with-NTS",
            EdgeType::ExtendNts  => "extend-NTS",
        }
    }

    /// `true` for the three levels of the new network.
    pub fn is_network_level(self) -> bool {
        matches!(self, EdgeType::NtsLower | EdgeType::NtsMain | EdgeType::NtsHigher)
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        EdgeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::UnknownTypeName(s.to_owned()))
    }
}

// ── NetworkLevel ──────────────────────────────────────────────────────────────

/// Hierarchy level of a new-network link (`level` column of the network table).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum NetworkLevel {
    Lower,
    Main,
    Higher,
}

impl NetworkLevel {
    pub const ALL: [NetworkLevel; 3] = [NetworkLevel::Lower, NetworkLevel::Main, NetworkLevel::Higher];

    pub fn code(self) -> i8 {
        match self {
            NetworkLevel::Lower  => 1,
            NetworkLevel::Main   => 2,
            NetworkLevel::Higher => 3,
        }
    }

    pub fn from_code(code: i8) -> Result<NetworkLevel, CoreError> {
        NetworkLevel::ALL
            .into_iter()
            .find(|l| l.code() == code)
            .ok_or(CoreError::UnknownLevel(code))
    }

    /// The edge type produced by links of this level.
    pub fn edge_type(self) -> EdgeType {
        match self {
            NetworkLevel::Lower  => EdgeType::NtsLower,
            NetworkLevel::Main   => EdgeType::NtsMain,
            NetworkLevel::Higher => EdgeType::NtsHigher,
        }
    }

    /// Single-letter prefix of this level's parameters in a travel-time set
    /// (`l_ts`, `m_ts`, `h_ts`, …).
    pub fn key_prefix(self) -> &'static str {
        match self {
            NetworkLevel::Lower  => "l",
            NetworkLevel::Main   => "m",
            NetworkLevel::Higher => "h",
        }
    }
}

// ── Mode ──────────────────────────────────────────────────────────────────────

/// Baseline transport mode, also used to choose how the new network is
/// extended to the rest of the study area.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "IMT")]
    Imt,
    #[serde(rename = "PT")]
    Pt,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Imt, Mode::Pt];

    /// Type code of connected baseline pairs for this mode.
    pub fn edge_type(self) -> EdgeType {
        match self {
            Mode::Imt => EdgeType::Imt,
            Mode::Pt  => EdgeType::Pt,
        }
    }

    /// Type code of baseline pairs without a connection for this mode.
    pub fn without_type(self) -> EdgeType {
        match self {
            Mode::Imt => EdgeType::WithoutImt,
            Mode::Pt  => EdgeType::WithoutPt,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Imt => "IMT",
            Mode::Pt  => "PT",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "IMT" => Ok(Mode::Imt),
            "PT"  => Ok(Mode::Pt),
            other => Err(CoreError::InvalidMode(other.to_owned())),
        }
    }
}
