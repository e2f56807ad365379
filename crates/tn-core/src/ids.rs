//! Strongly typed node identifier.
//!
//! Node ids are zone or station numbers shared by the new network and the
//! baseline model.  They fit the signed 16-bit range used by the persisted
//! tables, so the wrapper stores an `i16` and is `Copy + Ord + Hash`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Identifier of a zone or station.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub i16);

impl NodeId {
    /// Ids at or above this value mark synthetic stations placed outside the
    /// baseline model's study area.
    pub const OUT_OF_AREA_START: NodeId = NodeId(10_001);

    #[inline(always)]
    pub fn get(self) -> i16 {
        self.0
    }

    /// `true` when the id lies inside the baseline model's coverage domain.
    #[inline]
    pub fn in_study_area(self) -> bool {
        self < Self::OUT_OF_AREA_START
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<NodeId> for i64 {
    #[inline(always)]
    fn from(id: NodeId) -> i64 {
        id.0 as i64
    }
}

impl TryFrom<i64> for NodeId {
    type Error = CoreError;
    fn try_from(n: i64) -> Result<NodeId, Self::Error> {
        i16::try_from(n).map(NodeId).map_err(|_| CoreError::NodeIdRange(n))
    }
}
