//! Impact computation on edges and aggregation along paths.
//!
//! Per edge, the impact is `value_per_km(type, length) × length`, where the
//! per-km value comes from the first breakpoint at or above the length
//! (falling back to the type's open-ended row).  A path's impact and length
//! are the sums over its segments, each segment looked up in the edge list.
//!
//! Every type present in the input must be defined by the impact set;
//! a missing type is an error rather than a silent zero.

use std::collections::{BTreeMap, BTreeSet};

use tn_analysis::EdgeList;
use tn_core::{Edge, EdgeType, PathRecord};
use tn_pvs::ImpactTable;

use crate::{ResultsError, ResultsResult};

/// A path row with its aggregated length and impacts.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregatedPath {
    pub record:  PathRecord,
    /// Sum of segment lengths, kilometres.
    pub length:  f32,
    /// One total per requested impact, in request order.
    pub impacts: Vec<f32>,
}

/// Impact sets keyed by impact name.
#[derive(Debug, Default)]
pub struct ImpactAggregator {
    tables: BTreeMap<String, ImpactTable>,
}

impl ImpactAggregator {
    pub fn new(tables: impl IntoIterator<Item = ImpactTable>) -> Self {
        Self { tables: tables.into_iter().map(|t| (t.name().to_owned(), t)).collect() }
    }

    /// Loaded impact names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.tables.keys().map(String::as_str)
    }

    fn table(&self, name: &str) -> ResultsResult<&ImpactTable> {
        self.tables
            .get(name)
            .ok_or_else(|| ResultsError::Precondition(format!("impact set {name} is not loaded")))
    }

    /// Per-edge impact of `name` for each of `edges`.
    pub fn edge_values(&self, name: &str, edges: &[Edge]) -> ResultsResult<Vec<f32>> {
        let table = self.table(name)?;
        let types: BTreeSet<EdgeType> = edges.iter().map(|e| e.edge_type).collect();
        for &t in &types {
            if table.breakpoints(t).is_none() {
                return Err(ResultsError::MissingImpactType { impact: name.to_owned(), edge_type: t });
            }
            log::debug!("{name}: {t} matched on {:?}", table.breakpoints(t).map(|b| b.steps()));
        }
        edges
            .iter()
            .map(|e| {
                let v = table.edge_impact(e.edge_type, e.length).ok_or_else(|| {
                    ResultsError::MissingImpactType { impact: name.to_owned(), edge_type: e.edge_type }
                })?;
                if v.is_finite() {
                    Ok(v)
                } else {
                    Err(ResultsError::Inconsistency(format!(
                        "{name} impact of edge {}-{} is {v}",
                        e.from, e.to
                    )))
                }
            })
            .collect()
    }

    /// Compute and attach the `names` columns to `list`, replacing any
    /// previous values of the same names.
    pub fn apply_to_edges(&self, list: &mut EdgeList, names: &[String]) -> ResultsResult<()> {
        for name in names {
            let values = self.edge_values(name, list.edges())?;
            list.set_impact(name, values)?;
            log::info!("{name} computed on {} edges", list.len());
        }
        Ok(())
    }

    /// Sum length and each of `names` over the segments of every path.
    ///
    /// `edges` must carry the `names` columns.  A segment absent from the
    /// edge list is an [`Inconsistency`](ResultsError::Inconsistency).
    pub fn aggregate_paths(
        &self,
        paths: &[PathRecord],
        edges: &EdgeList,
        names: &[String],
    ) -> ResultsResult<Vec<AggregatedPath>> {
        let columns: Vec<&[f32]> = names
            .iter()
            .map(|name| {
                edges.impact(name).ok_or_else(|| {
                    ResultsError::Precondition(format!(
                        "edge list has no {name} column; update the edge list impacts first"
                    ))
                })
            })
            .collect::<ResultsResult<_>>()?;
        let index = edges.index();

        paths
            .iter()
            .map(|p| {
                let mut length = 0.0f64;
                let mut totals = vec![0.0f64; columns.len()];
                for (a, b) in p.segments() {
                    let &i = index.get(&(a, b)).ok_or_else(|| {
                        ResultsError::Inconsistency(format!(
                            "segment {a}-{b} of path {}-{} is not in the edge list",
                            p.from, p.to
                        ))
                    })?;
                    length += edges.edges()[i].length as f64;
                    for (total, column) in totals.iter_mut().zip(&columns) {
                        *total += column[i] as f64;
                    }
                }
                let impacts: Vec<f32> = totals.into_iter().map(|t| t as f32).collect();
                if let Some(bad) = impacts.iter().position(|v| !v.is_finite()) {
                    return Err(ResultsError::Inconsistency(format!(
                        "{} total of path {}-{} is not finite",
                        names[bad], p.from, p.to
                    )));
                }
                Ok(AggregatedPath { record: p.clone(), length: length as f32, impacts })
            })
            .collect()
    }
}
