//! Baseline preparation: zones, origin-destination matrices, and their
//! assembly into per-mode baseline rows.
//!
//! Raw matrices arrive keyed by the model's legacy zone numbers (`nptmid`).
//! They are mapped to compact [`NodeId`]s, deduplicated, completed onto
//! `ids × ids`, and finally joined (time with length) into [`BaselineRow`]s.
//!
//! # CSV formats
//!
//! ```csv
//! id;nptmid
//! 1;101001
//! ```
//!
//! ```csv
//! from;to;value
//! 101001;101002;12.5
//! 101001;101003;
//! ```
//!
//! An empty `value` is a pair without connection.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::Deserialize;

use tn_core::{BaselineRow, Mode, NodeId};
use tn_store::{Filter, IfExists, TabularStore, Table, Value};

use crate::codec;
use crate::{AnalysisError, AnalysisResult};

pub const ZONE_COLUMNS: [&str; 2] = ["id", "nptmid"];

/// Default tolerance under which duplicate values count as equal.
pub const DEFAULT_TOLERANCE: f32 = 1e-6;

// ── Zones ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct ZoneRecord {
    pub id:     i64,
    pub nptmid: i64,
}

pub fn load_zones_csv(path: &Path) -> AnalysisResult<Vec<ZoneRecord>> {
    let file = std::fs::File::open(path)?;
    load_zones_reader(file)
}

pub fn load_zones_reader<R: Read>(reader: R) -> AnalysisResult<Vec<ZoneRecord>> {
    let mut rdr = csv_reader(reader);
    let zones = rdr.deserialize::<ZoneRecord>().collect::<Result<Vec<_>, _>>()?;
    log::debug!("{} zones read", zones.len());
    Ok(zones)
}

/// Check that zone ids start at 1, are unique, and fit `i16`.
///
/// Gaps in the numbering are allowed and only logged.
pub fn validate_zone_ids(ids: &[i64]) -> AnalysisResult<()> {
    let (Some(&min), Some(&max)) = (ids.iter().min(), ids.iter().max()) else {
        return Err(AnalysisError::InvalidZoneIds("no zones given".into()));
    };
    if min != 1 {
        return Err(AnalysisError::InvalidZoneIds(format!("ids must start at 1; got min={min}")));
    }
    let unique: BTreeSet<i64> = ids.iter().copied().collect();
    if unique.len() != ids.len() {
        return Err(AnalysisError::InvalidZoneIds(format!(
            "{} duplicate ids",
            ids.len() - unique.len()
        )));
    }
    if max > i16::MAX as i64 {
        return Err(AnalysisError::InvalidZoneIds(format!(
            "ids must fit in int16 (<= {}); got max={max}",
            i16::MAX
        )));
    }
    if max as usize != ids.len() {
        log::warn!(
            "zones: non-contiguous ids ({} ids up to {max}); allowed, compact ids only save space",
            ids.len()
        );
    }
    Ok(())
}

/// Validate and persist the zone table.
pub fn save_zones<S: TabularStore + ?Sized>(
    store:     &mut S,
    namespace: &str,
    table:     &str,
    zones:     &[ZoneRecord],
    mode:      IfExists,
) -> AnalysisResult<()> {
    let ids: Vec<i64> = zones.iter().map(|z| z.id).collect();
    validate_zone_ids(&ids)?;
    let mut data = Table::with_capacity(ZONE_COLUMNS, zones.len());
    for z in zones {
        data.push_row(vec![Value::Int(z.id), Value::Int(z.nptmid)])?;
    }
    store.write(namespace, table, &data, mode)?;
    store.add_unique_constraint(namespace, table, &["id"])?;
    log::info!("{} zones written to {namespace}.{table}", zones.len());
    Ok(())
}

/// Read the zone table as `nptmid -> id`.
pub fn read_zone_mapping<S: TabularStore + ?Sized>(
    store:     &S,
    namespace: &str,
    table:     &str,
) -> AnalysisResult<FxHashMap<i64, NodeId>> {
    if !store.exists(namespace, table)? {
        return Err(AnalysisError::Precondition(format!(
            "zone table {namespace}.{table} does not exist; import the zones first"
        )));
    }
    let data = store.read(namespace, table, Some(&ZONE_COLUMNS), &Filter::All)?;
    let [id, nptmid] = codec::indices(&data, ZONE_COLUMNS)?;
    let mut mapping = FxHashMap::default();
    for row in data.rows() {
        let legacy = row[nptmid].as_i64().ok_or_else(|| AnalysisError::Corrupt {
            context: format!("{table}.nptmid"),
            reason:  format!("expected an integer, found {}", row[nptmid].kind()),
        })?;
        mapping.insert(legacy, codec::node(&row[id], &format!("{table}.id"))?);
    }
    Ok(mapping)
}

// ── OD matrices ───────────────────────────────────────────────────────────────

/// One raw matrix cell keyed by legacy zone numbers.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct RawOdValue {
    pub from:  i64,
    pub to:    i64,
    pub value: Option<f32>,
}

/// One matrix cell keyed by compact node ids.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OdValue {
    pub from:  NodeId,
    pub to:    NodeId,
    pub value: Option<f32>,
}

#[derive(Clone, Copy, Debug)]
pub struct OdOptions {
    /// Fill a missing `(from,to)` from `(to,from)`.  Only for metrics that
    /// are symmetric by construction.
    pub symmetric: bool,
    pub tolerance: f32,
}

impl Default for OdOptions {
    fn default() -> Self {
        Self { symmetric: false, tolerance: DEFAULT_TOLERANCE }
    }
}

pub fn load_od_csv(path: &Path) -> AnalysisResult<Vec<RawOdValue>> {
    let file = std::fs::File::open(path)?;
    load_od_reader(file)
}

pub fn load_od_reader<R: Read>(reader: R) -> AnalysisResult<Vec<RawOdValue>> {
    let mut rdr = csv_reader(reader);
    Ok(rdr.deserialize::<RawOdValue>().collect::<Result<Vec<_>, _>>()?)
}

/// Map legacy zone numbers to node ids, dropping rows with an unknown end.
pub fn map_legacy_ids(
    metric:  &str,
    raw:     &[RawOdValue],
    mapping: &FxHashMap<i64, NodeId>,
) -> Vec<OdValue> {
    let mapped: Vec<OdValue> = raw
        .iter()
        .filter_map(|r| {
            Some(OdValue {
                from:  *mapping.get(&r.from)?,
                to:    *mapping.get(&r.to)?,
                value: r.value,
            })
        })
        .collect();
    let dropped = raw.len() - mapped.len();
    if dropped > 0 {
        log::warn!("{metric}: dropped {dropped} row(s) whose zones are unknown (no nptmid match)");
    }
    mapped
}

struct DuplicateGroup {
    first: Option<f32>,
    count: usize,
    min:   Option<f32>,
    max:   Option<f32>,
}

/// Deduplicate `values` on `(from,to)` and complete them onto `ids × ids`.
///
/// Duplicates whose non-null values differ by more than the tolerance are
/// [`AnalysisError::ConflictingDuplicates`]; otherwise the first occurrence
/// wins.  Pairs without a value stay `None`.  The result is sorted by
/// `(from,to)`.
pub fn complete_od(
    metric:  &str,
    values:  &[OdValue],
    ids:     &[NodeId],
    options: OdOptions,
) -> AnalysisResult<Vec<OdValue>> {
    let mut groups: FxHashMap<(NodeId, NodeId), DuplicateGroup> = FxHashMap::default();
    for v in values {
        let g = groups.entry((v.from, v.to)).or_insert(DuplicateGroup {
            first: v.value,
            count: 0,
            min:   None,
            max:   None,
        });
        g.count += 1;
        if let Some(x) = v.value {
            g.min = Some(g.min.map_or(x, |m| m.min(x)));
            g.max = Some(g.max.map_or(x, |m| m.max(x)));
        }
    }

    let duplicated: Vec<&DuplicateGroup> = groups.values().filter(|g| g.count > 1).collect();
    if !duplicated.is_empty() {
        let conflicting = duplicated
            .iter()
            .filter(|g| matches!((g.min, g.max), (Some(lo), Some(hi)) if hi - lo > options.tolerance))
            .count();
        if conflicting > 0 {
            return Err(AnalysisError::ConflictingDuplicates { metric: metric.to_owned(), count: conflicting });
        }
        log::warn!(
            "{metric}: collapsed {} duplicate (from,to) pair(s) equal within tol={}; kept first occurrence",
            duplicated.len(),
            options.tolerance
        );
    }

    let ids: BTreeSet<NodeId> = ids.iter().copied().collect();
    let lookup = |from: NodeId, to: NodeId| groups.get(&(from, to)).and_then(|g| g.first);
    let mut out = Vec::with_capacity(ids.len() * ids.len());
    let mut missing = 0usize;
    for &from in &ids {
        for &to in &ids {
            let mut value = lookup(from, to);
            if value.is_none() && options.symmetric {
                value = lookup(to, from);
            }
            if value.is_none() {
                missing += 1;
            }
            out.push(OdValue { from, to, value });
        }
    }
    if missing > 0 {
        log::warn!("{metric}: {missing} (from,to) pair(s) have no value and are left without connection");
    }
    Ok(out)
}

/// Join completed time and length matrices into baseline rows of `mode`.
///
/// Pairs missing either value are typed `withoutIMT` / `withoutPT`; every
/// row carries the two-node path `[from, to]`.
pub fn assemble_baseline(mode: Mode, time: &[OdValue], length: &[OdValue]) -> Vec<BaselineRow> {
    let lengths: FxHashMap<(NodeId, NodeId), Option<f32>> =
        length.iter().map(|v| ((v.from, v.to), v.value)).collect();
    let mut rows: Vec<BaselineRow> = time
        .iter()
        .filter_map(|t| {
            let length = *lengths.get(&(t.from, t.to))?;
            let edge_type = if t.value.is_some() && length.is_some() {
                mode.edge_type()
            } else {
                mode.without_type()
            };
            Some(BaselineRow {
                from: t.from,
                to: t.to,
                edge_type,
                time: t.value,
                length,
                path: vec![t.from, t.to],
            })
        })
        .collect();
    rows.sort_by_key(|r| (r.from, r.to));
    rows
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_reader(reader)
}
