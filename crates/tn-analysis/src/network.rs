//! New-network links: undirected `(id_a, id_b, level, length)` rows.
//!
//! Lengths are metres as drawn; the fractal factor of the travel-time set
//! turns them into travelled distance when the edge list is built.
//!
//! # CSV format
//!
//! ```csv
//! id_a;id_b;level;length
//! 1;2;2;1450.5
//! ```

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use tn_core::{NetworkLevel, NodeId};
use tn_store::{Filter, IfExists, TabularStore, Table, Value};

use crate::codec;
use crate::{AnalysisError, AnalysisResult};

pub const COLUMNS: [&str; 4] = ["id_a", "id_b", "level", "length"];

/// One undirected link of the new network.
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkLink {
    pub id_a:     NodeId,
    pub id_b:     NodeId,
    pub level:    NetworkLevel,
    /// Drawn length in metres.
    pub length_m: f64,
}

#[derive(Deserialize)]
struct LinkRecord {
    id_a:   i64,
    id_b:   i64,
    level:  i8,
    length: f64,
}

// ── CSV ───────────────────────────────────────────────────────────────────────

pub fn load_network_csv(path: &Path) -> AnalysisResult<Vec<NetworkLink>> {
    let file = std::fs::File::open(path)?;
    load_network_reader(file)
}

pub fn load_network_reader<R: Read>(reader: R) -> AnalysisResult<Vec<NetworkLink>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut links = Vec::new();
    for result in rdr.deserialize::<LinkRecord>() {
        let r = result?;
        if !r.length.is_finite() || r.length < 0.0 {
            return Err(AnalysisError::Corrupt {
                context: format!("network link {}-{}", r.id_a, r.id_b),
                reason:  format!("invalid length {}", r.length),
            });
        }
        links.push(NetworkLink {
            id_a:     NodeId::try_from(r.id_a)?,
            id_b:     NodeId::try_from(r.id_b)?,
            level:    NetworkLevel::from_code(r.level)?,
            length_m: r.length,
        });
    }
    log::debug!("{} network links read", links.len());
    Ok(links)
}

// ── Store ─────────────────────────────────────────────────────────────────────

pub fn links_to_table(links: &[NetworkLink]) -> AnalysisResult<Table> {
    let mut table = Table::with_capacity(COLUMNS, links.len());
    for l in links {
        table.push_row(vec![
            Value::from(i64::from(l.id_a)),
            Value::from(i64::from(l.id_b)),
            Value::Int(l.level.code() as i64),
            Value::Float(l.length_m),
        ])?;
    }
    Ok(table)
}

pub fn save_network<S: TabularStore + ?Sized>(
    store:     &mut S,
    namespace: &str,
    table:     &str,
    links:     &[NetworkLink],
    mode:      IfExists,
) -> AnalysisResult<()> {
    store.write(namespace, table, &links_to_table(links)?, mode)?;
    store.add_unique_constraint(namespace, table, &["id_a", "id_b"])?;
    log::info!("{} network links written to {namespace}.{table}", links.len());
    Ok(())
}

/// Read the network table, keeping links whose both ends lie in the study
/// area.
pub fn read_network<S: TabularStore + ?Sized>(
    store:     &S,
    namespace: &str,
    table:     &str,
) -> AnalysisResult<Vec<NetworkLink>> {
    if !store.exists(namespace, table)? {
        return Err(AnalysisError::Precondition(format!(
            "network table {namespace}.{table} does not exist; import the network first"
        )));
    }
    let data = store.read(namespace, table, Some(&COLUMNS), &Filter::All)?;
    let [a, b, level, length] = codec::indices(&data, COLUMNS)?;

    let mut links = Vec::with_capacity(data.len());
    for row in data.rows() {
        let code = row[level]
            .as_i64()
            .and_then(|c| i8::try_from(c).ok())
            .ok_or_else(|| AnalysisError::Corrupt {
                context: format!("{table}.level"),
                reason:  format!("expected a level code, found {}", row[level]),
            })?;
        let link = NetworkLink {
            id_a:     codec::node(&row[a], "network.id_a")?,
            id_b:     codec::node(&row[b], "network.id_b")?,
            level:    NetworkLevel::from_code(code)?,
            length_m: codec::float64(&row[length], "network.length")?,
        };
        if link.id_a.in_study_area() && link.id_b.in_study_area() {
            links.push(link);
        }
    }
    let dropped = data.len() - links.len();
    if dropped > 0 {
        log::debug!("{dropped} network links outside the study area ignored");
    }
    Ok(links)
}
