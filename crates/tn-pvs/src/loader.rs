//! CSV loaders for physical value sets.
//!
//! # CSV format
//!
//! Both files are `;`-separated with a header row.
//!
//! Travel-time set:
//!
//! ```csv
//! name;value;unit;description;comments
//! tf_name;suarm;-;time function;
//! l_ts;120;km/h;top speed lower level;
//! ```
//!
//! Impact set (`max_distance` and `load_percent` may be `-` or empty for
//! null):
//!
//! ```csv
//! type;max_distance;impact_type;impact_value;impact_unit;motorization;load_percent;description;comments;sources
//! IMT;-;CO2;0.186;kg/pkm;average;-;car;;mobitool
//! PT;4;CO2;0.055;kg/pkm;average;-;urban;;mobitool
//! ```

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::impact::{self, ImpactRow, ImpactTable};
use crate::travel_time::{self, ParamEntry, TravelTimeSet};
use crate::{PvsError, PvsResult};

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TravelTimeRecord {
    name:        String,
    value:       String,
    unit:        Option<String>,
    description: Option<String>,
    comments:    Option<String>,
}

#[derive(Deserialize)]
struct ImpactRecord {
    #[serde(rename = "type")]
    edge_type:    String,
    max_distance: Option<String>,
    impact_type:  String,
    impact_value: Option<String>,
    impact_unit:  String,
    motorization: Option<String>,
    load_percent: Option<String>,
    description:  Option<String>,
    comments:     Option<String>,
    sources:      Option<String>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load and validate a travel-time set from a CSV file.
pub fn load_travel_time_csv(path: &Path) -> PvsResult<TravelTimeSet> {
    let file = std::fs::File::open(path)?;
    load_travel_time_reader(file, &path.display().to_string())
}

/// Like [`load_travel_time_csv`] but accepts any `Read` source; `source_name`
/// labels errors.
pub fn load_travel_time_reader<R: Read>(reader: R, source_name: &str) -> PvsResult<TravelTimeSet> {
    let mut rdr = csv_reader(reader);
    check_headers(&mut rdr, source_name, &travel_time::COLUMNS, true)?;

    let mut entries = Vec::new();
    for result in rdr.deserialize::<TravelTimeRecord>() {
        let r = result?;
        entries.push(ParamEntry {
            name:        r.name.trim().to_owned(),
            value:       r.value.trim().to_owned(),
            unit:        r.unit.unwrap_or_default(),
            description: r.description.unwrap_or_default(),
            comments:    r.comments.unwrap_or_default(),
        });
    }
    log::debug!("{source_name}: {} travel-time parameters read", entries.len());
    TravelTimeSet::from_entries(source_name, entries)
}

/// Load and validate the impact set `impact` from a CSV file.
pub fn load_impacts_csv(path: &Path, impact: &str) -> PvsResult<ImpactTable> {
    let file = std::fs::File::open(path)?;
    load_impacts_reader(file, impact, &path.display().to_string())
}

/// Like [`load_impacts_csv`] but accepts any `Read` source.
pub fn load_impacts_reader<R: Read>(reader: R, impact: &str, source_name: &str) -> PvsResult<ImpactTable> {
    let mut rdr = csv_reader(reader);
    check_headers(&mut rdr, source_name, &impact::COLUMNS, false)?;

    let mut rows = Vec::new();
    for result in rdr.deserialize::<ImpactRecord>() {
        let r = result?;
        rows.push(ImpactRow {
            edge_type:    r.edge_type.parse()?,
            max_distance: parse_optional("max_distance", r.max_distance)?,
            impact_type:  r.impact_type.trim().to_owned(),
            impact_value: parse_optional("impact_value", r.impact_value)?,
            impact_unit:  r.impact_unit.trim().to_owned(),
            motorization: non_null(r.motorization),
            load_percent: parse_optional("load_percent", r.load_percent)?,
            description:  non_null(r.description),
            comments:     non_null(r.comments),
            sources:      non_null(r.sources),
        });
    }
    log::debug!("{source_name}: {} impact rows read", rows.len());
    ImpactTable::validate(impact, rows)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Reject missing columns, and unexpected ones when `strict`.
fn check_headers<R: Read>(
    rdr: &mut csv::Reader<R>,
    source_name: &str,
    required: &[&str],
    strict: bool,
) -> PvsResult<()> {
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_owned).collect();
    let missing: Vec<String> = required
        .iter()
        .filter(|c| !headers.iter().any(|h| h == *c))
        .map(|c| (*c).to_owned())
        .collect();
    if !missing.is_empty() {
        return Err(PvsError::MissingColumns { source_name: source_name.to_owned(), missing });
    }
    let unexpected: Vec<String> = headers
        .into_iter()
        .filter(|h| !required.contains(&h.as_str()))
        .collect();
    if strict && !unexpected.is_empty() {
        return Err(PvsError::UnexpectedColumns { source_name: source_name.to_owned(), unexpected });
    }
    Ok(())
}

/// `-` and empty cells are null.
fn non_null(cell: Option<String>) -> Option<String> {
    cell.filter(|s| !s.is_empty() && s != "-")
}

fn parse_optional(column: &str, cell: Option<String>) -> PvsResult<Option<f32>> {
    match non_null(cell) {
        None => Ok(None),
        Some(s) => s
            .parse::<f32>()
            .map(Some)
            .map_err(|_| PvsError::InvalidValue { name: column.to_owned(), value: s }),
    }
}
