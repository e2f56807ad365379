//! Impact physical value sets and breakpoint lookup.
//!
//! An impact set gives, per edge type, an impact per kilometre.  A type with
//! one row has a constant value; a type with several rows is a step function
//! of length: each finite `max_distance` is a breakpoint, and exactly one row
//! with a null `max_distance` covers lengths beyond every breakpoint.
//!
//! # Lookup rule
//!
//! For an edge of length `L` the value is taken from the **first breakpoint
//! `>= L`** (breakpoints sorted ascending), falling back to the null row when
//! `L` exceeds all of them.  This is a ceiling match, not a floor match and
//! not an interpolation.
//!
//! ```text
//! type  max_distance  impact_value
//! PT    4.0           0.55          L <= 4        → 0.55
//! PT    20.0          0.40          4 < L <= 20   → 0.40
//! PT    -             0.30          L > 20        → 0.30
//! ```

use std::collections::BTreeMap;

use tn_core::{EdgeType, is_known_impact};
use tn_store::{Table, Value};

use crate::{PvsError, PvsResult};

/// Stored column order of an impact set.
pub const COLUMNS: [&str; 10] = [
    "type", "max_distance", "impact_type", "impact_value", "impact_unit",
    "motorization", "load_percent", "description", "comments", "sources",
];

// ── ImpactRow ─────────────────────────────────────────────────────────────────

/// One row of an impact set as imported.
#[derive(Clone, Debug, PartialEq)]
pub struct ImpactRow {
    pub edge_type:    EdgeType,
    pub max_distance: Option<f32>,
    pub impact_type:  String,
    pub impact_value: Option<f32>,
    pub impact_unit:  String,
    pub motorization: Option<String>,
    pub load_percent: Option<f32>,
    pub description:  Option<String>,
    pub comments:     Option<String>,
    pub sources:      Option<String>,
}

// ── Breakpoints ───────────────────────────────────────────────────────────────

/// Step function of one edge type.
#[derive(Clone, Debug, PartialEq)]
pub struct Breakpoints {
    /// `(max_distance, impact_value)`, ascending by distance.
    steps:    Vec<(f32, f32)>,
    fallback: f32,
}

impl Breakpoints {
    pub fn new(mut steps: Vec<(f32, f32)>, fallback: f32) -> Self {
        steps.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { steps, fallback }
    }

    /// Impact per kilometre for an edge of `length` km.
    pub fn value_per_km(&self, length: f32) -> f32 {
        let i = self.steps.partition_point(|&(max, _)| max < length);
        self.steps.get(i).map_or(self.fallback, |&(_, v)| v)
    }

    pub fn steps(&self) -> &[(f32, f32)] {
        &self.steps
    }

    pub fn fallback(&self) -> f32 {
        self.fallback
    }
}

// ── ImpactTable ───────────────────────────────────────────────────────────────

/// A validated impact set for one impact name.
#[derive(Clone, Debug)]
pub struct ImpactTable {
    name:        String,
    unit:        String,
    rows:        Vec<ImpactRow>,
    breakpoints: BTreeMap<EdgeType, Breakpoints>,
}

impl ImpactTable {
    /// Validate `rows` as the impact set for `name`.
    ///
    /// Rules, in checking order:
    /// - `name` is a known impact;
    /// - `impact_value` is never null;
    /// - every `impact_type` equals `name`;
    /// - a single `impact_unit` across rows;
    /// - IMT, PT and the three network levels are all present;
    /// - `motorization`, `description` and `sources` are never null;
    /// - a one-row type has a null `max_distance`; a multi-row type has
    ///   exactly one null and otherwise unique breakpoints;
    /// - no duplicate `(type, impact_value)` pair.
    pub fn validate(name: &str, mut rows: Vec<ImpactRow>) -> PvsResult<Self> {
        if !is_known_impact(name) {
            return Err(PvsError::UnknownImpact(name.to_owned()));
        }
        let invalid = |reason: String| PvsError::InvalidImpactTable { impact: name.to_owned(), reason };

        if rows.iter().any(|r| r.impact_value.is_none_or(|v| !v.is_finite())) {
            return Err(invalid("`impact_value` contains null values".to_owned()));
        }
        if let Some(r) = rows.iter().find(|r| r.impact_type != name) {
            return Err(invalid(format!(
                "`impact_type` {:?} does not match the impact name",
                r.impact_type
            )));
        }
        let unit = match rows.first() {
            Some(r) => r.impact_unit.clone(),
            None => return Err(invalid("the table is empty".to_owned())),
        };
        if rows.iter().any(|r| r.impact_unit != unit) {
            return Err(invalid("`impact_unit` holds different values; they must be identical".to_owned()));
        }
        let missing: Vec<&str> = EdgeType::IMPACT_REQUIRED
            .iter()
            .filter(|t| !rows.iter().any(|r| r.edge_type == **t))
            .map(|t| t.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(invalid(format!("missing types: {}", missing.join(", "))));
        }
        let null_text = [
            ("motorization", rows.iter().any(|r| r.motorization.is_none())),
            ("description", rows.iter().any(|r| r.description.is_none())),
            ("sources", rows.iter().any(|r| r.sources.is_none())),
        ];
        if let Some((col, _)) = null_text.iter().find(|(_, has_null)| *has_null) {
            return Err(invalid(format!("`{col}` contains null values")));
        }

        let mut by_type: BTreeMap<EdgeType, Vec<&ImpactRow>> = BTreeMap::new();
        for r in &rows {
            by_type.entry(r.edge_type).or_default().push(r);
        }
        let mut breakpoints = BTreeMap::new();
        for (t, group) in &by_type {
            let nulls: Vec<f32> = group
                .iter()
                .filter(|r| r.max_distance.is_none())
                .filter_map(|r| r.impact_value)
                .collect();
            let mut steps: Vec<(f32, f32)> = group
                .iter()
                .filter_map(|r| Some((r.max_distance?, r.impact_value?)))
                .collect();
            if nulls.len() != 1 {
                let reason = if group.len() == 1 {
                    format!("type {t} has a single row, its `max_distance` must be null")
                } else {
                    format!("type {t} must have exactly one null `max_distance`, found {}", nulls.len())
                };
                return Err(invalid(reason));
            }
            steps.sort_by(|a, b| a.0.total_cmp(&b.0));
            if steps.windows(2).any(|w| w[0].0 == w[1].0) {
                return Err(invalid(format!("type {t} has repeated `max_distance` values")));
            }
            if steps.iter().any(|s| !s.0.is_finite()) {
                return Err(invalid(format!("type {t} has a non-finite `max_distance`")));
            }
            let mut values: Vec<f32> = group.iter().filter_map(|r| r.impact_value).collect();
            values.sort_by(f32::total_cmp);
            if values.windows(2).any(|w| w[0] == w[1]) {
                return Err(invalid(format!("type {t} has duplicate `impact_value` entries")));
            }
            log::debug!("{name}: type {t} has {} breakpoint(s) plus fallback", steps.len());
            breakpoints.insert(*t, Breakpoints::new(steps, nulls[0]));
        }

        // Sorted by (type, max_distance) with the null row last.
        rows.sort_by(|a, b| {
            a.edge_type.cmp(&b.edge_type).then_with(|| match (a.max_distance, b.max_distance) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
        });

        Ok(Self { name: name.to_owned(), unit, rows, breakpoints })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn rows(&self) -> &[ImpactRow] {
        &self.rows
    }

    pub fn breakpoints(&self, edge_type: EdgeType) -> Option<&Breakpoints> {
        self.breakpoints.get(&edge_type)
    }

    /// Edge types this set defines.
    pub fn types(&self) -> impl Iterator<Item = EdgeType> + '_ {
        self.breakpoints.keys().copied()
    }

    /// Impact of one edge (`value_per_km × length`), or `None` when the set
    /// has no row for `edge_type`.
    pub fn edge_impact(&self, edge_type: EdgeType, length: f32) -> Option<f32> {
        self.breakpoints
            .get(&edge_type)
            .map(|b| b.value_per_km(length) * length)
    }

    // ── Store conversion ──────────────────────────────────────────────────

    pub fn to_table(&self) -> PvsResult<Table> {
        let mut t = Table::with_capacity(COLUMNS, self.rows.len());
        for r in &self.rows {
            t.push_row(vec![
                Value::from(r.edge_type.as_str()),
                Value::from(r.max_distance),
                Value::from(r.impact_type.as_str()),
                Value::from(r.impact_value),
                Value::from(r.impact_unit.as_str()),
                Value::from(r.motorization.clone()),
                Value::from(r.load_percent),
                Value::from(r.description.clone()),
                Value::from(r.comments.clone()),
                Value::from(r.sources.clone()),
            ])?;
        }
        Ok(t)
    }

    pub fn from_table(name: &str, table: &Table) -> PvsResult<Self> {
        let idx: Vec<usize> = COLUMNS
            .iter()
            .map(|c| table.column_index(c))
            .collect::<Result<_, _>>()?;
        let mut rows = Vec::with_capacity(table.len());
        for row in table.rows() {
            let text = |i: usize| match &row[idx[i]] {
                Value::Null => None,
                v => Some(v.to_string()),
            };
            let float = |i: usize| row[idx[i]].as_f64().map(|v| v as f32);
            rows.push(ImpactRow {
                edge_type:    text(0).unwrap_or_default().parse()?,
                max_distance: float(1),
                impact_type:  text(2).unwrap_or_default(),
                impact_value: float(3),
                impact_unit:  text(4).unwrap_or_default(),
                motorization: text(5),
                load_percent: float(6),
                description:  text(7),
                comments:     text(8),
                sources:      text(9),
            });
        }
        Self::validate(name, rows)
    }
}
