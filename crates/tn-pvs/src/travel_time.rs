//! Travel-time physical value set.
//!
//! A flat list of named parameters: the time function to apply (`tf_name`)
//! plus six kinematic parameters per network level, prefixed `l_`, `m_` or
//! `h_`:
//!
//! | Suffix | Meaning                      | Unit |
//! |--------|------------------------------|------|
//! | `ff`   | fractal length factor        | -    |
//! | `aa`   | average acceleration         | m/s² |
//! | `ad`   | average deceleration         | m/s² |
//! | `ts`   | top speed                    | km/h |
//! | `a_it` | interface time at departure  | min  |
//! | `b_it` | interface time at arrival    | min  |
//!
//! All three levels are mandatory even when the network uses fewer.

use tn_core::NetworkLevel;
use tn_store::{Table, Value};

use crate::{PvsError, PvsResult};

/// Every parameter name a travel-time set must define.
pub const REQUIRED_KEYS: [&str; 19] = [
    "tf_name", "l_ff", "m_ff", "h_ff",
    "l_a_it", "l_b_it", "m_a_it", "m_b_it", "h_a_it", "h_b_it",
    "l_aa", "l_ad", "m_aa", "m_ad", "h_aa", "h_ad",
    "l_ts", "m_ts", "h_ts",
];

/// Stored column order of a travel-time set.
pub const COLUMNS: [&str; 5] = ["name", "value", "unit", "description", "comments"];

/// One row of the set as imported.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamEntry {
    pub name:        String,
    pub value:       String,
    pub unit:        String,
    pub description: String,
    pub comments:    String,
}

/// Kinematic parameters of one network level.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LevelParams {
    pub fractal_factor: f64,
    pub acceleration:   f64,
    pub deceleration:   f64,
    pub top_speed:      f64,
    pub a_interface:    f64,
    pub b_interface:    f64,
}

impl LevelParams {
    /// Suffixes of the parameters whose value would give an infinite or
    /// negative travel time.
    fn out_of_range(&self) -> Vec<&'static str> {
        let checks = [
            ("ff", self.fractal_factor > 0.0),
            ("aa", self.acceleration > 0.0),
            ("ad", self.deceleration != 0.0),
            ("ts", self.top_speed > 0.0),
            ("a_it", self.a_interface >= 0.0),
            ("b_it", self.b_interface >= 0.0),
        ];
        checks.into_iter().filter(|(_, ok)| !ok).map(|(s, _)| s).collect()
    }
}

/// A validated travel-time set.
#[derive(Clone, Debug)]
pub struct TravelTimeSet {
    pub tf_name: String,
    levels:      [LevelParams; 3],
    entries:     Vec<ParamEntry>,
}

impl TravelTimeSet {
    /// Validate raw entries.
    ///
    /// All missing names are reported together; every value other than
    /// `tf_name` must parse as a finite number, and each level must give a
    /// finite non-negative travel time (see [`PvsError::OutOfRange`]).
    pub fn from_entries(set: &str, entries: Vec<ParamEntry>) -> PvsResult<Self> {
        let missing: Vec<String> = REQUIRED_KEYS
            .iter()
            .filter(|k| !entries.iter().any(|e| e.name == **k))
            .map(|k| (*k).to_owned())
            .collect();
        if !missing.is_empty() {
            return Err(PvsError::MissingKeys { set: set.to_owned(), keys: missing });
        }

        let tf_name = raw_value(&entries, "tf_name").to_owned();
        if tf_name.is_empty() || tf_name.parse::<f64>().is_ok() {
            return Err(PvsError::InvalidValue { name: "tf_name".to_owned(), value: tf_name });
        }

        let invalid: Vec<&ParamEntry> = entries
            .iter()
            .filter(|e| e.name != "tf_name")
            .filter(|e| !e.value.trim().parse::<f64>().is_ok_and(f64::is_finite))
            .collect();
        if let Some(first) = invalid.first() {
            let names: Vec<&str> = invalid.iter().map(|e| e.name.as_str()).collect();
            log::debug!("non-numeric travel-time parameters: {}", names.join(", "));
            return Err(PvsError::InvalidValue {
                name: names.join(", "),
                value: first.value.clone(),
            });
        }

        let num = |key: String| raw_value(&entries, &key).parse::<f64>().unwrap_or(f64::NAN);
        let level = |l: NetworkLevel| {
            let p = l.key_prefix();
            LevelParams {
                fractal_factor: num(format!("{p}_ff")),
                acceleration:   num(format!("{p}_aa")),
                deceleration:   num(format!("{p}_ad")),
                top_speed:      num(format!("{p}_ts")),
                a_interface:    num(format!("{p}_a_it")),
                b_interface:    num(format!("{p}_b_it")),
            }
        };
        let levels = [
            level(NetworkLevel::Lower),
            level(NetworkLevel::Main),
            level(NetworkLevel::Higher),
        ];

        let out_of_range: Vec<String> = NetworkLevel::ALL
            .into_iter()
            .zip(&levels)
            .flat_map(|(l, p)| p.out_of_range().into_iter().map(move |s| format!("{}_{s}", l.key_prefix())))
            .collect();
        if !out_of_range.is_empty() {
            return Err(PvsError::OutOfRange { set: set.to_owned(), names: out_of_range });
        }

        Ok(Self { tf_name, levels, entries })
    }

    pub fn level(&self, level: NetworkLevel) -> &LevelParams {
        match level {
            NetworkLevel::Lower  => &self.levels[0],
            NetworkLevel::Main   => &self.levels[1],
            NetworkLevel::Higher => &self.levels[2],
        }
    }

    pub fn entries(&self) -> &[ParamEntry] {
        &self.entries
    }

    // ── Store conversion ──────────────────────────────────────────────────

    pub fn to_table(&self) -> PvsResult<Table> {
        let mut t = Table::with_capacity(COLUMNS, self.entries.len());
        for e in &self.entries {
            t.push_row(vec![
                Value::from(e.name.as_str()),
                Value::from(e.value.as_str()),
                Value::from(e.unit.as_str()),
                Value::from(e.description.as_str()),
                Value::from(e.comments.as_str()),
            ])?;
        }
        Ok(t)
    }

    pub fn from_table(set: &str, table: &Table) -> PvsResult<Self> {
        let idx: Vec<usize> = COLUMNS
            .iter()
            .map(|c| table.column_index(c))
            .collect::<Result<_, _>>()?;
        let text = |row: &[Value], i: usize| match &row[idx[i]] {
            Value::Null => String::new(),
            v => v.to_string(),
        };
        let entries = table
            .rows()
            .iter()
            .map(|row| ParamEntry {
                name:        text(row, 0),
                value:       text(row, 1),
                unit:        text(row, 2),
                description: text(row, 3),
                comments:    text(row, 4),
            })
            .collect();
        Self::from_entries(set, entries)
    }
}

fn raw_value<'a>(entries: &'a [ParamEntry], key: &str) -> &'a str {
    entries
        .iter()
        .find(|e| e.name == key)
        .map(|e| e.value.trim())
        .unwrap_or_default()
}
