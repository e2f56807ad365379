//! Cell values and column-named tables.

use std::cmp::Ordering;
use std::fmt;

use crate::{StoreError, StoreResult};

// ── Value ─────────────────────────────────────────────────────────────────────

/// A single cell.
///
/// `IntList` carries node paths (`path` columns); backends without an array
/// type store it as `{1,2,3}` text.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    IntList(Vec<i64>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null       => "null",
            Value::Int(_)     => "integer",
            Value::Float(_)   => "float",
            Value::Text(_)    => "text",
            Value::IntList(_) => "integer list",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Numeric view; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Int(v)   => Some(v as f64),
            Value::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int_list(&self) -> Option<&[i64]> {
        match self {
            Value::IntList(v) => Some(v),
            _ => None,
        }
    }

    /// Total order used by filters and sorting: nulls last, numbers compared
    /// numerically across `Int`/`Float`.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::IntList(a), Value::IntList(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => a.kind().cmp(b.kind()),
            },
        }
    }

    /// SQL-style equality: null never equals anything.
    pub fn sql_eq(&self, other: &Value) -> bool {
        !self.is_null() && !other.is_null() && self.total_cmp(other) == Ordering::Equal
    }

    /// Render an integer list as `{1,2,3}`.
    pub fn format_int_list(list: &[i64]) -> String {
        let inner: Vec<String> = list.iter().map(i64::to_string).collect();
        format!("{{{}}}", inner.join(","))
    }

    /// Parse `{1,2,3}` (or `[1,2,3]`) into an integer list.
    pub fn parse_int_list(text: &str) -> Option<Vec<i64>> {
        let t = text.trim();
        let inner = t
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .or_else(|| t.strip_prefix('[').and_then(|s| s.strip_suffix(']')))?;
        if inner.trim().is_empty() {
            return Some(Vec::new());
        }
        inner.split(',').map(|p| p.trim().parse::<i64>().ok()).collect()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null       => f.write_str("NULL"),
            Value::Int(v)     => write!(f, "{v}"),
            Value::Float(v)   => write!(f, "{v}"),
            Value::Text(s)    => f.write_str(s),
            Value::IntList(l) => f.write_str(&Value::format_int_list(l)),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self { Value::Int(v) }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self { Value::Float(v) }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self { Value::Float(v as f64) }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self { Value::Text(v.to_owned()) }
}

impl From<String> for Value {
    fn from(v: String) -> Self { Value::Text(v) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// ── Table ─────────────────────────────────────────────────────────────────────

/// Row-major table with named columns.
///
/// Every row has exactly `columns().len()` cells; [`push_row`](Self::push_row)
/// enforces it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows:    Vec<Vec<Value>>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self { columns: columns.into_iter().map(Into::into).collect(), rows: Vec::new() }
    }

    pub fn with_capacity<S: Into<String>>(columns: impl IntoIterator<Item = S>, rows: usize) -> Self {
        let mut t = Self::new(columns);
        t.rows.reserve(rows);
        t
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<Value>> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn column_index(&self, name: &str) -> StoreResult<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| StoreError::MissingColumn(name.to_owned()))
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> StoreResult<()> {
        if row.len() != self.columns.len() {
            return Err(StoreError::Arity { expected: self.columns.len(), got: row.len() });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Cells of column `name`, in row order.
    pub fn column(&self, name: &str) -> StoreResult<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(move |r| &r[idx]))
    }

    /// New table with only `names`, in the given order.
    pub fn project(&self, names: &[&str]) -> StoreResult<Table> {
        let idx: Vec<usize> = names
            .iter()
            .map(|n| self.column_index(n))
            .collect::<StoreResult<_>>()?;
        Ok(Table {
            columns: names.iter().map(|n| (*n).to_owned()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| idx.iter().map(|&i| r[i].clone()).collect())
                .collect(),
        })
    }

    /// Name of the first column that contains a null, if any.
    pub fn first_null_column(&self) -> Option<&str> {
        (0..self.columns.len())
            .find(|&i| self.rows.iter().any(|r| r[i].is_null()))
            .map(|i| self.columns[i].as_str())
    }

    /// `true` if two rows share the same values in `names`.
    pub fn has_duplicates(&self, names: &[&str]) -> StoreResult<bool> {
        let idx: Vec<usize> = names
            .iter()
            .map(|n| self.column_index(n))
            .collect::<StoreResult<_>>()?;
        let mut keys: Vec<Vec<&Value>> = self
            .rows
            .iter()
            .map(|r| idx.iter().map(|&i| &r[i]).collect())
            .collect();
        keys.sort_by(|a, b| cmp_keys(a, b));
        Ok(keys.windows(2).any(|w| cmp_keys(&w[0], &w[1]) == Ordering::Equal))
    }
}

fn cmp_keys(a: &[&Value], b: &[&Value]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.total_cmp(y))
        .find(|o| *o != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}
