//! Row predicates for [`TabularStore::read`](crate::TabularStore::read).
//!
//! Filters are plain data so each backend can evaluate them natively: the
//! in-memory store walks rows, the SQLite store renders a `WHERE` clause.

use crate::{StoreResult, Table, Value};

/// A boolean expression over the columns of one row.
///
/// Comparisons follow SQL semantics: a null cell never matches.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    /// Every row.
    All,
    /// `column = value`
    Eq(String, Value),
    /// `column IN (values…)`; an empty list matches nothing.
    In(String, Vec<Value>),
    /// `left <> right` between two columns of the same row.
    ColumnsDiffer(String, String),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<Value>) -> Filter {
        Filter::Eq(column.to_owned(), value.into())
    }

    pub fn is_in<V: Into<Value>>(column: &str, values: impl IntoIterator<Item = V>) -> Filter {
        Filter::In(column.to_owned(), values.into_iter().map(Into::into).collect())
    }

    pub fn columns_differ(left: &str, right: &str) -> Filter {
        Filter::ColumnsDiffer(left.to_owned(), right.to_owned())
    }

    /// Column names referenced by the filter, with repetitions.
    pub fn referenced_columns(&self) -> Vec<&str> {
        match self {
            Filter::All => Vec::new(),
            Filter::Eq(c, _) | Filter::In(c, _) => vec![c.as_str()],
            Filter::ColumnsDiffer(a, b) => vec![a.as_str(), b.as_str()],
            Filter::And(fs) | Filter::Or(fs) => {
                fs.iter().flat_map(Filter::referenced_columns).collect()
            }
        }
    }

    /// Evaluate against `row`, a row of `table`.
    pub fn matches(&self, table: &Table, row: &[Value]) -> StoreResult<bool> {
        Ok(match self {
            Filter::All => true,
            Filter::Eq(c, v) => row[table.column_index(c)?].sql_eq(v),
            Filter::In(c, vs) => {
                let cell = &row[table.column_index(c)?];
                vs.iter().any(|v| cell.sql_eq(v))
            }
            Filter::ColumnsDiffer(a, b) => {
                let (x, y) = (&row[table.column_index(a)?], &row[table.column_index(b)?]);
                !x.is_null() && !y.is_null() && !x.sql_eq(y)
            }
            Filter::And(fs) => {
                for f in fs {
                    if !f.matches(table, row)? {
                        return Ok(false);
                    }
                }
                true
            }
            Filter::Or(fs) => {
                for f in fs {
                    if f.matches(table, row)? {
                        return Ok(true);
                    }
                }
                false
            }
        })
    }
}
