//! SQLite backend (feature `sqlite`).
//!
//! A namespace is not a real SQLite schema: table `t` of namespace `ns` is
//! stored as the single quoted identifier `"ns.t"`.  Integer-list cells are
//! kept as `{1,2,3}` text in columns declared `PATH` so they can be decoded
//! on the way back.

use std::path::Path;

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, params_from_iter};

use crate::{Filter, IfExists, StoreError, StoreResult, Table, TabularStore, Value};

const PATH_DECL: &str = "PATH";

/// [`TabularStore`] backed by a single SQLite database file.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;",
        )?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self { conn: Connection::open_in_memory()? })
    }

    /// `(name, declared type)` of every column, or `NotFound`.
    fn table_info(&self, namespace: &str, table: &str) -> StoreResult<Vec<(String, String)>> {
        let sql = format!("PRAGMA table_info({})", quote(&physical(namespace, table)));
        let mut stmt = self.conn.prepare(&sql)?;
        let info = stmt
            .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        if info.is_empty() {
            return Err(StoreError::NotFound {
                namespace: namespace.to_owned(),
                table: table.to_owned(),
            });
        }
        Ok(info)
    }

    fn all_tables(&self) -> StoreResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn physical(namespace: &str, table: &str) -> String {
    format!("{namespace}.{table}")
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn to_sql(v: &Value) -> SqlValue {
    match v {
        Value::Null       => SqlValue::Null,
        Value::Int(i)     => SqlValue::Integer(*i),
        Value::Float(f)   => SqlValue::Real(*f),
        Value::Text(s)    => SqlValue::Text(s.clone()),
        Value::IntList(l) => SqlValue::Text(Value::format_int_list(l)),
    }
}

/// Declared SQL type of a column, from the first non-null cell that decides it.
fn column_decl(data: &Table, idx: usize) -> &'static str {
    let mut decl = "TEXT";
    for row in data.rows() {
        match row[idx] {
            Value::Float(_)   => return "REAL",
            Value::IntList(_) => return PATH_DECL,
            Value::Text(_)    => return "TEXT",
            Value::Int(_)     => decl = "INTEGER",
            Value::Null       => {}
        }
    }
    decl
}

/// Append the SQL for `filter` to `sql`, pushing bound parameters.
fn render_filter(filter: &Filter, sql: &mut String, params: &mut Vec<SqlValue>) {
    match filter {
        Filter::All => sql.push('1'),
        Filter::Eq(_, Value::Null) => sql.push('0'),
        Filter::Eq(c, v) => {
            sql.push_str(&format!("{} = ?", quote(c)));
            params.push(to_sql(v));
        }
        Filter::In(_, vs) if vs.is_empty() => sql.push('0'),
        Filter::In(c, vs) => {
            let marks = vec!["?"; vs.len()].join(", ");
            sql.push_str(&format!("{} IN ({marks})", quote(c)));
            params.extend(vs.iter().map(to_sql));
        }
        Filter::ColumnsDiffer(a, b) => sql.push_str(&format!("{} <> {}", quote(a), quote(b))),
        Filter::And(fs) | Filter::Or(fs) if fs.is_empty() => {
            sql.push(if matches!(filter, Filter::And(_)) { '1' } else { '0' });
        }
        Filter::And(fs) | Filter::Or(fs) => {
            let op = if matches!(filter, Filter::And(_)) { " AND " } else { " OR " };
            sql.push('(');
            for (i, f) in fs.iter().enumerate() {
                if i > 0 {
                    sql.push_str(op);
                }
                render_filter(f, sql, params);
            }
            sql.push(')');
        }
    }
}

fn from_sql(cell: ValueRef<'_>, column: &str, is_path: bool) -> StoreResult<Value> {
    Ok(match cell {
        ValueRef::Null       => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f)    => Value::Float(f),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            if is_path {
                Value::IntList(Value::parse_int_list(&text).ok_or_else(|| StoreError::Type {
                    column: column.to_owned(),
                    expected: "integer list",
                    found: "text",
                })?)
            } else {
                Value::Text(text.into_owned())
            }
        }
        ValueRef::Blob(_) => {
            return Err(StoreError::Type {
                column: column.to_owned(),
                expected: "scalar",
                found: "blob",
            });
        }
    })
}

// ── TabularStore impl ─────────────────────────────────────────────────────────

impl TabularStore for SqliteStore {
    fn namespace_exists(&self, namespace: &str) -> StoreResult<bool> {
        let prefix = format!("{namespace}.");
        Ok(self.all_tables()?.iter().any(|n| n.starts_with(&prefix)))
    }

    fn exists(&self, namespace: &str, table: &str) -> StoreResult<bool> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [physical(namespace, table)],
            |row| row.get(0),
        )?;
        Ok(n > 0)
    }

    fn columns(&self, namespace: &str, table: &str) -> StoreResult<Vec<String>> {
        Ok(self.table_info(namespace, table)?.into_iter().map(|(name, _)| name).collect())
    }

    fn read(
        &self,
        namespace: &str,
        table: &str,
        columns: Option<&[&str]>,
        filter: &Filter,
    ) -> StoreResult<Table> {
        let info = self.table_info(namespace, table)?;
        let selected: Vec<(String, bool)> = match columns {
            Some(names) => names
                .iter()
                .map(|n| {
                    info.iter()
                        .find(|(c, _)| c == n)
                        .map(|(c, decl)| (c.clone(), decl == PATH_DECL))
                        .ok_or_else(|| StoreError::MissingColumn((*n).to_owned()))
                })
                .collect::<StoreResult<_>>()?,
            None => info.iter().map(|(c, decl)| (c.clone(), decl == PATH_DECL)).collect(),
        };
        for c in filter.referenced_columns() {
            if !info.iter().any(|(name, _)| name == c) {
                return Err(StoreError::MissingColumn(c.to_owned()));
            }
        }

        let select_list: Vec<String> = selected.iter().map(|(c, _)| quote(c)).collect();
        let mut sql = format!(
            "SELECT {} FROM {} WHERE ",
            select_list.join(", "),
            quote(&physical(namespace, table)),
        );
        let mut params = Vec::new();
        render_filter(filter, &mut sql, &mut params);
        log::debug!("{sql}");

        let mut out = Table::new(selected.iter().map(|(c, _)| c.clone()));
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(selected.len());
            for (i, (name, is_path)) in selected.iter().enumerate() {
                cells.push(from_sql(row.get_ref(i)?, name, *is_path)?);
            }
            out.push_row(cells)?;
        }
        Ok(out)
    }

    fn write(&mut self, namespace: &str, table: &str, data: &Table, mode: IfExists) -> StoreResult<()> {
        if mode == IfExists::Fail && self.exists(namespace, table)? {
            return Err(StoreError::AlreadyExists {
                namespace: namespace.to_owned(),
                table: table.to_owned(),
            });
        }
        if data.is_empty() {
            return Err(StoreError::Empty(physical(namespace, table)));
        }

        let name = quote(&physical(namespace, table));
        let defs: Vec<String> = data
            .columns()
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{} {}", quote(c), column_decl(data, i)))
            .collect();
        let cols: Vec<String> = data.columns().iter().map(|c| quote(c)).collect();
        let marks = vec!["?"; cols.len()].join(", ");

        // Drop, create and fill in one transaction so readers never observe a
        // half-written table.
        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {name};
             CREATE TABLE {name} ({});",
            defs.join(", "),
        ))?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {name} ({}) VALUES ({marks})",
                cols.join(", "),
            ))?;
            for row in data.rows() {
                stmt.execute(params_from_iter(row.iter().map(to_sql)))?;
            }
        }
        tx.commit()?;
        log::debug!("wrote {} rows to {name}", data.len());
        Ok(())
    }

    fn add_unique_constraint(&mut self, namespace: &str, table: &str, columns: &[&str]) -> StoreResult<()> {
        let info = self.table_info(namespace, table)?;
        for c in columns {
            if !info.iter().any(|(name, _)| name == c) {
                return Err(StoreError::MissingColumn((*c).to_owned()));
            }
        }
        let name = quote(&physical(namespace, table));
        let cols: Vec<String> = columns.iter().map(|c| quote(c)).collect();
        let cols = cols.join(", ");

        let duplicates: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM (SELECT 1 FROM {name} GROUP BY {cols} HAVING COUNT(*) > 1)"),
            [],
            |row| row.get(0),
        )?;
        if duplicates > 0 {
            return Err(StoreError::UniqueViolation {
                table: physical(namespace, table),
                columns: columns.join(", "),
            });
        }

        let index = quote(&format!("{}_{}_key", physical(namespace, table), columns.join("_")));
        self.conn
            .execute_batch(&format!("CREATE UNIQUE INDEX IF NOT EXISTS {index} ON {name} ({cols});"))?;
        Ok(())
    }

    fn list_tables(&self, namespace: &str, prefix: &str) -> StoreResult<Vec<String>> {
        let full = format!("{namespace}.{prefix}");
        let strip = namespace.len() + 1;
        Ok(self
            .all_tables()?
            .into_iter()
            .filter(|n| n.starts_with(&full))
            .map(|n| n[strip..].to_owned())
            .collect())
    }
}
