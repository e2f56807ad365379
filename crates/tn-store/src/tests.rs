//! Unit tests for tn-store.

#[cfg(test)]
mod helpers {
    use crate::{Table, Value};

    /// Three directed edges with a path column.
    pub fn edges() -> Table {
        let mut t = Table::new(["from", "to", "time", "path"]);
        t.push_row(vec![Value::Int(1), Value::Int(2), Value::Float(3.5), Value::IntList(vec![1, 2])]).unwrap();
        t.push_row(vec![Value::Int(2), Value::Int(1), Value::Float(3.5), Value::IntList(vec![2, 1])]).unwrap();
        t.push_row(vec![Value::Int(2), Value::Int(3), Value::Null, Value::IntList(vec![2, 3])]).unwrap();
        t
    }
}

// ── Table & Value ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod table {
    use crate::{StoreError, Table, Value};

    #[test]
    fn arity_checked() {
        let mut t = Table::new(["a", "b"]);
        assert!(matches!(
            t.push_row(vec![Value::Int(1)]),
            Err(StoreError::Arity { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn projection_reorders() {
        let t = super::helpers::edges();
        let p = t.project(&["to", "from"]).unwrap();
        assert_eq!(p.columns(), ["to", "from"]);
        assert_eq!(p.rows()[0], vec![Value::Int(2), Value::Int(1)]);
        assert!(matches!(t.project(&["nope"]), Err(StoreError::MissingColumn(c)) if c == "nope"));
    }

    #[test]
    fn null_and_duplicate_detection() {
        let t = super::helpers::edges();
        assert_eq!(t.first_null_column(), Some("time"));
        assert!(!t.has_duplicates(&["from", "to"]).unwrap());
        assert!(t.has_duplicates(&["time"]).unwrap());
    }

    #[test]
    fn int_list_text_form() {
        assert_eq!(Value::format_int_list(&[4, 5, 6]), "{4,5,6}");
        assert_eq!(Value::parse_int_list("{4, 5,6}"), Some(vec![4, 5, 6]));
        assert_eq!(Value::parse_int_list("[7]"), Some(vec![7]));
        assert_eq!(Value::parse_int_list("{}"), Some(vec![]));
        assert_eq!(Value::parse_int_list("4,5"), None);
    }

    #[test]
    fn nulls_sort_last_and_never_equal() {
        use std::cmp::Ordering;
        assert_eq!(Value::Null.total_cmp(&Value::Int(1)), Ordering::Greater);
        assert_eq!(Value::Int(2).total_cmp(&Value::Float(2.0)), Ordering::Equal);
        assert!(!Value::Null.sql_eq(&Value::Null));
    }
}

// ── MemoryStore ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod memory {
    use crate::{Filter, IfExists, MemoryStore, StoreError, Table, TabularStore, Value};

    #[test]
    fn write_fail_then_replace() {
        let mut s = MemoryStore::new();
        let t = super::helpers::edges();
        s.write("res", "edgelist", &t, IfExists::Fail).unwrap();
        assert!(matches!(
            s.write("res", "edgelist", &t, IfExists::Fail),
            Err(StoreError::AlreadyExists { .. })
        ));
        let smaller = t.project(&["from", "to"]).unwrap();
        s.write("res", "edgelist", &smaller, IfExists::Replace).unwrap();
        assert_eq!(s.columns("res", "edgelist").unwrap(), ["from", "to"]);
        assert_eq!(s.write_count(), 2);
    }

    #[test]
    fn empty_write_refused() {
        let mut s = MemoryStore::new();
        let empty = Table::new(["from"]);
        assert!(matches!(s.write("a", "b", &empty, IfExists::Replace), Err(StoreError::Empty(_))));
        assert!(!s.exists("a", "b").unwrap());
    }

    #[test]
    fn read_with_filter_and_projection() {
        let mut s = MemoryStore::new();
        s.write("res", "e", &super::helpers::edges(), IfExists::Fail).unwrap();

        let f = Filter::And(vec![
            Filter::Or(vec![Filter::is_in("from", [2i64]), Filter::is_in("to", [2i64])]),
            Filter::columns_differ("from", "to"),
        ]);
        let t = s.read("res", "e", Some(&["to"]), &f).unwrap();
        let to: Vec<_> = t.column("to").unwrap().cloned().collect();
        assert_eq!(to, [Value::Int(2), Value::Int(1), Value::Int(3)]);

        let none = s.read("res", "e", None, &Filter::is_in("from", Vec::<i64>::new())).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn absent_table_and_unknown_filter_column() {
        let mut s = MemoryStore::new();
        assert!(matches!(
            s.read("x", "y", None, &Filter::All),
            Err(StoreError::NotFound { .. })
        ));
        s.write("x", "y", &super::helpers::edges(), IfExists::Fail).unwrap();
        assert!(matches!(
            s.read("x", "y", None, &Filter::eq("type", 1i64)),
            Err(StoreError::MissingColumn(_))
        ));
    }

    #[test]
    fn unique_constraint() {
        let mut s = MemoryStore::new();
        s.write("res", "e", &super::helpers::edges(), IfExists::Fail).unwrap();
        s.add_unique_constraint("res", "e", &["from", "to"]).unwrap();
        assert_eq!(s.unique_constraints("res", "e").unwrap().len(), 1);
        assert!(matches!(
            s.add_unique_constraint("res", "e", &["from"]),
            Err(StoreError::UniqueViolation { .. })
        ));
    }

    #[test]
    fn namespaces_and_listing() {
        let mut s = MemoryStore::new();
        let t = super::helpers::edges();
        for name in ["results_12", "edgelist", "results_3"] {
            s.write("res", name, &t, IfExists::Fail).unwrap();
        }
        assert!(s.namespace_exists("res").unwrap());
        assert!(!s.namespace_exists("other").unwrap());
        assert_eq!(s.list_tables("res", "results_").unwrap(), ["results_12", "results_3"]);
    }
}

// ── SqliteStore ───────────────────────────────────────────────────────────────

#[cfg(all(test, feature = "sqlite"))]
mod sqlite {
    use tempfile::TempDir;

    use crate::{Filter, IfExists, SqliteStore, StoreError, TabularStore, Value};

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    #[test]
    fn round_trip_preserves_types() {
        let dir = tmp();
        let mut s = SqliteStore::open(&dir.path().join("tn.db")).unwrap();
        let t = super::helpers::edges();
        s.write("res", "edgelist", &t, IfExists::Fail).unwrap();

        assert!(s.exists("res", "edgelist").unwrap());
        assert!(s.namespace_exists("res").unwrap());
        let back = s.read("res", "edgelist", None, &Filter::All).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn filter_rendering() {
        let mut s = SqliteStore::open_in_memory().unwrap();
        s.write("res", "e", &super::helpers::edges(), IfExists::Fail).unwrap();
        let f = Filter::And(vec![Filter::eq("from", 2i64), Filter::columns_differ("from", "to")]);
        let t = s.read("res", "e", Some(&["to", "path"]), &f).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.rows()[1], vec![Value::Int(3), Value::IntList(vec![2, 3])]);
        let none = s.read("res", "e", None, &Filter::In("to".into(), vec![])).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn replace_and_constraints() {
        let mut s = SqliteStore::open_in_memory().unwrap();
        let t = super::helpers::edges();
        s.write("res", "e", &t, IfExists::Fail).unwrap();
        assert!(matches!(s.write("res", "e", &t, IfExists::Fail), Err(StoreError::AlreadyExists { .. })));
        s.write("res", "e", &t, IfExists::Replace).unwrap();
        s.add_unique_constraint("res", "e", &["from", "to"]).unwrap();
        assert!(matches!(
            s.add_unique_constraint("res", "e", &["time"]),
            Err(StoreError::UniqueViolation { .. })
        ));
        assert_eq!(s.list_tables("res", "").unwrap(), ["e"]);
    }

    #[test]
    fn missing_table() {
        let s = SqliteStore::open_in_memory().unwrap();
        assert!(matches!(s.columns("a", "b"), Err(StoreError::NotFound { .. })));
    }
}
