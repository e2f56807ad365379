//! Unit tests for tn-pvs.

#[cfg(test)]
pub(crate) mod fixtures {
    /// A complete travel-time set using `constant_speed`.
    pub const TRAVEL_TIME_CSV: &str = "\
name;value;unit;description;comments
tf_name;constant_speed;-;time function;
l_ff;1.0;-;fractal factor lower;
m_ff;1.2;-;fractal factor main;
h_ff;1.0;-;fractal factor higher;
l_a_it;0.5;min;interface departure lower;
l_b_it;0.5;min;interface arrival lower;
m_a_it;1.0;min;interface departure main;
m_b_it;1.0;min;interface arrival main;
h_a_it;2.0;min;interface departure higher;
h_b_it;2.0;min;interface arrival higher;
l_aa;1.0;m/s2;acceleration lower;
l_ad;-1.0;m/s2;deceleration lower;
m_aa;1.0;m/s2;acceleration main;
m_ad;-1.0;m/s2;deceleration main;
h_aa;0.8;m/s2;acceleration higher;
h_ad;-0.8;m/s2;deceleration higher;
l_ts;60;km/h;top speed lower;
m_ts;120;km/h;top speed main;
h_ts;300;km/h;top speed higher;unused
";

    /// CO2 set with a two-step PT function.
    pub const CO2_CSV: &str = "\
type;max_distance;impact_type;impact_value;impact_unit;motorization;load_percent;description;comments;sources
IMT;-;CO2;0.2;kg/pkm;average;-;car;;mobitool
PT;5;CO2;2.0;kg/pkm;average;-;urban;;mobitool
PT;-;CO2;1.0;kg/pkm;average;-;intercity;;mobitool
NTS-lower;-;CO2;0.05;kg/pkm;electric;80;lower;;estimate
NTS-main;-;CO2;0.04;kg/pkm;electric;80;main;;estimate
NTS-higher;-;CO2;0.03;kg/pkm;electric;80;higher;placeholder;estimate
";
}

// ── Time functions ────────────────────────────────────────────────────────────

#[cfg(test)]
mod time_fn {
    use crate::{PvsError, TimeFunctionRegistry, constant_speed, suarm};

    #[test]
    fn suarm_cruise_and_short_profiles() {
        // 1 km at 50 km/h, 1 m/s² both ways: 85.9 s.
        assert_eq!(suarm(1_000.0, 50.0, 1.0, 1.0), 1.4);
        // 50 m never reaches top speed: 14.1 s.
        assert_eq!(suarm(50.0, 50.0, 1.0, -1.0), 0.2);
    }

    #[test]
    fn deceleration_sign_ignored() {
        assert_eq!(suarm(3_000.0, 120.0, 0.8, 1.1), suarm(3_000.0, 120.0, 0.8, -1.1));
    }

    #[test]
    fn constant_speed_minutes() {
        assert_eq!(constant_speed(1_000.0, 50.0, 0.0, 0.0), 1.2);
    }

    #[test]
    fn registry_rejects_duplicates_and_lists_names() {
        let mut r = TimeFunctionRegistry::with_builtins();
        assert!(matches!(
            r.register("suarm", suarm),
            Err(PvsError::DuplicateTimeFunction(n)) if n == "suarm"
        ));
        fn half(d: f64, _: f64, _: f64, _: f64) -> f64 { d / 2.0 }
        r.register("half", half).unwrap();
        assert_eq!(r.lookup("half").unwrap()(10.0, 0.0, 0.0, 0.0), 5.0);
        match r.lookup("maglev") {
            Err(PvsError::UnknownTimeFunction { available, .. }) => {
                assert_eq!(available, "constant_speed, half, suarm");
            }
            other => panic!("expected UnknownTimeFunction, got {other:?}"),
        }
    }
}

// ── Travel-time sets ──────────────────────────────────────────────────────────

#[cfg(test)]
mod travel_time {
    use std::io::Cursor;

    use tn_core::NetworkLevel;

    use crate::{PvsError, load_travel_time_reader};

    #[test]
    fn loads_all_levels() {
        let set = load_travel_time_reader(Cursor::new(super::fixtures::TRAVEL_TIME_CSV), "tt").unwrap();
        assert_eq!(set.tf_name, "constant_speed");
        let main = set.level(NetworkLevel::Main);
        assert_eq!(main.fractal_factor, 1.2);
        assert_eq!(main.top_speed, 120.0);
        assert_eq!(set.level(NetworkLevel::Higher).a_interface, 2.0);
        assert_eq!(set.entries().len(), 19);
    }

    #[test]
    fn missing_keys_reported_together() {
        let csv: String = super::fixtures::TRAVEL_TIME_CSV
            .lines()
            .filter(|l| !l.starts_with("h_ts") && !l.starts_with("l_ff"))
            .map(|l| format!("{l}\n"))
            .collect();
        match load_travel_time_reader(Cursor::new(csv), "tt") {
            Err(PvsError::MissingKeys { keys, .. }) => assert_eq!(keys, ["l_ff", "h_ts"]),
            other => panic!("expected MissingKeys, got {other:?}"),
        }
    }

    #[test]
    fn degenerate_kinematics_rejected() {
        let csv = super::fixtures::TRAVEL_TIME_CSV
            .replace("l_ts;60", "l_ts;0")
            .replace("m_aa;1.0", "m_aa;0")
            .replace("h_ad;-0.8", "h_ad;0")
            .replace("h_a_it;2.0", "h_a_it;-50");
        match load_travel_time_reader(Cursor::new(csv), "tt") {
            Err(PvsError::OutOfRange { set, names }) => {
                assert_eq!(set, "tt");
                assert_eq!(names, ["l_ts", "m_aa", "h_ad", "h_a_it"]);
            }
            other => panic!("expected OutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn zero_fractal_factor_rejected() {
        let csv = super::fixtures::TRAVEL_TIME_CSV.replace("m_ff;1.2", "m_ff;0");
        assert!(matches!(
            load_travel_time_reader(Cursor::new(csv), "tt"),
            Err(PvsError::OutOfRange { names, .. }) if names == ["m_ff"]
        ));
    }

    #[test]
    fn non_numeric_value_rejected() {
        let csv = super::fixtures::TRAVEL_TIME_CSV.replace("m_ts;120", "m_ts;fast");
        assert!(matches!(
            load_travel_time_reader(Cursor::new(csv), "tt"),
            Err(PvsError::InvalidValue { name, .. }) if name == "m_ts"
        ));
    }

    #[test]
    fn unexpected_column_rejected() {
        let csv = super::fixtures::TRAVEL_TIME_CSV.replacen("comments", "comments;extra", 1);
        assert!(matches!(
            load_travel_time_reader(Cursor::new(csv), "tt"),
            Err(PvsError::UnexpectedColumns { .. })
        ));
    }
}

// ── Impact sets ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod impact {
    use std::io::Cursor;

    use tn_core::EdgeType;

    use crate::{Breakpoints, PvsError, load_impacts_reader};

    fn co2(csv: &str) -> Result<crate::ImpactTable, PvsError> {
        load_impacts_reader(Cursor::new(csv.to_owned()), "CO2", "co2")
    }

    #[test]
    fn ceiling_match_with_fallback() {
        let b = Breakpoints::new(vec![(5.0, 2.0)], 1.0);
        assert_eq!(b.value_per_km(3.0), 2.0);
        assert_eq!(b.value_per_km(5.0), 2.0);
        assert_eq!(b.value_per_km(10.0), 1.0);
    }

    #[test]
    fn multi_step_lookup() {
        let b = Breakpoints::new(vec![(20.0, 0.4), (4.0, 0.55)], 0.3);
        assert_eq!(b.value_per_km(0.1), 0.55);
        assert_eq!(b.value_per_km(4.5), 0.4);
        assert_eq!(b.value_per_km(20.0), 0.4);
        assert_eq!(b.value_per_km(20.5), 0.3);
    }

    #[test]
    fn loaded_table_impacts() {
        let t = co2(super::fixtures::CO2_CSV).unwrap();
        assert_eq!(t.unit(), "kg/pkm");
        assert_eq!(t.edge_impact(EdgeType::Pt, 3.0), Some(6.0));
        assert_eq!(t.edge_impact(EdgeType::Pt, 10.0), Some(10.0));
        assert_eq!(t.edge_impact(EdgeType::Imt, 10.0), Some(2.0));
        assert_eq!(t.edge_impact(EdgeType::WithNts, 1.0), None);
        // Sorted by type code, null breakpoint last.
        let pt: Vec<_> = t.rows().iter().filter(|r| r.edge_type == EdgeType::Pt).collect();
        assert_eq!(pt[0].max_distance, Some(5.0));
        assert_eq!(pt[1].max_distance, None);
    }

    #[test]
    fn unknown_impact_name() {
        assert!(matches!(
            load_impacts_reader(Cursor::new(super::fixtures::CO2_CSV), "NOx", "x"),
            Err(PvsError::UnknownImpact(_))
        ));
    }

    #[test]
    fn missing_required_type() {
        let csv: String = super::fixtures::CO2_CSV
            .lines()
            .filter(|l| !l.starts_with("NTS-main"))
            .map(|l| format!("{l}\n"))
            .collect();
        assert!(matches!(co2(&csv), Err(PvsError::InvalidImpactTable { reason, .. }) if reason.contains("NTS-main")));
    }

    #[test]
    fn two_fallback_rows_rejected() {
        let csv = super::fixtures::CO2_CSV.replace("PT;5;", "PT;-;");
        assert!(matches!(co2(&csv), Err(PvsError::InvalidImpactTable { .. })));
    }

    #[test]
    fn single_row_needs_null_breakpoint() {
        let csv = super::fixtures::CO2_CSV.replace("IMT;-;", "IMT;50;");
        assert!(matches!(co2(&csv), Err(PvsError::InvalidImpactTable { .. })));
    }

    #[test]
    fn mismatched_unit_and_type() {
        let csv = super::fixtures::CO2_CSV.replace("0.2;kg/pkm", "0.2;g/pkm");
        assert!(matches!(co2(&csv), Err(PvsError::InvalidImpactTable { .. })));
        let csv = super::fixtures::CO2_CSV.replace("IMT;-;CO2", "IMT;-;EP");
        assert!(matches!(co2(&csv), Err(PvsError::InvalidImpactTable { .. })));
    }

    #[test]
    fn duplicate_type_value_rejected() {
        let csv = super::fixtures::CO2_CSV.replace("PT;-;CO2;1.0", "PT;-;CO2;2.0");
        assert!(matches!(co2(&csv), Err(PvsError::InvalidImpactTable { .. })));
    }

    #[test]
    fn null_impact_value_rejected() {
        let csv = super::fixtures::CO2_CSV.replace("IMT;-;CO2;0.2", "IMT;-;CO2;-");
        assert!(matches!(co2(&csv), Err(PvsError::InvalidImpactTable { .. })));
    }
}

// ── Store round trip ──────────────────────────────────────────────────────────

#[cfg(test)]
mod provider {
    use std::io::Cursor;

    use tn_store::{IfExists, MemoryStore, StoreError};

    use crate::{
        PvsError, PvsProvider, StorePvsProvider, load_impacts_reader, load_travel_time_reader,
        save_impact_set, save_travel_time_set,
    };

    #[test]
    fn saved_sets_load_back() {
        let mut store = MemoryStore::new();
        let tt = load_travel_time_reader(Cursor::new(super::fixtures::TRAVEL_TIME_CSV), "tt").unwrap();
        let co2 = load_impacts_reader(Cursor::new(super::fixtures::CO2_CSV), "CO2", "co2").unwrap();
        save_travel_time_set(&mut store, "physical_values", 1, &tt, IfExists::Fail).unwrap();
        save_impact_set(&mut store, "physical_values", 1, &co2, IfExists::Fail).unwrap();

        let p = StorePvsProvider::new(&store, "physical_values");
        assert_eq!(p.available_impacts(1).unwrap(), ["CO2"]);
        assert!(p.available_impacts(2).unwrap().is_empty());
        let back = p.load_travel_time_set(1).unwrap();
        assert_eq!(back.entries(), tt.entries());
        let back = p.load_impact_set("CO2", 1).unwrap();
        assert_eq!(back.rows(), co2.rows());
    }

    #[test]
    fn absent_set_names_table() {
        let store = MemoryStore::new();
        let p = StorePvsProvider::new(&store, "physical_values");
        assert!(matches!(
            p.load_impact_set("EP", 3),
            Err(PvsError::SetNotFound { table, .. }) if table == "impacts_EP_3"
        ));
    }

    #[test]
    fn save_fails_on_existing_set() {
        let mut store = MemoryStore::new();
        let tt = load_travel_time_reader(Cursor::new(super::fixtures::TRAVEL_TIME_CSV), "tt").unwrap();
        save_travel_time_set(&mut store, "pv", 1, &tt, IfExists::Fail).unwrap();
        assert!(matches!(
            save_travel_time_set(&mut store, "pv", 1, &tt, IfExists::Fail),
            Err(PvsError::Store(StoreError::AlreadyExists { .. }))
        ));
    }
}
