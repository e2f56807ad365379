//! Unit tests for tn-results.

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::Cursor;

    use tn_analysis::baseline::save_baseline;
    use tn_analysis::od::save_zones;
    use tn_analysis::{
        EdgeListBuilder, NetworkLink, NoopObserver, ShortestPathEngine, StoreBaseline, ZoneRecord, save_edgelist,
        save_network, save_optimisation,
    };
    use tn_core::{AnalysisConfig, BaselineRow, Edge, EdgeType, Mode, NetworkLevel, NodeId};
    use tn_pvs::{ImpactTable, TimeFunctionRegistry, load_impacts_reader, load_travel_time_reader, save_impact_set};
    use tn_store::{IfExists, MemoryStore};

    /// Lower 60 km/h, main 120 km/h, higher 60 km/h plus interface time.
    pub const TRAVEL_TIME_CSV: &str = "\
name;value;unit;description;comments
tf_name;constant_speed;-;time function;
l_ff;1.0;-;;
m_ff;1.0;-;;
h_ff;1.0;-;;
l_a_it;0;min;;
l_b_it;0;min;;
m_a_it;0;min;;
m_b_it;0;min;;
h_a_it;0.5;min;;
h_b_it;0.5;min;;
l_aa;1;m/s2;;
l_ad;-1;m/s2;;
m_aa;1;m/s2;;
m_ad;-1;m/s2;;
h_aa;1;m/s2;;
h_ad;-1;m/s2;;
l_ts;60;km/h;;
m_ts;120;km/h;;
h_ts;60;km/h;;
";

    /// PT steps at 5 km (2.0 per km) and falls back to 1.0 beyond.
    pub const CO2_CSV: &str = "\
type;max_distance;impact_type;impact_value;impact_unit;motorization;load_percent;description;comments;sources
IMT;-;CO2;0.2;kg/pkm;average;-;car;;mobitool
PT;5;CO2;2.0;kg/pkm;average;-;urban;;mobitool
PT;-;CO2;1.0;kg/pkm;average;-;intercity;;mobitool
NTS-lower;-;CO2;0.05;kg/pkm;electric;80;lower;;estimate
NTS-main;-;CO2;0.04;kg/pkm;electric;80;main;;estimate
NTS-higher;-;CO2;0.03;kg/pkm;electric;80;higher;;estimate
";

    pub const EP_CSV: &str = "\
type;max_distance;impact_type;impact_value;impact_unit;motorization;load_percent;description;comments;sources
IMT;-;EP;2.5;MJ/pkm;average;-;car;;mobitool
PT;-;EP;0.9;MJ/pkm;average;-;rail;;mobitool
NTS-lower;-;EP;0.3;MJ/pkm;electric;80;lower;;estimate
NTS-main;-;EP;0.25;MJ/pkm;electric;80;main;;estimate
NTS-higher;-;EP;0.2;MJ/pkm;electric;80;higher;;estimate
";

    pub fn n(id: i16) -> NodeId {
        NodeId(id)
    }

    pub fn impacts(name: &str, csv: &str) -> ImpactTable {
        load_impacts_reader(Cursor::new(csv.to_owned()), name, name).unwrap()
    }

    pub fn config() -> AnalysisConfig {
        AnalysisConfig {
            network_number: 1,
            pvs_number:     1,
            extension:      Mode::Imt,
            nptm_schema:    "nptm".to_owned(),
            zones_table:    "zones".to_owned(),
            imt_table:      "od_imt".to_owned(),
            pt_table:       "od_pt".to_owned(),
            network_schema: "networks".to_owned(),
            pvs_schema:     "physical_values".to_owned(),
            database:       None,
        }
    }

    pub fn edge(from: i16, to: i16, edge_type: EdgeType, time: f32, length: f32) -> Edge {
        Edge { from: n(from), to: n(to), edge_type, time, length }
    }

    fn row(mode: Mode, from: i16, to: i16, time: f32, length: f32) -> BaselineRow {
        BaselineRow {
            from:      n(from),
            to:        n(to),
            edge_type: mode.edge_type(),
            time:      Some(time),
            length:    Some(length),
            path:      vec![n(from), n(to)],
        }
    }

    fn links() -> Vec<NetworkLink> {
        let link = |a, b, level, length_m| NetworkLink { id_a: n(a), id_b: n(b), level, length_m };
        vec![
            link(1, 2, NetworkLevel::Lower, 2_000.0),
            link(2, 3, NetworkLevel::Main, 6_000.0),
            link(3, 20_001, NetworkLevel::Higher, 1_000.0),
        ]
    }

    /// Baseline, zones and network of configuration [`config`], without
    /// any result table.
    pub fn base_store(config: &AnalysisConfig) -> MemoryStore {
        let mut store = MemoryStore::new();
        let m = Mode::Imt;
        let mut imt = vec![row(m, 1, 1, 0.0, 0.0), row(m, 1, 2, 1.5, 2.2), row(m, 2, 1, 2.0, 2.2), row(m, 4, 5, 3.0, 3.0)];
        for (a, b, t, l) in [(1, 3, 10.0, 8.0), (1, 4, 4.0, 4.0), (2, 3, 5.0, 6.0), (2, 4, 7.0, 7.0), (3, 4, 9.0, 9.0)] {
            imt.push(row(m, a, b, t, l));
            imt.push(row(m, b, a, t, l));
        }
        let pt = vec![row(Mode::Pt, 1, 2, 30.0, 3.0), row(Mode::Pt, 2, 1, 30.0, 3.0)];
        save_baseline(&mut store, &config.nptm_schema, &config.imt_table, &imt, IfExists::Fail).unwrap();
        save_baseline(&mut store, &config.nptm_schema, &config.pt_table, &pt, IfExists::Fail).unwrap();

        let zones: Vec<ZoneRecord> = (1..=5).map(|id| ZoneRecord { id, nptmid: 100 + id }).collect();
        save_zones(&mut store, &config.nptm_schema, &config.zones_table, &zones, IfExists::Fail).unwrap();
        save_network(&mut store, &config.network_schema, &config.network_table(), &links(), IfExists::Fail).unwrap();
        store
    }

    /// [`base_store`] plus the persisted edge list (no impact columns),
    /// the optimisation, and the CO2 impact set.
    pub fn pipeline_store(config: &AnalysisConfig) -> MemoryStore {
        let mut store = base_store(config);
        let tt = load_travel_time_reader(Cursor::new(TRAVEL_TIME_CSV), "tt").unwrap();
        let registry = TimeFunctionRegistry::with_builtins();
        let (edges, optimisation) = {
            let baseline = StoreBaseline::from_config(&store, config);
            let (edges, _) = EdgeListBuilder::new(&tt, &registry, config.extension).build(&links(), &baseline).unwrap();
            let optimisation = ShortestPathEngine::default()
                .compute_all_pairs(&edges, &baseline, config.extension, &NoopObserver)
                .unwrap();
            (edges, optimisation)
        };
        let schema = config.results_schema();
        save_edgelist(&mut store, &schema, &edges, IfExists::Fail).unwrap();
        save_optimisation(&mut store, &schema, &optimisation, IfExists::Fail).unwrap();
        save_impact_set(&mut store, &config.pvs_schema, 1, &impacts("CO2", CO2_CSV), IfExists::Fail).unwrap();
        store
    }

    pub fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }
}

// ── Impact aggregation ────────────────────────────────────────────────────────

#[cfg(test)]
mod impacts {
    use tn_analysis::EdgeList;
    use tn_core::{EdgeType, PathRecord};

    use super::fixtures::{CO2_CSV, close, edge, impacts, n};
    use crate::{ImpactAggregator, ResultsError};

    fn co2() -> ImpactAggregator {
        ImpactAggregator::new([impacts("CO2", CO2_CSV)])
    }

    #[test]
    fn forward_match_then_fallback() {
        let edges = [edge(1, 2, EdgeType::Pt, 1.0, 3.0), edge(2, 3, EdgeType::Pt, 1.0, 10.0)];
        let values = co2().edge_values("CO2", &edges).unwrap();
        assert_eq!(values, vec![6.0, 10.0]);
    }

    #[test]
    fn single_row_type_is_flat() {
        let edges = [edge(1, 2, EdgeType::Imt, 1.0, 1.0), edge(2, 3, EdgeType::Imt, 1.0, 100.0)];
        let values = co2().edge_values("CO2", &edges).unwrap();
        assert!(close(values[0], 0.2));
        assert!(close(values[1], 20.0));
    }

    #[test]
    fn type_without_breakpoints_raises() {
        let edges = [edge(1, 2, EdgeType::Imt, 1.0, 1.0), edge(2, 3, EdgeType::WithNts, 1.0, 1.0)];
        match co2().edge_values("CO2", &edges) {
            Err(ResultsError::MissingImpactType { impact, edge_type }) => {
                assert_eq!(impact, "CO2");
                assert_eq!(edge_type, EdgeType::WithNts);
            }
            other => panic!("expected a missing type, got {other:?}"),
        }
    }

    #[test]
    fn unloaded_impact_is_precondition() {
        let edges = [edge(1, 2, EdgeType::Imt, 1.0, 1.0)];
        assert!(matches!(co2().edge_values("EP", &edges), Err(ResultsError::Precondition(_))));
    }

    fn abc() -> EdgeList {
        let mut list = EdgeList::new(vec![
            edge(1, 2, EdgeType::NtsMain, 1.0, 1.5),
            edge(2, 3, EdgeType::Imt, 2.0, 2.5),
        ]);
        list.set_impact("CO2", vec![2.0, 3.0]).unwrap();
        list
    }

    #[test]
    fn path_totals_sum_segments() {
        let path = PathRecord::from_path(EdgeType::WithNts, 3.0, vec![n(1), n(2), n(3)]).unwrap();
        let out = co2().aggregate_paths(&[path], &abc(), &["CO2".to_owned()]).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].impacts, vec![5.0]);
        assert_eq!(out[0].length, 4.0);
        assert_eq!(out[0].record.nb_edges, 2);
    }

    #[test]
    fn dangling_segment_raises() {
        let path = PathRecord::from_path(EdgeType::WithNts, 3.0, vec![n(1), n(3)]).unwrap();
        let err = co2().aggregate_paths(&[path], &abc(), &["CO2".to_owned()]).unwrap_err();
        assert!(matches!(err, ResultsError::Inconsistency(_)));
    }

    #[test]
    fn missing_edge_column_is_precondition() {
        let path = PathRecord::from_path(EdgeType::WithNts, 3.0, vec![n(1), n(2)]).unwrap();
        let err = co2().aggregate_paths(&[path], &abc(), &["EP".to_owned()]).unwrap_err();
        assert!(matches!(err, ResultsError::Precondition(_)));
    }

    #[test]
    fn applied_columns_replace_previous_values() {
        let mut list = abc();
        co2().apply_to_edges(&mut list, &["CO2".to_owned()]).unwrap();
        let values = list.impact("CO2").unwrap();
        assert!(close(values[0], 0.06));
        assert!(close(values[1], 0.5));
    }
}

// ── Update plans ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod plan {
    use crate::{ResultsError, UpdatePlan};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn new_set_is_the_only_update() {
        let plan = UpdatePlan::compute(names(&["CO2", "EP"]), names(&["CO2"]), false).unwrap();
        assert_eq!(plan.current, names(&["CO2"]));
        assert_eq!(plan.missing, names(&["EP"]));
        assert_eq!(plan.update, names(&["EP"]));
        assert!(plan.inconsistent.is_empty());
    }

    #[test]
    fn nothing_to_do() {
        let plan = UpdatePlan::compute(names(&["CO2"]), names(&["CO2"]), false).unwrap();
        assert!(!plan.needs_update());
    }

    #[test]
    fn unbacked_column_needs_force() {
        match UpdatePlan::compute(names(&["CO2"]), names(&["CO2", "TCO"]), false) {
            Err(ResultsError::InconsistentImpacts { impacts }) => assert_eq!(impacts, names(&["TCO"])),
            other => panic!("expected inconsistent impacts, got {other:?}"),
        }
        let forced = UpdatePlan::compute(names(&["CO2"]), names(&["CO2", "TCO"]), true).unwrap();
        assert_eq!(forced.inconsistent, names(&["TCO"]));
        assert_eq!(forced.update, names(&["CO2"]));
    }

    #[test]
    fn no_available_set() {
        let err = UpdatePlan::compute(Vec::new(), names(&["CO2"]), false).unwrap_err();
        assert!(matches!(err, ResultsError::Precondition(_)));
    }
}

// ── ConsistencyManager ────────────────────────────────────────────────────────

#[cfg(test)]
mod consistency {
    use tn_analysis::{EdgeList, edgelist_columns, load_edgelist, save_edgelist};
    use tn_core::EdgeType;
    use tn_pvs::save_impact_set;
    use tn_store::{Filter, IfExists, MemoryStore, TabularStore};

    use super::fixtures::{EP_CSV, base_store, close, config, impacts, n, pipeline_store};
    use crate::{AlwaysConfirm, ConsistencyManager, NetworkState, ReplaceOutcome, ResultsError, ZoneOutcome, ZoneState};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn add_ep(store: &mut MemoryStore) {
        let cfg = config();
        save_impact_set(store, &cfg.pvs_schema, 1, &impacts("EP", EP_CSV), IfExists::Fail).unwrap();
    }

    #[test]
    fn added_set_extends_edge_list_once() {
        let cfg = config();
        let mut store = pipeline_store(&cfg);
        let mut manager = ConsistencyManager::new(&mut store, &cfg);

        let first = manager.update_edgelist(false).unwrap();
        assert_eq!(first.current, names(&["CO2"]));
        assert_eq!(manager.edgelist_writes(), 1);
        drop(manager);

        add_ep(&mut store);
        let mut manager = ConsistencyManager::new(&mut store, &cfg);
        let plan = manager.determine_update_plan(false).unwrap();
        assert_eq!(plan.update, names(&["EP"]));
        let applied = manager.apply_update_plan(&plan).unwrap();
        assert_eq!(applied.current, names(&["CO2", "EP"]));

        let again = manager.determine_update_plan(false).unwrap();
        assert!(again.update.is_empty());
        manager.apply_update_plan(&again).unwrap();
        assert_eq!(manager.edgelist_writes(), 1);
        drop(manager);

        let columns = edgelist_columns(&store, &cfg.results_schema()).unwrap();
        assert_eq!(columns, names(&["from", "to", "type", "time", "length", "CO2", "EP"]));
    }

    #[test]
    fn unbacked_edge_list_column() {
        let cfg = config();
        let mut store = pipeline_store(&cfg);
        let schema = cfg.results_schema();
        let mut list: EdgeList = load_edgelist(&store, &schema, None, &Filter::All).unwrap();
        list.set_impact("TCO", vec![1.0; list.len()]).unwrap();
        save_edgelist(&mut store, &schema, &list, IfExists::Replace).unwrap();

        let mut manager = ConsistencyManager::new(&mut store, &cfg);
        assert!(matches!(manager.determine_update_plan(false), Err(ResultsError::InconsistentImpacts { .. })));
        assert!(matches!(manager.prepare_zone_snapshot(n(1)), Err(ResultsError::InconsistentImpacts { .. })));

        let applied = manager.update_edgelist(true).unwrap();
        assert_eq!(applied.current, names(&["CO2"]));
        drop(manager);
        let columns = edgelist_columns(&store, &schema).unwrap();
        assert!(!columns.iter().any(|c| c == "TCO"));
    }

    #[test]
    fn plan_requires_optimisation() {
        let cfg = config();
        let mut store = base_store(&cfg);
        let manager = ConsistencyManager::new(&mut store, &cfg);
        assert!(matches!(manager.determine_update_plan(false), Err(ResultsError::Precondition(_))));
    }

    #[test]
    fn snapshot_computed_once() {
        let cfg = config();
        let mut store = pipeline_store(&cfg);
        let mut manager = ConsistencyManager::new(&mut store, &cfg);

        assert_eq!(manager.zone_state(n(1)).unwrap(), ZoneState::Missing);
        assert_eq!(manager.prepare_zone_snapshot(n(1)).unwrap(), ZoneOutcome::Created);
        assert_eq!(manager.recomputations(), 1);
        assert_eq!(manager.prepare_zone_snapshot(n(1)).unwrap(), ZoneOutcome::UpToDate);
        assert_eq!(manager.recomputations(), 1);
        assert_eq!(manager.zone_state(n(1)).unwrap(), ZoneState::Current);
        assert_eq!(manager.bound_zone(), Some(n(1)));
        drop(manager);

        add_ep(&mut store);
        let mut manager = ConsistencyManager::new(&mut store, &cfg);
        assert_eq!(manager.zone_state(n(1)).unwrap(), ZoneState::Stale);
        assert_eq!(manager.prepare_zone_snapshot(n(1)).unwrap(), ZoneOutcome::Replaced);
        assert_eq!(manager.recomputations(), 1);
        drop(manager);

        let columns = store.columns(&cfg.results_schema(), "results_1").unwrap();
        assert_eq!(
            columns,
            names(&["from", "to", "type", "time", "length", "CO2", "EP", "nb_edges", "path"])
        );
    }

    #[test]
    fn snapshot_composition() {
        let cfg = config();
        let mut store = pipeline_store(&cfg);
        let mut manager = ConsistencyManager::new(&mut store, &cfg);
        let plan = manager.update_edgelist(false).unwrap();
        let snapshot = manager.compute_snapshot(n(1), &plan.current).unwrap();

        let keys: Vec<(i16, i16, EdgeType)> = snapshot.rows.iter().map(|r| (r.from.0, r.to.0, r.edge_type)).collect();
        use EdgeType::{ExtendNts, Imt, Pt, WithNts};
        assert_eq!(
            keys,
            vec![
                (1, 1, Imt),
                (1, 1, ExtendNts),
                (1, 2, Imt),
                (1, 2, Pt),
                (1, 2, ExtendNts),
                (1, 3, Imt),
                (1, 3, WithNts),
                (1, 4, Imt),
                (1, 4, ExtendNts),
                (2, 1, Imt),
                (2, 1, Pt),
                (2, 1, ExtendNts),
                (3, 1, Imt),
                (3, 1, WithNts),
                (4, 1, Imt),
                (4, 1, ExtendNts),
            ]
        );

        // 1→2 by car (2.2 km at 0.2) then 2→3 on the main level (6 km at 0.04).
        let improved = &snapshot.rows[6];
        assert_eq!(improved.path, vec![n(1), n(2), n(3)]);
        assert_eq!(improved.nb_edges, 2);
        assert!(close(improved.length, 8.2));
        assert!(close(improved.impacts[0], 0.68));

        // 3 km by PT falls under the 5 km breakpoint.
        let pt = &snapshot.rows[3];
        assert_eq!(pt.nb_edges, 1);
        assert!(close(pt.impacts[0], 6.0));
    }

    #[test]
    fn zone_checks() {
        let cfg = config();
        let mut store = pipeline_store(&cfg);
        let mut manager = ConsistencyManager::new(&mut store, &cfg);
        assert!(matches!(
            manager.prepare_zone_snapshot(n(99)),
            Err(ResultsError::InvalidZone { zone, .. }) if zone == n(99)
        ));
        assert_eq!(manager.bound_zone(), None);
        assert!(matches!(manager.prepare_zone_snapshot(n(5)), Err(ResultsError::EmptyResult(_))));
    }

    #[test]
    fn failed_preparation_leaves_manager_unbound() {
        let cfg = config();
        let mut store = pipeline_store(&cfg);
        let mut manager = ConsistencyManager::new(&mut store, &cfg);

        manager.prepare_zone_snapshot(n(1)).unwrap();
        manager.release_zone();
        assert!(manager.prepare_zone_snapshot(n(5)).is_err());
        assert_eq!(manager.bound_zone(), None);

        let outcome = manager.replace_all_impacts(&mut AlwaysConfirm).unwrap();
        assert_eq!(outcome, ReplaceOutcome::Replaced { impacts: names(&["CO2"]), zones: vec![n(1)] });
    }

    #[test]
    fn replace_all_guarded_and_confirmed() {
        let cfg = config();
        let mut store = pipeline_store(&cfg);
        let mut manager = ConsistencyManager::new(&mut store, &cfg);

        assert!(matches!(manager.replace_all_impacts(&mut AlwaysConfirm), Err(ResultsError::Precondition(_))));

        manager.prepare_zone_snapshot(n(1)).unwrap();
        manager.prepare_zone_snapshot(n(3)).unwrap();
        assert!(matches!(manager.replace_all_impacts(&mut AlwaysConfirm), Err(ResultsError::Precondition(_))));
        manager.release_zone();

        let writes = manager.edgelist_writes();
        let mut decline = |_: &str| false;
        assert_eq!(manager.replace_all_impacts(&mut decline).unwrap(), ReplaceOutcome::Cancelled);
        assert_eq!(manager.edgelist_writes(), writes);

        let recomputed = manager.recomputations();
        let outcome = manager.replace_all_impacts(&mut AlwaysConfirm).unwrap();
        assert_eq!(outcome, ReplaceOutcome::Replaced { impacts: names(&["CO2"]), zones: vec![n(1), n(3)] });
        assert_eq!(manager.edgelist_writes(), writes + 1);
        assert_eq!(manager.recomputations(), recomputed + 2);
    }

    #[test]
    fn network_states() {
        let cfg = config();
        let mut empty = MemoryStore::new();
        let manager = ConsistencyManager::new(&mut empty, &cfg);
        assert_eq!(manager.network_state().unwrap(), NetworkState::NoBaseNetwork);

        let mut base = base_store(&cfg);
        let manager = ConsistencyManager::new(&mut base, &cfg);
        assert_eq!(manager.network_state().unwrap(), NetworkState::BaseNetworkReady);

        let mut store = pipeline_store(&cfg);
        let mut manager = ConsistencyManager::new(&mut store, &cfg);
        assert_eq!(manager.network_state().unwrap(), NetworkState::EdgelistStale);
        manager.update_edgelist(false).unwrap();
        assert_eq!(manager.network_state().unwrap(), NetworkState::EdgelistPersisted);
    }
}

// ── Confirmation ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod confirm {
    use std::io::Cursor;

    use crate::{Confirmation, PromptConfirm};

    fn answer(input: &str) -> (bool, String) {
        let mut out = Vec::new();
        let yes = PromptConfirm::new(Cursor::new(input.to_owned()), &mut out).confirm("Proceed?").unwrap();
        (yes, String::from_utf8(out).unwrap())
    }

    #[test]
    fn yes_and_no() {
        assert!(answer("y\n").0);
        assert!(answer(" YES \n").0);
        assert!(!answer("n\n").0);
        assert!(!answer("").0);
        assert_eq!(answer("y\n").1, "Proceed? [y/N] ");
    }
}
