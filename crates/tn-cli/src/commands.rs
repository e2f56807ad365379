//! One function per subcommand.  Each opens the configured store, runs
//! one pipeline step, and persists its output.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use tn_analysis::baseline::save_baseline;
use tn_analysis::od::{load_od_csv, load_zones_csv, map_legacy_ids, read_zone_mapping, save_zones};
use tn_analysis::{
    EdgeListBuilder, OdOptions, ShortestPathEngine, ShortestPathOptions, StoreBaseline, assemble_baseline,
    complete_od, load_edgelist, load_network_csv, read_network, save_edgelist, save_network, save_optimisation,
};
use tn_core::{AnalysisConfig, Mode, NodeId, RawConfig};
use tn_pvs::{
    PvsProvider, StorePvsProvider, TimeFunctionRegistry, load_impacts_csv, load_travel_time_csv, save_impact_set,
    save_travel_time_set,
};
use tn_results::{AlwaysConfirm, Confirmation, ConsistencyManager, PromptConfirm, ReplaceOutcome, ZoneOutcome};
use tn_store::{Filter, IfExists, SqliteStore};

use crate::progress::BarObserver;

// ── Context ───────────────────────────────────────────────────────────────────

/// Validated configuration and the store it points at.
pub struct Session {
    pub config: AnalysisConfig,
    pub store:  SqliteStore,
}

impl Session {
    pub fn open(config_path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(config_path)
            .with_context(|| format!("reading configuration {}", config_path.display()))?;
        let raw: RawConfig =
            toml::from_str(&text).with_context(|| format!("parsing configuration {}", config_path.display()))?;
        let config = raw.validate()?;
        let Some(database) = config.database.clone() else {
            bail!("`database` is not set in {}", config_path.display());
        };
        let store = SqliteStore::open(&database).with_context(|| format!("opening {}", database.display()))?;
        log::info!("results namespace: {}", config.results_schema());
        Ok(Self { config, store })
    }
}

fn if_exists(replace: bool) -> IfExists {
    if replace { IfExists::Replace } else { IfExists::Fail }
}

// ── Imports ───────────────────────────────────────────────────────────────────

pub fn import_network(session: &mut Session, csv: &Path, replace: bool) -> Result<()> {
    let links = load_network_csv(csv)?;
    let cfg = &session.config;
    save_network(&mut session.store, &cfg.network_schema, &cfg.network_table(), &links, if_exists(replace))?;
    Ok(())
}

pub fn import_zones(session: &mut Session, csv: &Path, replace: bool) -> Result<()> {
    let zones = load_zones_csv(csv)?;
    let cfg = &session.config;
    save_zones(&mut session.store, &cfg.nptm_schema, &cfg.zones_table, &zones, if_exists(replace))?;
    Ok(())
}

pub struct BaselineArgs<'a> {
    pub mode:      Mode,
    pub time:      &'a Path,
    pub length:    &'a Path,
    pub symmetric: bool,
    pub tolerance: f32,
    pub replace:   bool,
}

pub fn import_baseline(session: &mut Session, args: BaselineArgs<'_>) -> Result<()> {
    let cfg = &session.config;
    let mapping = read_zone_mapping(&session.store, &cfg.nptm_schema, &cfg.zones_table)?;
    let mut ids: Vec<NodeId> = mapping.values().copied().collect();
    ids.sort_unstable();
    let options = OdOptions { symmetric: args.symmetric, tolerance: args.tolerance };

    let time = map_legacy_ids("time", &load_od_csv(args.time)?, &mapping);
    let time = complete_od("time", &time, &ids, options)?;
    let length = map_legacy_ids("length", &load_od_csv(args.length)?, &mapping);
    let length = complete_od("length", &length, &ids, options)?;

    let rows = assemble_baseline(args.mode, &time, &length);
    let table = cfg.baseline_table(args.mode);
    save_baseline(&mut session.store, &cfg.nptm_schema, table, &rows, if_exists(args.replace))?;
    Ok(())
}

pub fn import_travel_time(session: &mut Session, csv: &Path, replace: bool) -> Result<()> {
    let set = load_travel_time_csv(csv)?;
    TimeFunctionRegistry::with_builtins().lookup(&set.tf_name)?;
    let cfg = &session.config;
    save_travel_time_set(&mut session.store, &cfg.pvs_schema, cfg.pvs_number, &set, if_exists(replace))?;
    Ok(())
}

pub fn import_impacts(session: &mut Session, impact: &str, csv: &Path, replace: bool) -> Result<()> {
    let table = load_impacts_csv(csv, impact)?;
    let cfg = &session.config;
    save_impact_set(&mut session.store, &cfg.pvs_schema, cfg.pvs_number, &table, if_exists(replace))?;
    Ok(())
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

pub fn build_edgelist(session: &mut Session, irrelevant: Option<PathBuf>, replace: bool) -> Result<()> {
    let cfg = &session.config;
    let (list, report) = {
        let store = &session.store;
        let links = read_network(store, &cfg.network_schema, &cfg.network_table())?;
        let travel_time = StorePvsProvider::new(store, &cfg.pvs_schema).load_travel_time_set(cfg.pvs_number)?;
        let registry = TimeFunctionRegistry::with_builtins();
        let baseline = StoreBaseline::from_config(store, cfg);
        EdgeListBuilder::new(&travel_time, &registry, cfg.extension).build(&links, &baseline)?
    };
    save_edgelist(&mut session.store, &cfg.results_schema(), &list, if_exists(replace))?;

    if let Some(path) = irrelevant {
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        report.write_csv(file)?;
        log::info!("{} irrelevant edges written to {}", report.rows().len(), path.display());
    }
    Ok(())
}

pub fn optimise(session: &mut Session, cutoff: Option<f64>, replace: bool) -> Result<()> {
    let cfg = &session.config;
    let schema = cfg.results_schema();
    let table = {
        let store = &session.store;
        let edges = load_edgelist(store, &schema, Some(&[] as &[&str]), &Filter::All)?;
        let baseline = StoreBaseline::from_config(store, cfg);
        let engine = ShortestPathEngine::new(ShortestPathOptions { cutoff });
        engine.compute_all_pairs(&edges, &baseline, cfg.extension, &BarObserver::default())?
    };
    if table.is_empty() {
        bail!("no pair improves on the {} baseline; nothing to persist", cfg.extension);
    }
    save_optimisation(&mut session.store, &schema, &table, if_exists(replace))?;
    Ok(())
}

// ── Results ───────────────────────────────────────────────────────────────────

pub fn zone(session: &mut Session, zone: i64) -> Result<()> {
    let zone = NodeId::try_from(zone)?;
    let mut manager = ConsistencyManager::new(&mut session.store, &session.config);
    let outcome = manager.prepare_zone_snapshot(zone)?;
    let table = AnalysisConfig::snapshot_table(zone);
    match outcome {
        ZoneOutcome::UpToDate => println!("{table} is up to date"),
        ZoneOutcome::Created  => println!("{table} created"),
        ZoneOutcome::Replaced => println!("{table} recomputed"),
    }
    Ok(())
}

pub fn replace_impacts(session: &mut Session, yes: bool) -> Result<()> {
    let mut confirmation: Box<dyn Confirmation> =
        if yes { Box::new(AlwaysConfirm) } else { Box::new(PromptConfirm::terminal()) };
    let mut manager = ConsistencyManager::new(&mut session.store, &session.config);
    match manager.replace_all_impacts(confirmation.as_mut())? {
        ReplaceOutcome::Cancelled => println!("cancelled; nothing was changed"),
        ReplaceOutcome::Replaced { impacts, zones } => {
            println!("impacts {} replaced in the edge list and {} zone snapshots", impacts.join(", "), zones.len());
        }
    }
    Ok(())
}

pub fn status(session: &mut Session) -> Result<()> {
    let manager = ConsistencyManager::new(&mut session.store, &session.config);
    println!("results namespace: {}", manager.results_schema());
    println!("network:           {:?}", manager.network_state()?);
    for zone in manager.snapshot_zones()? {
        println!("zone {zone:>5}:        {:?}", manager.zone_state(zone)?);
    }
    Ok(())
}
