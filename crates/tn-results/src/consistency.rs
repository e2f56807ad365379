//! Keeps the persisted edge list and zone snapshots in step with the impact
//! sets available in the physical-value store.
//!
//! Persisted state of one configuration:
//!
//! ```text
//! no-base-network ─▶ base-network-ready ─▶ edgelist-persisted ⇄ edgelist-stale
//!                                                   │
//!                              zone-snapshot-missing ─▶ zone-snapshot-current
//!                                                   ⇅
//!                                       zone-snapshot-stale
//! ```
//!
//! Every mutation rewrites a whole table with [`IfExists::Replace`]; no
//! column is ever added in place.  The update decision is an explicit
//! [`UpdatePlan`] value: computing it never mutates anything, applying it
//! returns the plan describing the new state.

use std::collections::BTreeSet;

use tn_analysis::{
    AnalysisError, EdgeList, StoreBaseline, edgelist_columns, load_edgelist, load_optimisation, save_edgelist,
};
use tn_core::config::{AnalysisConfig, EDGELIST_TABLE, OPTIMISATION_TABLE, SNAPSHOT_PREFIX};
use tn_core::{NodeId, is_known_impact};
use tn_pvs::{PvsProvider, StorePvsProvider};
use tn_store::{Filter, IfExists, TabularStore};

use crate::confirm::Confirmation;
use crate::impacts::ImpactAggregator;
use crate::snapshot::{SnapshotInputs, ZoneSnapshot, build_zone_snapshot, snapshot_columns};
use crate::zones::ZoneRegistry;
use crate::{ResultsError, ResultsResult};

// ── UpdatePlan ────────────────────────────────────────────────────────────────

/// Impact columns of the edge list compared with the available impact sets.
///
/// All lists are sorted and duplicate-free.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdatePlan {
    /// Impact sets present in the physical-value store.
    pub available:     Vec<String>,
    /// Impact columns of the edge list backed by an available set.
    pub current:       Vec<String>,
    /// Available sets absent from the edge list.
    pub missing:       Vec<String>,
    /// Impact columns of the edge list with no available set.
    pub inconsistent:  Vec<String>,
    /// Columns the next application computes.
    pub update:        Vec<String>,
    pub force_replace: bool,
}

impl UpdatePlan {
    pub fn needs_update(&self) -> bool {
        !self.update.is_empty()
    }

    /// Compare the impact columns of the edge list with the available sets.
    pub fn compute(available: Vec<String>, edgelist_impacts: Vec<String>, force_replace: bool) -> ResultsResult<Self> {
        if available.is_empty() {
            return Err(ResultsError::Precondition(
                "no impact set is available; import at least one impact set first".to_owned(),
            ));
        }
        let available: BTreeSet<String> = available.into_iter().collect();
        let present: BTreeSet<String> = edgelist_impacts.into_iter().collect();

        let current: Vec<String> = present.intersection(&available).cloned().collect();
        let missing: Vec<String> = available.difference(&present).cloned().collect();
        let inconsistent: Vec<String> = present.difference(&available).cloned().collect();
        if !inconsistent.is_empty() && !force_replace {
            return Err(ResultsError::InconsistentImpacts { impacts: inconsistent });
        }
        let update = if force_replace { available.iter().cloned().collect() } else { missing.clone() };
        Ok(Self {
            available: available.into_iter().collect(),
            current,
            missing,
            inconsistent,
            update,
            force_replace,
        })
    }

    /// Plan describing the state once `self` is applied.
    fn applied(&self) -> UpdatePlan {
        let current: Vec<String> = if self.force_replace {
            self.update.clone()
        } else {
            self.current.iter().chain(&self.update).cloned().collect::<BTreeSet<_>>().into_iter().collect()
        };
        UpdatePlan {
            available:     self.available.clone(),
            current,
            missing:       Vec::new(),
            inconsistent:  Vec::new(),
            update:        Vec::new(),
            force_replace: false,
        }
    }
}

// ── States and outcomes ───────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NetworkState {
    NoBaseNetwork,
    BaseNetworkReady,
    EdgelistPersisted,
    /// The edge list lacks an available impact or carries an unbacked one.
    EdgelistStale,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ZoneState {
    Missing,
    Stale,
    Current,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ZoneOutcome {
    UpToDate,
    Created,
    Replaced,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Cancelled,
    Replaced { impacts: Vec<String>, zones: Vec<NodeId> },
}

// ── ConsistencyManager ────────────────────────────────────────────────────────

pub struct ConsistencyManager<'a, S: TabularStore + ?Sized> {
    store:           &'a mut S,
    config:          &'a AnalysisConfig,
    schema:          String,
    bound_zone:      Option<NodeId>,
    recomputations:  usize,
    edgelist_writes: usize,
}

impl<'a, S: TabularStore + ?Sized> ConsistencyManager<'a, S> {
    pub fn new(store: &'a mut S, config: &'a AnalysisConfig) -> Self {
        Self {
            store,
            config,
            schema: config.results_schema(),
            bound_zone: None,
            recomputations: 0,
            edgelist_writes: 0,
        }
    }

    pub fn results_schema(&self) -> &str {
        &self.schema
    }

    /// Zone the manager is scoped to since the last snapshot preparation.
    pub fn bound_zone(&self) -> Option<NodeId> {
        self.bound_zone
    }

    pub fn release_zone(&mut self) {
        self.bound_zone = None;
    }

    /// Zone snapshots computed so far.
    pub fn recomputations(&self) -> usize {
        self.recomputations
    }

    /// Edge-list rewrites performed so far.
    pub fn edgelist_writes(&self) -> usize {
        self.edgelist_writes
    }

    fn available_impacts(&self) -> ResultsResult<Vec<String>> {
        let pvs = StorePvsProvider::new(&*self.store, &self.config.pvs_schema);
        Ok(pvs.available_impacts(self.config.pvs_number)?)
    }

    fn edgelist_impacts(&self) -> ResultsResult<Vec<String>> {
        Ok(edgelist_columns(&*self.store, &self.schema)?
            .into_iter()
            .filter(|c| is_known_impact(c))
            .collect())
    }

    fn aggregator(&self, names: &[String]) -> ResultsResult<ImpactAggregator> {
        let pvs = StorePvsProvider::new(&*self.store, &self.config.pvs_schema);
        let tables = names
            .iter()
            .map(|name| pvs.load_impact_set(name, self.config.pvs_number))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ImpactAggregator::new(tables))
    }

    // ── Edge-list impacts ─────────────────────────────────────────────────────

    /// Decide which impact columns of the edge list must be (re)computed.
    pub fn determine_update_plan(&self, force_replace: bool) -> ResultsResult<UpdatePlan> {
        if !self.store.exists(&self.schema, OPTIMISATION_TABLE)? {
            return Err(ResultsError::Precondition(format!(
                "optimisation {}.{OPTIMISATION_TABLE} does not exist; run the shortest-path optimisation first",
                self.schema
            )));
        }
        let plan = UpdatePlan::compute(self.available_impacts()?, self.edgelist_impacts()?, force_replace)?;
        log::debug!("impact update plan: {plan:?}");
        Ok(plan)
    }

    /// Rewrite the edge list with the `update` columns of `plan`.
    ///
    /// Returns the plan of the resulting state; a plan with nothing to
    /// update is returned unchanged without touching the store.
    pub fn apply_update_plan(&mut self, plan: &UpdatePlan) -> ResultsResult<UpdatePlan> {
        if !plan.needs_update() {
            log::info!("edge list impacts are up to date ({})", plan.current.join(", "));
            return Ok(plan.clone());
        }
        let kept: Vec<&str> = if plan.force_replace {
            Vec::new()
        } else {
            plan.current.iter().map(String::as_str).collect()
        };
        let mut list: EdgeList = load_edgelist(&*self.store, &self.schema, Some(kept.as_slice()), &Filter::All)?;
        self.aggregator(&plan.update)?.apply_to_edges(&mut list, &plan.update)?;
        save_edgelist(&mut *self.store, &self.schema, &list, IfExists::Replace)?;
        self.edgelist_writes += 1;

        let applied = plan.applied();
        log::info!(
            "edge list {}.{EDGELIST_TABLE} rewritten with impacts {}",
            self.schema,
            applied.current.join(", ")
        );
        Ok(applied)
    }

    /// Plan and apply in one step.
    pub fn update_edgelist(&mut self, force_replace: bool) -> ResultsResult<UpdatePlan> {
        let plan = self.determine_update_plan(force_replace)?;
        self.apply_update_plan(&plan)
    }

    // ── Zone snapshots ────────────────────────────────────────────────────────

    /// Make the snapshot of `zone` current, computing it only when it is
    /// absent or lacks a column.  Binds the manager to `zone` once the
    /// snapshot is current; a failed preparation leaves the binding as is.
    pub fn prepare_zone_snapshot(&mut self, zone: NodeId) -> ResultsResult<ZoneOutcome> {
        ZoneRegistry::new(&*self.store, &self.config.nptm_schema, &self.config.zones_table).require(zone)?;

        let plan = self.update_edgelist(false)?;
        let table = AnalysisConfig::snapshot_table(zone);
        let exists = self.store.exists(&self.schema, &table)?;
        if exists && self.has_columns(&table, &plan.current)? {
            log::info!("snapshot {}.{table} is up to date", self.schema);
            self.bound_zone = Some(zone);
            return Ok(ZoneOutcome::UpToDate);
        }

        let snapshot = self.compute_snapshot(zone, &plan.current)?;
        let mode = if exists { IfExists::Replace } else { IfExists::Fail };
        self.write_snapshot(&snapshot, mode)?;
        self.bound_zone = Some(zone);
        Ok(if exists { ZoneOutcome::Replaced } else { ZoneOutcome::Created })
    }

    fn has_columns(&self, table: &str, impacts: &[String]) -> ResultsResult<bool> {
        let present: BTreeSet<String> = self.store.columns(&self.schema, table)?.into_iter().collect();
        Ok(snapshot_columns(impacts).iter().all(|c| present.contains(c)))
    }

    /// Compute the snapshot of `zone` from the persisted edge list and
    /// optimisation, without writing it.
    pub fn compute_snapshot(&mut self, zone: NodeId, impacts: &[String]) -> ResultsResult<ZoneSnapshot> {
        let touching = Filter::Or(vec![Filter::eq("from", i64::from(zone)), Filter::eq("to", i64::from(zone))]);
        let optimisation = match load_optimisation(&*self.store, &self.schema, &touching) {
            Err(AnalysisError::EmptyResult(_)) => {
                return Err(ResultsError::EmptyResult(format!(
                    "{}.{OPTIMISATION_TABLE} for zone {zone}",
                    self.schema
                )));
            }
            other => other?,
        };
        let names: Vec<&str> = impacts.iter().map(String::as_str).collect();
        let edges = load_edgelist(&*self.store, &self.schema, Some(names.as_slice()), &Filter::All)?;
        let aggregator = self.aggregator(impacts)?;
        let baseline = StoreBaseline::from_config(&*self.store, self.config);

        let snapshot = build_zone_snapshot(zone, &SnapshotInputs {
            extension:    self.config.extension,
            optimisation: optimisation.rows(),
            edges:        &edges,
            baseline:     &baseline,
            aggregator:   &aggregator,
            impacts,
        })?;
        self.recomputations += 1;
        Ok(snapshot)
    }

    fn write_snapshot(&mut self, snapshot: &ZoneSnapshot, mode: IfExists) -> ResultsResult<()> {
        let table = snapshot.table_name();
        let data = snapshot.to_table()?;
        if let Some(column) = data.first_null_column() {
            return Err(ResultsError::Inconsistency(format!("snapshot {table} has nulls in {column}")));
        }
        self.store.write(&self.schema, &table, &data, mode)?;
        self.store.add_unique_constraint(&self.schema, &table, &["from", "to", "type"])?;
        log::info!("snapshot written to {}.{table} ({} rows)", self.schema, snapshot.rows.len());
        Ok(())
    }

    // ── Bulk replacement ──────────────────────────────────────────────────────

    /// Recompute every impact column of the edge list and every persisted
    /// zone snapshot.
    ///
    /// Refused while the manager is bound to a zone; asks `confirmation`
    /// before touching anything.
    pub fn replace_all_impacts(&mut self, confirmation: &mut dyn Confirmation) -> ResultsResult<ReplaceOutcome> {
        if let Some(zone) = self.bound_zone {
            return Err(ResultsError::Precondition(format!(
                "the manager is bound to zone {zone}; release it before replacing all impacts"
            )));
        }
        let prompt = format!(
            "Replace all impacts of the edge list and every zone snapshot in {}? This overwrites persisted data.",
            self.schema
        );
        if !confirmation.confirm(&prompt)? {
            log::warn!("replacement of all impacts cancelled");
            return Ok(ReplaceOutcome::Cancelled);
        }

        let zones = self.snapshot_zones()?;
        if zones.is_empty() {
            return Err(ResultsError::Precondition(format!(
                "no zone snapshot in {}; prepare a zone snapshot first",
                self.schema
            )));
        }
        let plan = self.update_edgelist(true)?;
        for &zone in &zones {
            let snapshot = self.compute_snapshot(zone, &plan.current)?;
            self.write_snapshot(&snapshot, IfExists::Replace)?;
        }
        log::info!(
            "impacts {} replaced in the edge list and {} zone snapshots",
            plan.current.join(", "),
            zones.len()
        );
        Ok(ReplaceOutcome::Replaced { impacts: plan.current, zones })
    }

    /// Zones with a persisted snapshot, sorted.  Tables whose suffix is not
    /// a zone id are skipped with a warning.
    pub fn snapshot_zones(&self) -> ResultsResult<Vec<NodeId>> {
        let mut zones = Vec::new();
        for table in self.store.list_tables(&self.schema, SNAPSHOT_PREFIX)? {
            let parsed = table
                .strip_prefix(SNAPSHOT_PREFIX)
                .and_then(|id| id.parse::<i64>().ok())
                .and_then(|id| NodeId::try_from(id).ok());
            match parsed {
                Some(zone) => zones.push(zone),
                None => log::warn!("skipping {}.{table}: not a zone snapshot", self.schema),
            }
        }
        zones.sort();
        Ok(zones)
    }

    // ── Inspection ────────────────────────────────────────────────────────────

    pub fn network_state(&self) -> ResultsResult<NetworkState> {
        if !self.store.exists(&self.config.network_schema, &self.config.network_table())? {
            return Ok(NetworkState::NoBaseNetwork);
        }
        if !self.store.exists(&self.schema, EDGELIST_TABLE)? {
            return Ok(NetworkState::BaseNetworkReady);
        }
        let available: BTreeSet<String> = self.available_impacts()?.into_iter().collect();
        let present: BTreeSet<String> = self.edgelist_impacts()?.into_iter().collect();
        Ok(if available == present { NetworkState::EdgelistPersisted } else { NetworkState::EdgelistStale })
    }

    /// State of the snapshot of `zone` against the impacts now available.
    pub fn zone_state(&self, zone: NodeId) -> ResultsResult<ZoneState> {
        let table = AnalysisConfig::snapshot_table(zone);
        if !self.store.exists(&self.schema, &table)? {
            return Ok(ZoneState::Missing);
        }
        Ok(if self.has_columns(&table, &self.available_impacts()?)? { ZoneState::Current } else { ZoneState::Stale })
    }
}
