//! `transnetmap` — run the network pipeline step by step against a SQLite
//! store.
//!
//! Every subcommand reads the same TOML configuration (`--config`), which
//! names the network, the physical value set, the baseline model, the
//! extension mode, and the database file.
//!
//! Typical order:
//!
//! ```text
//! transnetmap import-zones zones.csv
//! transnetmap import-baseline --mode IMT --time imt_time.csv --length imt_length.csv
//! transnetmap import-baseline --mode PT  --time pt_time.csv  --length pt_length.csv
//! transnetmap import-network network.csv
//! transnetmap import-travel-time travel_time.csv
//! transnetmap import-impacts --impact CO2 co2.csv
//! transnetmap edgelist --irrelevant irrelevant.csv
//! transnetmap optimise
//! transnetmap zone 42
//! ```
//!
//! Set `RUST_LOG=debug` for detailed logs.

mod commands;
mod progress;


use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use tn_analysis::od::DEFAULT_TOLERANCE;
use tn_core::Mode;

use commands::{BaselineArgs, Session};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct CliArgs {
    /// TOML configuration of the analysis.
    #[arg(long, short, global = true, default_value = "transnetmap.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import the network links (`id_a;id_b;level;length`).
    ImportNetwork {
        csv: PathBuf,
        #[arg(long)]
        replace: bool,
    },
    /// Import the zones table (`id;nptmid`).
    ImportZones {
        csv: PathBuf,
        #[arg(long)]
        replace: bool,
    },
    /// Build a baseline table from time and length OD matrices (`from;to;value`).
    ImportBaseline {
        /// IMT or PT.
        #[arg(long)]
        mode: Mode,
        #[arg(long)]
        time: PathBuf,
        #[arg(long)]
        length: PathBuf,
        /// Fill a missing pair from its reverse pair.
        #[arg(long)]
        symmetric: bool,
        /// Largest difference under which duplicate values are equal.
        #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
        tolerance: f32,
        #[arg(long)]
        replace: bool,
    },
    /// Import the travel-time physical value set.
    ImportTravelTime {
        csv: PathBuf,
        #[arg(long)]
        replace: bool,
    },
    /// Import one impact physical value set.
    ImportImpacts {
        /// Impact name: CO2, EP or TCO.
        #[arg(long)]
        impact: String,
        csv: PathBuf,
        #[arg(long)]
        replace: bool,
    },
    /// Build and persist the edge list.
    Edgelist {
        /// Write network edges slower than the baseline to this CSV.
        #[arg(long)]
        irrelevant: Option<PathBuf>,
        #[arg(long)]
        replace: bool,
    },
    /// Compute the improved shortest paths.
    Optimise {
        /// Largest path time explored, in minutes.
        #[arg(long)]
        cutoff: Option<f64>,
        #[arg(long)]
        replace: bool,
    },
    /// Prepare the snapshot of one zone.
    Zone { id: i64 },
    /// Recompute every impact of the edge list and all zone snapshots.
    ReplaceImpacts {
        /// Do not ask for confirmation.
        #[arg(long)]
        yes: bool,
    },
    /// Show the persisted state of the configuration.
    Status,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = CliArgs::parse();
    let mut session = Session::open(&args.config)?;

    match args.command {
        Command::ImportNetwork { csv, replace } => commands::import_network(&mut session, &csv, replace),
        Command::ImportZones { csv, replace } => commands::import_zones(&mut session, &csv, replace),
        Command::ImportBaseline { mode, time, length, symmetric, tolerance, replace } => {
            commands::import_baseline(&mut session, BaselineArgs {
                mode,
                time: &time,
                length: &length,
                symmetric,
                tolerance,
                replace,
            })
        }
        Command::ImportTravelTime { csv, replace } => commands::import_travel_time(&mut session, &csv, replace),
        Command::ImportImpacts { impact, csv, replace } => {
            commands::import_impacts(&mut session, &impact, &csv, replace)
        }
        Command::Edgelist { irrelevant, replace } => commands::build_edgelist(&mut session, irrelevant, replace),
        Command::Optimise { cutoff, replace } => commands::optimise(&mut session, cutoff, replace),
        Command::Zone { id } => commands::zone(&mut session, id),
        Command::ReplaceImpacts { yes } => commands::replace_impacts(&mut session, yes),
        Command::Status => commands::status(&mut session),
    }
}
