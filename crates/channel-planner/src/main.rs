//! Channel Planning CLI
//!
//! Propagates a catalog constellation and assigns frequency channels at the
//! requested epochs.
//!
//! Usage:
//!   plan-channels --catalog data/constellations.json --name Demo \
//!                 --epochs 1002 --epoch-index 0,500,1001 \
//!                 --output data/demo_plan.json --geojson --cytoscape

use anyhow::{Context, Result};
use channel_planner::pipeline::{EpochFailure, EpochReport, PlanReport, ReportMetadata, SatelliteTrack};
use channel_planner::{Catalog, ChannelPlanner, ColoringConfig, PlannerConfig};
use clap::Parser;
use coverage_graph::export;
use orbital_mechanics::{BodyConstants, EpochSequence};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Ku-band downlink channels [Hz]
const DEFAULT_POOL: [f64; 8] = [
    10.70e9, 10.95e9, 11.20e9, 11.45e9, 11.70e9, 11.95e9, 12.20e9, 12.45e9,
];

#[derive(Parser, Debug)]
#[command(
    name = "plan-channels",
    about = "Assign frequency channels to a Walker constellation"
)]
struct Args {
    /// Path to the constellation catalog JSON file
    #[arg(short = 'c', long, default_value = "data/constellations.json")]
    catalog: PathBuf,

    /// Constellation name (case-insensitive)
    #[arg(short, long, default_value = "Demo")]
    name: String,

    /// Number of propagated epochs
    #[arg(long, default_value_t = 1002)]
    epochs: usize,

    /// Spacing between epochs in seconds
    #[arg(long, default_value_t = 1.0)]
    step: f64,

    /// Epochs to plan (comma separated indices)
    #[arg(short, long, value_delimiter = ',', default_value = "0")]
    epoch_index: Vec<usize>,

    /// Frequency pool in Hz (comma separated); its length is the channel count
    #[arg(short, long, value_delimiter = ',', default_values_t = DEFAULT_POOL)]
    frequencies: Vec<f64>,

    /// Seed for the local search stage of the colorer
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Include the track of one satellite in the report
    #[arg(long)]
    satellite: Option<usize>,

    /// Output JSON report
    #[arg(short, long, default_value = "data/channel_plan.json")]
    output: PathBuf,

    /// Also write coverage cells as GeoJSON (one file per planned epoch)
    #[arg(long)]
    geojson: bool,

    /// Also write the neighbor graph in Cytoscape.js format
    #[arg(long)]
    cytoscape: bool,

    /// Report the smallest workable pool size, searching up to this many channels
    #[arg(long)]
    min_pool: Option<usize>,

    /// Accept diametrically opposite satellites (needed for even sats-per-plane)
    #[arg(long)]
    allow_antipodal: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {:?}", path))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}

/// `plan.json` -> `plan.epoch-12.geojson`
fn epoch_path(output: &Path, epoch: usize, extension: &str) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "plan".to_string());
    output.with_file_name(format!("{}.epoch-{}.{}", stem, epoch, extension))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "channel_planner=debug,coverage_graph=debug,orbital_mechanics=debug,info"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("{}", "=".repeat(60));
    info!("Walker Constellation Channel Planner");
    info!("{}", "=".repeat(60));

    let constants = BodyConstants::earth();
    let catalog = Catalog::load(&args.catalog)?;
    let constellation = catalog.constellation(&args.name, &constants)?;
    let epochs = EpochSequence::uniform(args.epochs, args.step)?;
    let trajectory = constellation.propagate(&epochs, &constants)?;

    info!(
        "Propagated {} satellites over {} epochs",
        constellation.satellite_count(),
        trajectory.epoch_count()
    );

    let config = PlannerConfig {
        constants,
        coloring: ColoringConfig {
            seed: args.seed,
            ..Default::default()
        },
        allow_antipodal: args.allow_antipodal,
    };
    let planner = ChannelPlanner::new(config);

    let mut reports = Vec::new();
    let mut failures = Vec::new();

    for (&index, plan) in args
        .epoch_index
        .iter()
        .zip(planner.plan_epochs(&trajectory, &args.epoch_index, &args.frequencies))
    {
        let plan = match plan {
            Ok(plan) => plan,
            Err(err) => {
                failures.push(EpochFailure::new(index, &err));
                continue;
            }
        };

        let mut report = EpochReport::from_plan(&plan);
        if let Some(max_k) = args.min_pool {
            report.minimum_pool_size = planner.assigner().minimum_pool_size(&plan.graph, max_k);
            match report.minimum_pool_size {
                Some(k) => info!("Epoch {}: {} channels suffice", index, k),
                None => warn!("Epoch {}: no coloring found with up to {} channels", index, max_k),
            }
        }

        if args.geojson {
            let path = epoch_path(&args.output, index, "geojson");
            info!("Writing GeoJSON to {:?}", path);
            let mut geojson = export::to_geojson(
                &plan.partition,
                Some(plan.assignment.colors()),
                Some(plan.assignment.channels()),
            );
            geojson["metadata"] = serde_json::json!({
                "constellation": args.name,
                "epoch_index": index,
                "epoch_s": plan.epoch,
            });
            write_json(&path, &geojson)?;
        }

        if args.cytoscape {
            let path = epoch_path(&args.output, index, "cytoscape.json");
            info!("Writing Cytoscape graph to {:?}", path);
            let elements =
                export::to_cytoscape(&plan.graph, &plan.partition, Some(plan.assignment.colors()));
            write_json(&path, &elements)?;
        }

        reports.push(report);
    }

    let track = match args.satellite {
        Some(sat) => {
            let track = SatelliteTrack::new(&constellation, &trajectory, sat);
            if track.is_none() {
                warn!(
                    "Satellite {} does not exist ({} satellites)",
                    sat,
                    constellation.satellite_count()
                );
            }
            track
        }
        None => None,
    };

    let report = PlanReport {
        metadata: ReportMetadata {
            generated_at: chrono::Utc::now().to_rfc3339(),
            constellation: args.name.clone(),
            shell_count: constellation.shells().len(),
            satellite_count: constellation.satellite_count(),
            epoch_count: trajectory.epoch_count(),
            pool: args.frequencies.clone(),
            seed: args.seed,
            constants,
        },
        epochs: reports,
        failures,
        track,
    };

    info!("Writing report to {:?}", args.output);
    write_json(&args.output, &report)?;

    info!("{}", "=".repeat(60));
    info!("SUMMARY");
    info!("{}", "=".repeat(60));
    info!("Planned epochs: {}", report.epochs.len());
    for epoch in &report.epochs {
        info!(
            "  epoch {:>5}: {} cells, {} adjacencies, {} channels",
            epoch.epoch_index, epoch.cell_count, epoch.edge_count, epoch.channels_used
        );
    }
    for failure in &report.failures {
        warn!("  epoch {:>5}: {}", failure.epoch_index, failure.error);
    }

    if report.epochs.is_empty() && !report.failures.is_empty() {
        anyhow::bail!("no epoch could be planned");
    }
    Ok(())
}
