//! Case Locator CLI
//!
//! Resolves case-location feeds and reports nearest-city attribution per map.
//!
//! Usage:
//!   case-locator --config maps/maps.ini \
//!                --layer "Total Cases=data/confirmed.json" \
//!                --layer "Active Cases=data/active.json" \
//!                --output report.json --geojson

use anyhow::{Context, Result};
use case_locator::export::{to_geojson, RunOutput};
use case_locator::pipeline::{self, LayerPoints, RunConfig};
use case_locator::{
    feed, Layer, MapsConfig, RepairConfig, ANOMALY_THRESHOLD_KM, LAT_DIGITS, LON_DIGITS,
};
use clap::Parser;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "case-locator",
    about = "Repair case coordinates and attribute them to the nearest reference city"
)]
struct Args {
    /// Path to the maps configuration (INI)
    #[arg(short, long, default_value = "maps/maps.ini")]
    config: PathBuf,

    /// Layer feed as ID=PATH, e.g. "Total Cases=confirmed.json" (repeatable)
    #[arg(short, long = "layer", required = true)]
    layers: Vec<Layer>,

    /// Output JSON report file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also output GeoJSON of attributed points (requires --output)
    #[arg(long, requires = "output")]
    geojson: bool,

    /// Max city distance in km before a report is flagged
    #[arg(long, default_value_t = ANOMALY_THRESHOLD_KM)]
    threshold_km: f64,

    /// Integral digits restored in latitudes missing a decimal point
    #[arg(long, default_value_t = LAT_DIGITS)]
    lat_digits: usize,

    /// Integral digits restored in longitudes missing a decimal point
    #[arg(long, default_value_t = LON_DIGITS)]
    lon_digits: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = RunConfig {
        repair: RepairConfig {
            lat_digits: args.lat_digits,
            lon_digits: args.lon_digits,
        },
        threshold_km: args.threshold_km,
    };

    // Configuration errors abort before any point is read
    let maps = MapsConfig::load_from(&args.config)
        .with_context(|| format!("loading maps config {:?}", args.config))?;
    let index = maps.city_index()?;

    let mut layers = Vec::with_capacity(args.layers.len());
    for layer in args.layers {
        info!("Getting {} from {}", layer.id, layer.source);
        let raw = feed::load_layer_points(&layer.source)
            .with_context(|| format!("loading layer {:?}", layer.id))?;
        let points = pipeline::resolve_points(&raw, &config.repair);
        layers.push(LayerPoints { layer, points });
    }

    let summaries = pipeline::run(&maps.regions, &layers, &index, &config);
    let output = RunOutput::new(summaries, &config);

    if let Some(path) = &args.output {
        info!("Writing report to {:?}", path);
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &output)?;

        if args.geojson {
            let geojson_path = path.with_extension("geojson");
            info!("Writing GeoJSON to {:?}", geojson_path);
            let file = File::create(&geojson_path)?;
            serde_json::to_writer_pretty(BufWriter::new(file), &to_geojson(&output))?;
        }
    }

    // Summary
    info!("{}", "=".repeat(60));
    info!("SUMMARY");
    info!("{}", "=".repeat(60));
    info!("Regions processed: {}", output.metadata.total_regions);
    info!("Points attributed: {}", output.metadata.total_points);
    if output.metadata.anomalous_reports > 0 {
        warn!(
            "{} reports have cities beyond {:.2} km",
            output.metadata.anomalous_reports, output.metadata.threshold_km
        );
    }

    Ok(())
}
