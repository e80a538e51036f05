#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for building locator-map markers.
//!
//! `markers` turns a CSV or `GeoJSON` dataset into a marker payload;
//! `storm` builds one from the NHC feeds and archives of one or more
//! storms. Either payload is written to a file or stdout, or uploaded to a
//! Datawrapper locator map.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dw_graphics_marker::{Crs, Dataset};
use dw_graphics_storm::{StormConfig, StormIngestor};
use dw_graphics_storm_models::StormRequest;

mod chart;

use chart::ChartArgs;

/// Build Datawrapper locator-map markers.
#[derive(Parser)]
#[command(name = "dw_graphics")]
#[command(about = "Build and upload Datawrapper locator-map markers")]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Build markers from a CSV or `GeoJSON` dataset.
    Markers {
        /// Dataset file (`.csv`, `.json` or `.geojson`).
        #[arg(long)]
        input: PathBuf,

        /// CRS of the dataset's geometries, overriding any it declares
        /// (e.g. `EPSG:3857`).
        #[arg(long)]
        crs: Option<String>,

        #[command(flatten)]
        chart: ChartArgs,
    },

    /// Build storm track, cone and position markers from NHC data.
    Storm {
        /// Storm to include, as `ATCF_ID=FEED_URL`
        /// (e.g. `AL092022=https://www.nhc.noaa.gov/nhc_at4.xml`).
        #[arg(long = "storm", required = true)]
        storms: Vec<StormRequest>,

        /// Storm ingestion settings (TOML).
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        chart: ChartArgs,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Markers { input, crs, chart } => cmd_markers(&input, crs.as_deref(), &chart).await,
        Commands::Storm {
            storms,
            config,
            chart,
        } => cmd_storm(&storms, config, &chart).await,
    }
}

/// Builds markers from a dataset file.
async fn cmd_markers(
    input: &std::path::Path,
    crs: Option<&str>,
    chart: &ChartArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut dataset = Dataset::from_path(input)?;
    if let Some(code) = crs {
        dataset.crs = Crs::from_code(code)?;
    }
    log::info!(
        "Read {} rows ({}) from {}",
        dataset.len(),
        dataset.crs,
        input.display()
    );

    chart.deliver(dataset).await
}

/// Builds markers for one or more storms.
async fn cmd_storm(
    storms: &[StormRequest],
    config: Option<PathBuf>,
    chart: &ChartArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = match config {
        Some(path) => StormConfig::from_path(&path)?,
        None => StormConfig::default(),
    };

    let ingestor = StormIngestor::new(config)?;
    let (dataset, included) = ingestor.build_dataset(storms).await?;

    if included.is_empty() {
        return Err("none of the requested storms are in their feeds".into());
    }
    for storm in &included {
        eprintln!(
            "{} {} ({}): {} mph ({} km/h) at {}, {}",
            storm.classification,
            storm.name,
            storm.storm_id,
            storm.wind_mph,
            storm.wind_kmh,
            storm.latitude,
            storm.longitude
        );
    }

    chart.deliver(dataset).await
}
