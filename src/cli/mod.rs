//! Command line interface.

pub mod command;

use std::path::PathBuf;
use std::time::Duration;

use clap::{command, Args, Parser, Subcommand};
use indicatif::ProgressBar;

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Contains the commands
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute gauge-vs-MRMS QPE deltas over a time range
    Deltas(DeltasArgs),
    /// Grid cumulative gauge QPE over a time range
    GaugeGrid(GaugeGridArgs),
    /// Export the valid rain-gauge stations
    Stations(StationsArgs),
}

#[derive(Args)]
pub struct DeltasArgs {
    /// Range start, UTC (e.g. 2023-08-21T02:00)
    #[arg(long)]
    pub start: String,

    /// Range end, UTC
    #[arg(long)]
    pub end: String,

    /// MRMS product code
    #[arg(long, default_value = "RadarOnly_QPE_01H")]
    pub product: String,

    /// Snapshot resolution policy: nearest, first, or next
    #[arg(long, default_value = "nearest")]
    pub mode: String,

    /// Window length in hours, overriding the product's accumulation period
    #[arg(long)]
    pub interval_hours: Option<i64>,

    /// Concurrent window workers
    #[arg(long, default_value_t = 4)]
    pub workers: usize,

    /// Station metadata CSV
    #[arg(long, default_value = "data/clark-county-rain-gauges/ccrfcd_rain_gauge_metadata.csv")]
    pub metadata: PathBuf,

    /// Directory of gagedata_{id}.csv exports
    #[arg(long, default_value = "data/clark-county-rain-gauges/2021-")]
    pub data_dir: PathBuf,

    /// Gauge feed offset from UTC in hours
    #[arg(long, default_value_t = -7, allow_hyphen_values = true)]
    pub utc_offset_hours: i64,

    /// Per-transfer timeout in seconds
    #[arg(long, default_value_t = 120)]
    pub timeout_secs: u64,

    /// Read snapshots from a local archive mirror instead of the MRMS bucket
    #[arg(long)]
    pub archive_root: Option<PathBuf>,

    /// Skip days whose regional 24-hour QPE maximum stays below this (inches)
    #[arg(long)]
    pub min_precip_in: Option<f64>,
}

#[derive(Args)]
pub struct GaugeGridArgs {
    /// Range start, UTC (e.g. 2023-08-21T02:00)
    #[arg(long)]
    pub start: String,

    /// Range end, UTC
    #[arg(long)]
    pub end: String,

    /// Grid step in degrees, both axes
    #[arg(long, default_value_t = 0.045)]
    pub step_deg: f64,

    /// Station metadata CSV
    #[arg(long, default_value = "data/clark-county-rain-gauges/ccrfcd_rain_gauge_metadata.csv")]
    pub metadata: PathBuf,

    /// Directory of gagedata_{id}.csv exports
    #[arg(long, default_value = "data/clark-county-rain-gauges/2021-")]
    pub data_dir: PathBuf,

    /// Gauge feed offset from UTC in hours
    #[arg(long, default_value_t = -7, allow_hyphen_values = true)]
    pub utc_offset_hours: i64,
}

#[derive(Args)]
pub struct StationsArgs {
    /// Station metadata CSV
    #[arg(long, default_value = "data/clark-county-rain-gauges/ccrfcd_rain_gauge_metadata.csv")]
    pub metadata: PathBuf,
}

/// Creates a spinner.
pub fn create_spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}
