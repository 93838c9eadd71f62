//! Delta aggregation pipeline: drives windows over a time range, pairs gauge
//! accumulations with the matching MRMS grid cells, and merges per-window
//! results from a bounded worker pool.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use futures::{stream, StreamExt};
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::gauge::{GaugeClient, GaugeQpe};
use crate::gridding::{nearest_cell, Region};
use crate::mrms::{GridSnapshot, MrmsProduct, QpeSource, ResolveMode};

/// One comparison window. `start < end`, both UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// The engine's unit of output: one station against one window.
#[derive(Debug, Clone)]
pub struct DeltaRecord {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub station_id: i64,
    pub lat: f64,
    pub lon: f64,
    pub gauge_qpe: f64,
    pub mrms_qpe: f64,
    pub delta_qpe: f64,
}

#[derive(Debug, Clone)]
pub struct StatsConfig {
    /// Upper bound on concurrently running window units.
    pub workers: usize,
    pub region: Region,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            region: Region::clark_county(),
        }
    }
}

/// Reconciliation pipeline over explicitly injected sources.
pub struct StatsClient {
    qpe: Arc<dyn QpeSource>,
    gauges: Arc<GaugeClient>,
    config: StatsConfig,
}

impl StatsClient {
    pub fn new(qpe: Arc<dyn QpeSource>, gauges: Arc<GaugeClient>, config: StatsConfig) -> Self {
        Self { qpe, gauges, config }
    }

    /// Computes gauge-vs-grid deltas for consecutive windows of `interval`
    /// (default: the product's accumulation period) between `start_time` and
    /// `end_time`.
    ///
    /// Windows with no resolvable or decodable snapshot contribute zero
    /// records; a worker failure never aborts the run. Output is sorted by
    /// (start, station) so content is deterministic regardless of completion
    /// order.
    pub async fn fetch_stats_for_range(
        &self,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        product: MrmsProduct,
        interval: Option<Duration>,
        mode: ResolveMode,
    ) -> EngineResult<Vec<DeltaRecord>> {
        if start_time >= end_time {
            return Err(EngineError::InvalidInput(format!(
                "start_time {} must precede end_time {}",
                start_time, end_time
            )));
        }
        let step = interval.unwrap_or_else(|| product.step());
        if step <= Duration::zero() {
            return Err(EngineError::InvalidInput(format!(
                "interval must be positive, got {}",
                step
            )));
        }

        let windows = build_windows(start_time, end_time, step);
        info!(
            windows = windows.len(),
            product = %product,
            step_minutes = step.num_minutes(),
            "starting delta run"
        );

        // batch snapshots by calendar day for high-cadence products, one
        // listing per day instead of one per window
        let units: Vec<Vec<Window>> = if product.batch_by_day() && interval.is_none() {
            group_by_day(&windows).into_values().collect()
        } else {
            windows.iter().map(|&w| vec![w]).collect()
        };

        let tasks = units.into_iter().map(|unit| {
            let qpe = Arc::clone(&self.qpe);
            let gauges = Arc::clone(&self.gauges);
            let region = self.config.region;
            tokio::spawn(async move {
                run_unit(qpe, gauges, region, product, mode, unit).await
            })
        });

        let mut records = Vec::new();
        let mut results = stream::iter(tasks).buffer_unordered(self.config.workers.max(1));
        while let Some(joined) = results.next().await {
            match joined {
                Ok(unit_records) => records.extend(unit_records),
                Err(e) => warn!(error = %e, "window worker panicked"),
            }
        }

        records.sort_by(|a, b| {
            a.start_time
                .cmp(&b.start_time)
                .then(a.station_id.cmp(&b.station_id))
        });
        info!(records = records.len(), "delta run complete");

        Ok(records)
    }

    /// Whether the region saw meaningful precipitation on `date`, judged by
    /// the 24-hour accumulation valid the following midnight. An unavailable
    /// or undecodable snapshot counts as a dry day.
    pub async fn is_rain_day(&self, date: NaiveDate, threshold_in: f64) -> EngineResult<bool> {
        let target = date
            .succ_opt()
            .ok_or_else(|| EngineError::InvalidInput(format!("date {} has no successor", date)))?
            .and_hms_opt(0, 0, 0)
            .expect("midnight exists")
            .and_utc();

        let snapshot = match self
            .qpe
            .fetch_qpe(MrmsProduct::RadarOnlyQpe24H, target, ResolveMode::Nearest)
            .await
        {
            Ok(snapshot) => snapshot,
            Err(e) if e.is_recoverable() => return Ok(false),
            Err(e) => return Err(e),
        };

        let region = self.config.region;
        let sliced = snapshot.slice(
            region.lat_min,
            region.lat_max,
            region.lon_min + 360.0,
            region.lon_max + 360.0,
        );

        Ok(sliced.max_in() > threshold_in)
    }
}

fn build_windows(start_time: DateTime<Utc>, end_time: DateTime<Utc>, step: Duration) -> Vec<Window> {
    let mut windows = Vec::new();
    let mut start = start_time;
    while start + step <= end_time {
        windows.push(Window {
            start,
            end: start + step,
        });
        start += step;
    }

    windows
}

fn group_by_day(windows: &[Window]) -> BTreeMap<NaiveDate, Vec<Window>> {
    let mut days: BTreeMap<NaiveDate, Vec<Window>> = BTreeMap::new();
    for &w in windows {
        days.entry(w.end.date_naive()).or_default().push(w);
    }

    days
}

// One self-contained unit of work: the snapshots for a group of windows
// sharing a calendar day (or a single window), the gauge batch per window,
// and the delta computation. All recoverable failures end here.
async fn run_unit(
    qpe: Arc<dyn QpeSource>,
    gauges: Arc<GaugeClient>,
    region: Region,
    product: MrmsProduct,
    mode: ResolveMode,
    windows: Vec<Window>,
) -> Vec<DeltaRecord> {
    let snapshots: Vec<(Window, GridSnapshot)> = if windows.len() == 1 {
        let window = windows[0];
        match qpe.fetch_qpe(product, window.end, mode).await {
            Ok(snapshot) => vec![(window, snapshot)],
            Err(e) if e.is_recoverable() => {
                warn!(end = %window.end, error = %e, "no grid data for window");
                Vec::new()
            }
            Err(e) => {
                warn!(end = %window.end, error = %e, "window failed");
                Vec::new()
            }
        }
    } else {
        let date = windows[0].end.date_naive();
        let targets: Vec<DateTime<Utc>> = windows.iter().map(|w| w.end).collect();
        match qpe.fetch_qpe_day(product, date, &targets, mode).await {
            Ok(day_snapshots) => day_snapshots
                .into_iter()
                .filter_map(|(target, snapshot)| {
                    windows.iter().find(|w| w.end == target).map(|&w| (w, snapshot))
                })
                .collect(),
            Err(e) => {
                warn!(date = %date, error = %e, "no grid data for day");
                Vec::new()
            }
        }
    };

    let mut records = Vec::new();
    for (window, snapshot) in snapshots {
        let batch = gauges.cumulative_for_all(window.start, window.end);
        records.extend(compute_deltas(&window, &snapshot, region, &batch));
    }

    records
}

/// Pairs each gauge value with its nearest grid cell on the region-sliced
/// snapshot and takes `gauge - grid`, both in inches. Stations outside the
/// region are excluded from matching.
fn compute_deltas(
    window: &Window,
    snapshot: &GridSnapshot,
    region: Region,
    gauges: &[GaugeQpe],
) -> Vec<DeltaRecord> {
    // slice once per window to keep the nearest-cell search small; MRMS
    // longitudes are 0..360 degrees east
    let sliced = snapshot.slice(
        region.lat_min,
        region.lat_max,
        region.lon_min + 360.0,
        region.lon_max + 360.0,
    );

    let mut records = Vec::new();
    for gauge in gauges {
        let station = &gauge.station;
        if !region.contains(station.lat, station.lon) {
            continue;
        }
        let Some((i, j)) = nearest_cell(&sliced.lats, &sliced.lons, station.lat, station.lon + 360.0)
        else {
            continue;
        };

        let mrms_qpe = sliced.value_in(i, j);
        records.push(DeltaRecord {
            start_time: window.start,
            end_time: window.end,
            station_id: station.id,
            lat: station.lat,
            lon: station.lon,
            gauge_qpe: gauge.qpe,
            mrms_qpe,
            delta_qpe: gauge.qpe - mrms_qpe,
        });
    }

    records
}

// -- Tests -------------------------------------------------------------------
