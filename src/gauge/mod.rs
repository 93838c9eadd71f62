//! Gauge series access: per-station cumulative QPE over a window, batch
//! fetches across the network, and sparse-to-dense gauge grids.

pub mod metadata;
pub mod series;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::gridding::{Region, SparseGrid};

pub use metadata::Station;
pub use series::GaugeSeries;

#[derive(Debug, Clone)]
pub struct GaugeConfig {
    /// Station id -> coordinates table.
    pub metadata_path: PathBuf,
    /// Directory of `gagedata_{id}.csv` exports.
    pub data_dir: PathBuf,
    /// The feed's local-time offset from UTC (−7 for the Clark County portal).
    pub utc_offset_hours: i64,
}

/// One station's cumulative QPE (inches) over a window.
#[derive(Debug, Clone)]
pub struct GaugeQpe {
    pub station: Station,
    pub qpe: f64,
}

/// Accessor over the gauge network.
///
/// Series files are parsed once on first access and cached for the life of
/// the client; the cache is read-only after population (source files are
/// immutable for historical dates).
pub struct GaugeClient {
    config: GaugeConfig,
    stations: Vec<Station>,
    cache: Mutex<HashMap<i64, Arc<GaugeSeries>>>,
}

impl GaugeClient {
    pub fn new(config: GaugeConfig) -> EngineResult<Self> {
        let stations = metadata::load_stations(&config.metadata_path)?;

        Ok(Self {
            config,
            stations,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Valid stations (id > 0) known to the metadata table.
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    fn series(&self, station_id: i64) -> EngineResult<Arc<GaugeSeries>> {
        if let Some(series) = self.cache.lock().expect("cache lock").get(&station_id) {
            return Ok(Arc::clone(series));
        }

        let path = self.config.data_dir.join(format!("gagedata_{}.csv", station_id));
        if !path.is_file() {
            return Err(EngineError::StationDataMissing(station_id));
        }
        // a corrupt file degrades to "no data" for this station
        let series = GaugeSeries::load(&path, self.config.utc_offset_hours)
            .map_err(|_| EngineError::StationDataMissing(station_id))?;

        let series = Arc::new(series);
        self.cache
            .lock()
            .expect("cache lock")
            .insert(station_id, Arc::clone(&series));

        Ok(series)
    }

    /// Cumulative precipitation (inches) for one station over `[start, end]`.
    pub fn cumulative(
        &self,
        station_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<f64> {
        if start > end {
            return Err(EngineError::InvalidInput(format!(
                "window start {} is after end {}",
                start, end
            )));
        }

        Ok(self.series(station_id)?.cumulative(start, end))
    }

    /// Cumulative precipitation for every valid station. Stations without
    /// data for the window are skipped, never fatal.
    pub fn cumulative_for_all(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<GaugeQpe> {
        let mut results = Vec::with_capacity(self.stations.len());
        for station in &self.stations {
            match self.cumulative(station.id, start, end) {
                Ok(qpe) => results.push(GaugeQpe {
                    station: station.clone(),
                    qpe,
                }),
                Err(e) => debug!(station_id = station.id, error = %e, "skipping station"),
            }
        }

        results
    }

    /// Buckets every station's cumulative QPE onto a fixed-resolution grid
    /// and returns the per-cell mean state.
    pub fn gridded_qpe(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        region: Region,
        d_lat: f64,
        d_lon: f64,
    ) -> EngineResult<SparseGrid> {
        let mut grid = SparseGrid::new(region, d_lat, d_lon)?;
        for gauge in self.cumulative_for_all(start, end) {
            grid.accumulate(gauge.station.lat, gauge.station.lon, gauge.qpe);
        }

        Ok(grid)
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 8, 21, h, m, 0).unwrap()
    }

    fn fixture() -> (TempDir, GaugeClient) {
        let dir = TempDir::new().unwrap();
        let metadata_path = dir.path().join("metadata.csv");
        fs::write(
            &metadata_path,
            "station_id,lat,lon\n\
             101,36.10,-115.10\n\
             102,36.20,-115.20\n\
             103,40.00,-110.00\n",
        )
        .unwrap();

        // station 101: 0.5" over the window; 102 has no file; 103 is dry
        fs::write(
            dir.path().join("gagedata_101.csv"),
            "Date,Time,Value\n\
             08/21/2023,03:00:00,2.0\n\
             08/21/2023,02:30:00,1.8\n\
             08/21/2023,02:00:00,1.5\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("gagedata_103.csv"),
            "Date,Time,Value\n\
             08/21/2023,03:00:00,0.0\n\
             08/21/2023,02:00:00,0.0\n",
        )
        .unwrap();

        let client = GaugeClient::new(GaugeConfig {
            metadata_path,
            data_dir: dir.path().to_path_buf(),
            utc_offset_hours: 0,
        })
        .unwrap();

        (dir, client)
    }

    #[test]
    fn should_compute_cumulative_for_station() {
        let (_dir, client) = fixture();

        let qpe = client.cumulative(101, at(2, 0), at(3, 0)).unwrap();
        assert!((qpe - 0.5).abs() < 1e-9);
    }

    #[test]
    fn should_report_missing_series_as_station_data_missing() {
        let (_dir, client) = fixture();

        let err = client.cumulative(102, at(2, 0), at(3, 0)).unwrap_err();
        assert!(matches!(err, EngineError::StationDataMissing(102)));
    }

    #[test]
    fn should_reject_inverted_window() {
        let (_dir, client) = fixture();

        let err = client.cumulative(101, at(3, 0), at(2, 0)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn should_collect_batch_and_skip_missing_stations() {
        let (_dir, client) = fixture();

        let batch = client.cumulative_for_all(at(2, 0), at(3, 0));
        let ids: Vec<i64> = batch.iter().map(|g| g.station.id).collect();

        assert_eq!(ids, vec![101, 103]);
    }

    #[test]
    fn should_cache_series_across_calls() {
        let (dir, client) = fixture();

        let first = client.cumulative(101, at(2, 0), at(3, 0)).unwrap();
        // removing the file does not invalidate the populated cache
        fs::remove_file(dir.path().join("gagedata_101.csv")).unwrap();
        let second = client.cumulative(101, at(2, 0), at(3, 0)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn should_grid_gauge_qpe_with_nan_background() {
        let (_dir, client) = fixture();

        let region = Region {
            lat_min: 36.0,
            lat_max: 36.5,
            lon_min: -115.5,
            lon_max: -115.0,
        };
        let grid = client.gridded_qpe(at(2, 0), at(3, 0), region, 0.1, 0.1).unwrap();
        let mean = grid.mean();

        // station 101 lands alone in its cell; 103 is outside and discarded
        let occupied: Vec<f64> = mean.iter().copied().filter(|v| !v.is_nan()).collect();
        assert_eq!(occupied.len(), 1);
        assert!((occupied[0] - 0.5).abs() < 1e-9);
    }
}
