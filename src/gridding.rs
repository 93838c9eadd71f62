//! Spatial matching: point-to-cell lookups and sparse-to-dense aggregation.

use crate::error::{EngineError, EngineResult};

/// Geographic bounds in plain degrees (longitudes negative west).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl Region {
    /// Clark County / southern Nevada bounds of the gauge network.
    pub fn clark_county() -> Self {
        Self {
            lat_min: 34.751857,
            lat_max: 37.103662,
            lon_min: -116.146925,
            lon_max: -113.792819,
        }
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max && lon >= self.lon_min && lon <= self.lon_max
    }
}

/// Index pair of the grid cell nearest `(lat, lon)`, minimizing absolute
/// distance per axis independently. Axis-wise nearest (not geodesic) is the
/// defined semantics; ties go to the first minimal element.
///
/// Returns `None` when either axis is empty.
pub fn nearest_cell(lats: &[f64], lons: &[f64], lat: f64, lon: f64) -> Option<(usize, usize)> {
    Some((nearest_index(lats, lat)?, nearest_index(lons, lon)?))
}

fn nearest_index(axis: &[f64], x: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in axis.iter().enumerate() {
        let d = (v - x).abs();
        match best {
            Some((_, bd)) if d >= bd => {}
            _ => best = Some((i, d)),
        }
    }

    best.map(|(i, _)| i)
}

/// Aggregates sparse point values onto a fixed-resolution grid, tracking a
/// running sum and count per cell.
#[derive(Debug)]
pub struct SparseGrid {
    region: Region,
    d_lat: f64,
    d_lon: f64,
    n_lat: usize,
    n_lon: usize,
    sums: Vec<f64>,
    counts: Vec<u32>,
}

impl SparseGrid {
    /// Builds an empty grid over `region`. Non-positive or non-finite steps
    /// cannot size a grid and are rejected up front.
    pub fn new(region: Region, d_lat: f64, d_lon: f64) -> EngineResult<Self> {
        if !(d_lat > 0.0 && d_lat.is_finite() && d_lon > 0.0 && d_lon.is_finite()) {
            return Err(EngineError::InvalidInput(format!(
                "grid step must be positive, got d_lat={} d_lon={}",
                d_lat, d_lon
            )));
        }

        let n_lat = ((region.lat_max - region.lat_min) / d_lat).floor() as usize + 1;
        let n_lon = ((region.lon_max - region.lon_min) / d_lon).floor() as usize + 1;

        Ok(Self {
            region,
            d_lat,
            d_lon,
            n_lat,
            n_lon,
            sums: vec![0.0; n_lat * n_lon],
            counts: vec![0; n_lat * n_lon],
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.n_lat, self.n_lon)
    }

    /// Lower-corner coordinates of cell `(i, j)`.
    pub fn cell_coord(&self, i: usize, j: usize) -> (f64, f64) {
        (
            self.region.lat_min + i as f64 * self.d_lat,
            self.region.lon_min + j as f64 * self.d_lon,
        )
    }

    /// Buckets one point by `floor((coord - min) / step)`.
    ///
    /// NaN values are skipped. Points that bucket outside the grid are
    /// silently discarded.
    pub fn accumulate(&mut self, lat: f64, lon: f64, value: f64) {
        if value.is_nan() {
            return;
        }

        let i = ((lat - self.region.lat_min) / self.d_lat).floor() as i64;
        let j = ((lon - self.region.lon_min) / self.d_lon).floor() as i64;
        if i < 0 || j < 0 || i >= self.n_lat as i64 || j >= self.n_lon as i64 {
            return;
        }

        let idx = i as usize * self.n_lon + j as usize;
        self.sums[idx] += value;
        self.counts[idx] += 1;
    }

    /// Elementwise mean, row-major. Cells that received no points are NaN,
    /// never zero.
    pub fn mean(&self) -> Vec<f64> {
        self.sums
            .iter()
            .zip(&self.counts)
            .map(|(&s, &c)| if c == 0 { f64::NAN } else { s / c as f64 })
            .collect()
    }
}

// -- Tests -------------------------------------------------------------------
