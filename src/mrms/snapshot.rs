//! Decoded grid snapshots and the gunzip + GRIB2 decode steps.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;

use crate::error::{EngineError, EngineResult};

/// Exact divisor for mm -> inch.
pub const MM_PER_INCH: f64 = 25.4;

/// One georeferenced 2D precipitation field with a valid time.
///
/// Values are row-major over `(lats, lons)` and carry the archive's native
/// unit (millimeters). The latitude axis runs north to south as decoded;
/// longitudes are degrees east in 0..360.
#[derive(Debug, Clone)]
pub struct GridSnapshot {
    pub valid_time: DateTime<Utc>,
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    values: Vec<f64>,
}

impl GridSnapshot {
    pub fn new(
        valid_time: DateTime<Utc>,
        lats: Vec<f64>,
        lons: Vec<f64>,
        values: Vec<f64>,
    ) -> EngineResult<Self> {
        if values.len() != lats.len() * lons.len() {
            return Err(EngineError::DecodeError(format!(
                "grid shape mismatch: {} values for {}x{} axes",
                values.len(),
                lats.len(),
                lons.len()
            )));
        }

        Ok(Self {
            valid_time,
            lats,
            lons,
            values,
        })
    }

    /// Raw archive value (mm) at a cell.
    pub fn value_mm(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.lons.len() + j]
    }

    /// Cell value converted to inches.
    pub fn value_in(&self, i: usize, j: usize) -> f64 {
        self.value_mm(i, j) / MM_PER_INCH
    }

    /// Largest value in the field, in inches. Used to screen dry days.
    pub fn max_in(&self) -> f64 {
        self.values
            .iter()
            .fold(f64::NEG_INFINITY, |acc, &v| acc.max(v))
            / MM_PER_INCH
    }

    /// Restricts the field to cells inside the given bounds, preserving axis
    /// order. Longitude bounds are in the grid's own 0..360 convention.
    pub fn slice(&self, lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> GridSnapshot {
        let lat_keep: Vec<usize> = (0..self.lats.len())
            .filter(|&i| self.lats[i] >= lat_min && self.lats[i] <= lat_max)
            .collect();
        let lon_keep: Vec<usize> = (0..self.lons.len())
            .filter(|&j| self.lons[j] >= lon_min && self.lons[j] <= lon_max)
            .collect();

        let mut values = Vec::with_capacity(lat_keep.len() * lon_keep.len());
        for &i in &lat_keep {
            for &j in &lon_keep {
                values.push(self.value_mm(i, j));
            }
        }

        GridSnapshot {
            valid_time: self.valid_time,
            lats: lat_keep.iter().map(|&i| self.lats[i]).collect(),
            lons: lon_keep.iter().map(|&j| self.lons[j]).collect(),
            values,
        }
    }
}

/// Decompresses a `.grib2.gz` artifact next to itself, returning the
/// decompressed path.
pub fn gunzip(gz_path: &Path) -> EngineResult<PathBuf> {
    let file_name = gz_path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_suffix(".gz"))
        .ok_or_else(|| {
            EngineError::DecodeError(format!("not a .gz artifact: {}", gz_path.display()))
        })?;
    let dst_path = gz_path.with_file_name(file_name);

    let mut decoder = GzDecoder::new(File::open(gz_path)?);
    let mut dst = File::create(&dst_path)?;
    io::copy(&mut decoder, &mut dst)?;

    Ok(dst_path)
}

/// Decodes the first submessage of a GRIB2 file into a snapshot.
pub fn decode_grib2(path: &Path, valid_time: DateTime<Utc>) -> EngineResult<GridSnapshot> {
    let file = File::open(path)?;
    let grib2 = grib::from_reader(BufReader::new(file))
        .map_err(|e| EngineError::DecodeError(format!("grib2 read: {:?}", e)))?;

    let (_index, submessage) = grib2
        .iter()
        .next()
        .ok_or_else(|| EngineError::DecodeError("grib2 file has no submessages".to_string()))?;

    let points: Vec<(f32, f32)> = submessage
        .latlons()
        .map_err(|e| EngineError::DecodeError(format!("grib2 grid: {:?}", e)))?
        .collect();
    let (lats, lons) = axes_from_points(&points)?;

    let decoder = grib::Grib2SubmessageDecoder::from(submessage)
        .map_err(|e| EngineError::DecodeError(format!("grib2 decoder: {:?}", e)))?;
    let values: Vec<f64> = decoder
        .dispatch()
        .map_err(|e| EngineError::DecodeError(format!("grib2 unpack: {:?}", e)))?
        .map(f64::from)
        .collect();

    GridSnapshot::new(valid_time, lats, lons, values)
}

// Rebuild the 1D axes from the row-major (lat, lon) point sequence of a
// regular lat/lon grid: the first row fixes the longitude axis, then every
// row-leading point contributes one latitude.
fn axes_from_points(points: &[(f32, f32)]) -> EngineResult<(Vec<f64>, Vec<f64>)> {
    let first_lat = match points.first() {
        Some(p) => p.0,
        None => return Err(EngineError::DecodeError("empty grid".to_string())),
    };

    let nlon = points.iter().take_while(|p| p.0 == first_lat).count();
    if nlon == 0 || points.len() % nlon != 0 {
        return Err(EngineError::DecodeError(format!(
            "irregular grid: {} points, first row {}",
            points.len(),
            nlon
        )));
    }

    let lons = points[..nlon].iter().map(|p| p.1 as f64).collect();
    let lats = points.iter().step_by(nlon).map(|p| p.0 as f64).collect();

    Ok((lats, lons))
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    fn snapshot() -> GridSnapshot {
        // 3 lats (descending) x 4 lons, values = i * 10 + j in mm
        let lats = vec![36.2, 36.1, 36.0];
        let lons = vec![244.6, 244.7, 244.8, 244.9];
        let values = (0..3)
            .flat_map(|i| (0..4).map(move |j| (i * 10 + j) as f64))
            .collect();

        GridSnapshot::new(
            Utc.with_ymd_and_hms(2023, 8, 21, 2, 0, 0).unwrap(),
            lats,
            lons,
            values,
        )
        .unwrap()
    }

    #[test]
    fn should_use_exact_mm_per_inch_divisor() {
        assert_eq!(MM_PER_INCH, 25.4);
    }

    #[test]
    fn should_convert_cell_values_to_inches() {
        let snap = snapshot();

        assert_eq!(snap.value_mm(1, 2), 12.0);
        assert_eq!(snap.value_in(1, 2), 12.0 / 25.4);
    }

    #[test]
    fn should_reject_shape_mismatch() {
        let err = GridSnapshot::new(
            Utc.with_ymd_and_hms(2023, 8, 21, 2, 0, 0).unwrap(),
            vec![36.0, 36.1],
            vec![244.6],
            vec![1.0, 2.0, 3.0],
        )
        .unwrap_err();

        assert!(matches!(err, EngineError::DecodeError(_)));
    }

    #[test]
    fn should_slice_to_region_bounds() {
        let snap = snapshot();
        let sliced = snap.slice(36.05, 36.25, 244.65, 244.85);

        assert_eq!(sliced.lats, vec![36.2, 36.1]);
        assert_eq!(sliced.lons, vec![244.7, 244.8]);
        assert_eq!(sliced.value_mm(0, 0), 1.0);
        assert_eq!(sliced.value_mm(1, 1), 12.0);
    }

    #[test]
    fn should_report_field_max_in_inches() {
        let snap = snapshot();

        assert_eq!(snap.max_in(), 23.0 / 25.4);
    }

    #[test]
    fn should_rebuild_axes_from_row_major_points() {
        let points = vec![
            (36.1, 244.6),
            (36.1, 244.7),
            (36.0, 244.6),
            (36.0, 244.7),
            (35.9, 244.6),
            (35.9, 244.7),
        ];
        let (lats, lons) = axes_from_points(&points).unwrap();

        assert_eq!(lats, vec![36.1, 36.0, 35.9]);
        assert_eq!(lons, vec![244.6, 244.7]);
    }

    #[test]
    fn should_gunzip_next_to_source() {
        let dir = tempfile::TempDir::new().unwrap();
        let gz_path = dir.path().join("MRMS_RadarOnly_QPE_01H_00.00_20230821-020000.grib2.gz");

        let mut encoder =
            flate2::write::GzEncoder::new(File::create(&gz_path).unwrap(), Default::default());
        encoder.write_all(b"payload").unwrap();
        encoder.finish().unwrap();

        let out = gunzip(&gz_path).unwrap();
        assert_eq!(
            out.file_name().unwrap().to_str().unwrap(),
            "MRMS_RadarOnly_QPE_01H_00.00_20230821-020000.grib2"
        );
        assert_eq!(std::fs::read(out).unwrap(), b"payload");
    }

    #[test]
    fn should_fail_decode_on_corrupt_artifact() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.grib2");
        std::fs::write(&path, b"GRIBgarbage").unwrap();

        let err = decode_grib2(&path, Utc::now()).unwrap_err();
        assert!(matches!(err, EngineError::DecodeError(_)));
    }
}
