//! Save a gridded gauge-QPE state to a parquet file.

use std::{fs::File, path::PathBuf, sync::Arc};

use anyhow::Result;
use arrow::{
    array::{ArrayRef, Float64Array},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use parquet::{arrow::ArrowWriter, file::properties::WriterProperties};

use crate::gridding::SparseGrid;

/// Writes one row per occupied cell; empty cells (NaN mean) are omitted.
pub fn save_gauge_grid(grid: &SparseGrid, file_path: &PathBuf) -> Result<()> {
    let file = File::create(file_path)?;

    let schema = Arc::new(Schema::new(vec![
        Field::new("lat", DataType::Float64, false),
        Field::new("lon", DataType::Float64, false),
        Field::new("gauge_qpe", DataType::Float64, false),
    ]));

    let props = WriterProperties::builder()
        .set_compression(parquet::basic::Compression::SNAPPY)
        .build();

    let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

    let (n_lat, n_lon) = grid.shape();
    let mean = grid.mean();

    let mut lats = Vec::new();
    let mut lons = Vec::new();
    let mut qpes = Vec::new();

    for i in 0..n_lat {
        for j in 0..n_lon {
            let value = mean[i * n_lon + j];
            if value.is_nan() {
                continue;
            }
            let (lat, lon) = grid.cell_coord(i, j);
            lats.push(lat);
            lons.push(lon);
            qpes.push(value);
        }
    }

    let columns: Vec<(&str, ArrayRef)> = vec![
        ("lat", Arc::new(Float64Array::from(lats))),
        ("lon", Arc::new(Float64Array::from(lons))),
        ("gauge_qpe", Arc::new(Float64Array::from(qpes))),
    ];

    let batch = RecordBatch::try_from_iter(columns)?;

    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::gridding::Region;
    use tempfile::TempDir;

    #[test]
    fn should_write_occupied_cells_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("grid.parquet");

        let region = Region {
            lat_min: 36.0,
            lat_max: 36.5,
            lon_min: -115.2,
            lon_max: -114.7,
        };
        let mut grid = SparseGrid::new(region, 0.1, 0.1).unwrap();
        grid.accumulate(36.01, -115.19, 0.5);

        save_gauge_grid(&grid, &path).unwrap();
        assert!(path.metadata().unwrap().len() > 0);
    }
}
