//! Save the station metadata table to a parquet file.

use std::{fs::File, path::PathBuf, sync::Arc};

use anyhow::Result;
use arrow::{
    array::{ArrayRef, Float64Array, Int64Array},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use parquet::{arrow::ArrowWriter, file::properties::WriterProperties};

use crate::gauge::Station;

pub fn save_stations(stations: &[Station], file_path: &PathBuf) -> Result<()> {
    let file = File::create(file_path)?;

    let schema = Arc::new(Schema::new(vec![
        Field::new("station_id", DataType::Int64, false),
        Field::new("lat", DataType::Float64, false),
        Field::new("lon", DataType::Float64, false),
    ]));

    let props = WriterProperties::builder()
        .set_compression(parquet::basic::Compression::SNAPPY)
        .build();

    let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

    let mut station_ids = Vec::with_capacity(stations.len());
    let mut lats = Vec::with_capacity(stations.len());
    let mut lons = Vec::with_capacity(stations.len());

    for s in stations {
        station_ids.push(s.id);
        lats.push(s.lat);
        lons.push(s.lon);
    }

    let columns: Vec<(&str, ArrayRef)> = vec![
        ("station_id", Arc::new(Int64Array::from(station_ids))),
        ("lat", Arc::new(Float64Array::from(lats))),
        ("lon", Arc::new(Float64Array::from(lons))),
    ];

    let batch = RecordBatch::try_from_iter(columns)?;

    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}

// -- Tests -------------------------------------------------------------------
