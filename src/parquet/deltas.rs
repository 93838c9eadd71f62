//! Save a delta run to a parquet file.

use std::{fs::File, path::PathBuf, sync::Arc};

use anyhow::Result;
use arrow::{
    array::{ArrayRef, Float64Array, Int64Array, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use parquet::{arrow::ArrowWriter, file::properties::WriterProperties};

use crate::stats::DeltaRecord;

pub fn save_deltas(records: &[DeltaRecord], file_path: &PathBuf) -> Result<()> {
    let file = File::create(file_path)?;

    let schema = Arc::new(Schema::new(vec![
        Field::new("start_time", DataType::Utf8, false),
        Field::new("end_time", DataType::Utf8, false),
        Field::new("station_id", DataType::Int64, false),
        Field::new("lat", DataType::Float64, false),
        Field::new("lon", DataType::Float64, false),
        Field::new("gauge_qpe", DataType::Float64, false),
        Field::new("mrms_qpe", DataType::Float64, false),
        Field::new("delta_qpe", DataType::Float64, false),
    ]));

    let props = WriterProperties::builder()
        .set_compression(parquet::basic::Compression::SNAPPY)
        .build();

    let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

    let num_rows = records.len();

    let mut start_times = Vec::with_capacity(num_rows);
    let mut end_times = Vec::with_capacity(num_rows);
    let mut station_ids = Vec::with_capacity(num_rows);
    let mut lats = Vec::with_capacity(num_rows);
    let mut lons = Vec::with_capacity(num_rows);
    let mut gauge_qpes = Vec::with_capacity(num_rows);
    let mut mrms_qpes = Vec::with_capacity(num_rows);
    let mut delta_qpes = Vec::with_capacity(num_rows);

    for r in records {
        start_times.push(r.start_time.to_rfc3339());
        end_times.push(r.end_time.to_rfc3339());
        station_ids.push(r.station_id);
        lats.push(r.lat);
        lons.push(r.lon);
        gauge_qpes.push(r.gauge_qpe);
        mrms_qpes.push(r.mrms_qpe);
        delta_qpes.push(r.delta_qpe);
    }

    let columns: Vec<(&str, ArrayRef)> = vec![
        ("start_time", Arc::new(StringArray::from(start_times))),
        ("end_time", Arc::new(StringArray::from(end_times))),
        ("station_id", Arc::new(Int64Array::from(station_ids))),
        ("lat", Arc::new(Float64Array::from(lats))),
        ("lon", Arc::new(Float64Array::from(lons))),
        ("gauge_qpe", Arc::new(Float64Array::from(gauge_qpes))),
        ("mrms_qpe", Arc::new(Float64Array::from(mrms_qpes))),
        ("delta_qpe", Arc::new(Float64Array::from(delta_qpes))),
    ];

    let batch = RecordBatch::try_from_iter(columns)?;

    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}

// -- Tests -------------------------------------------------------------------
