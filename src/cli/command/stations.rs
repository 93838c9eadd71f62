use anyhow::Result;

use crate::{
    cli::{create_spinner, StationsArgs},
    gauge::metadata::load_stations,
    parquet,
};

use super::make_parquet_file_name;

pub async fn stations(args: &StationsArgs) -> Result<String> {
    let bar = create_spinner("Loading station metadata...".to_string());
    let stations = load_stations(&args.metadata)?;
    bar.finish_with_message(format!("Loaded {} stations", stations.len()));

    let parquet_file_name = make_parquet_file_name("stations");
    parquet::save_stations(&stations, &parquet_file_name)?;

    Ok(parquet_file_name.to_string_lossy().to_string())
}
