use anyhow::Result;

use crate::{
    cli::{create_spinner, GaugeGridArgs},
    gauge::{GaugeClient, GaugeConfig},
    gridding::Region,
    parquet,
};

use super::{make_parquet_file_name, parse_time};

pub async fn gauge_grid(args: &GaugeGridArgs) -> Result<String> {
    let start = parse_time(&args.start, "start")?;
    let end = parse_time(&args.end, "end")?;

    let gauges = GaugeClient::new(GaugeConfig {
        metadata_path: args.metadata.clone(),
        data_dir: args.data_dir.clone(),
        utc_offset_hours: args.utc_offset_hours,
    })?;

    let bar = create_spinner("Gridding gauge QPE...".to_string());
    let grid = gauges.gridded_qpe(start, end, Region::clark_county(), args.step_deg, args.step_deg)?;
    let (n_lat, n_lon) = grid.shape();
    bar.finish_with_message(format!("Gridded {} stations onto {}x{} cells", gauges.stations().len(), n_lat, n_lon));

    let parquet_file_name = make_parquet_file_name("gauge-grid");
    parquet::save_gauge_grid(&grid, &parquet_file_name)?;

    Ok(parquet_file_name.to_string_lossy().to_string())
}
