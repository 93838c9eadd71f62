use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::{
    cli::{create_spinner, DeltasArgs},
    gauge::{GaugeClient, GaugeConfig},
    mrms::{ArchiveStore, LocalDirStore, MrmsProduct, MrmsQpeClient, MrmsStore, ResolveMode},
    parquet,
    stats::{DeltaRecord, StatsClient, StatsConfig},
};

use super::{make_parquet_file_name, parse_time};

pub async fn deltas(args: &DeltasArgs) -> Result<String> {
    let start = parse_time(&args.start, "start")?;
    let end = parse_time(&args.end, "end")?;
    let product: MrmsProduct = args.product.parse()?;
    let mode: ResolveMode = args.mode.parse()?;
    let interval = args.interval_hours.map(chrono::Duration::hours);

    let store: Arc<dyn ArchiveStore> = match &args.archive_root {
        Some(root) => Arc::new(LocalDirStore::new(root.clone())),
        None => Arc::new(MrmsStore::new(Duration::from_secs(args.timeout_secs))?),
    };
    let qpe = Arc::new(MrmsQpeClient::new(store));
    let gauges = Arc::new(GaugeClient::new(GaugeConfig {
        metadata_path: args.metadata.clone(),
        data_dir: args.data_dir.clone(),
        utc_offset_hours: args.utc_offset_hours,
    })?);
    let client = StatsClient::new(
        qpe,
        gauges,
        StatsConfig {
            workers: args.workers,
            ..StatsConfig::default()
        },
    );

    let bar = create_spinner(format!("Computing {} deltas...", product));
    let records = match args.min_precip_in {
        Some(threshold) => {
            let mut records: Vec<DeltaRecord> = Vec::new();
            for (day_start, day_end) in split_by_day(start, end) {
                let date = day_start.date_naive();
                if !client.is_rain_day(date, threshold).await? {
                    info!(%date, threshold, "skipping dry day");
                    continue;
                }
                records.extend(
                    client
                        .fetch_stats_for_range(day_start, day_end, product, interval, mode)
                        .await?,
                );
            }
            records
        }
        None => {
            client
                .fetch_stats_for_range(start, end, product, interval, mode)
                .await?
        }
    };
    bar.finish_with_message(format!("Computed {} delta records", records.len()));

    let parquet_file_name = make_parquet_file_name(product.archive_code());
    parquet::save_deltas(&records, &parquet_file_name)?;

    Ok(parquet_file_name.to_string_lossy().to_string())
}

/// Splits `[start, end)` at UTC midnights into per-day spans.
fn split_by_day(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut spans = Vec::new();
    let mut cursor = start;
    while cursor < end {
        let boundary = match cursor.date_naive().succ_opt() {
            Some(next) => next
                .and_hms_opt(0, 0, 0)
                .expect("midnight exists")
                .and_utc()
                .min(end),
            None => end,
        };
        spans.push((cursor, boundary));
        cursor = boundary;
    }

    spans
}

// -- Tests -------------------------------------------------------------------
