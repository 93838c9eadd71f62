pub mod deltas;
pub mod gauge_grid;
pub mod stations;

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Datelike, Local, NaiveDateTime, Utc};
pub use deltas::deltas;
pub use gauge_grid::gauge_grid;
pub use stations::stations;

pub fn make_parquet_file_name(label: &str) -> PathBuf {
    let today = Local::now();
    let file_name = format!(
        "qpedelta-{}-{}-{:02}-{:02}.parquet",
        label,
        today.year(),
        today.month(),
        today.day()
    );

    dirs::home_dir().unwrap().join(file_name)
}

fn parse_time(s: &str, param: &str) -> Result<DateTime<Utc>> {
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive.and_utc());
        }
    }

    Err(anyhow!(
        "invalid --{} '{}': expected a UTC time like 2023-08-21T02:00",
        param,
        s
    ))
}

// -- Tests -------------------------------------------------------------------
