//! A single station's cumulative-reading time series.
//!
//! The portal exports rows newest-first; that ordering is a contract here,
//! not an accident. Per-row deltas are derived once at load with the sign
//! inverted (`delta[i] = -(value[i] - value[i-1])`, `delta[0] = 0`) so that
//! summing deltas over a forward-time window yields positive accumulation.

use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use tracing::debug;

use crate::error::{EngineError, EngineResult};

#[derive(Debug)]
pub struct GaugeSeries {
    /// Descending (newest-first), normalized to UTC.
    timestamps: Vec<DateTime<Utc>>,
    deltas: Vec<f64>,
}

impl GaugeSeries {
    /// Loads a `Date,Time,Value` series file. `utc_offset_hours` is the feed's
    /// local-time offset from UTC (−7 for the Clark County portal);
    /// timestamps are normalized to UTC here so the rest of the engine never
    /// sees local time.
    pub fn load(path: &Path, utc_offset_hours: i64) -> EngineResult<Self> {
        let file = File::open(path)?;
        let reader = io::BufReader::new(file);

        let mut timestamps = Vec::new();
        let mut values = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if let Some((local, value)) = parse_row(&line) {
                timestamps.push((local - Duration::hours(utc_offset_hours)).and_utc());
                values.push(value);
            }
        }

        if timestamps.is_empty() {
            return Err(EngineError::DecodeError(format!(
                "no parseable rows in {}",
                path.display()
            )));
        }
        debug!(path = %path.display(), rows = timestamps.len(), "loaded gauge series");

        let deltas = derive_deltas(&values);

        Ok(Self { timestamps, deltas })
    }

    /// Net accumulation over `[start, end]`.
    ///
    /// Both bounds map to their nearest sample; the sum runs over the
    /// inclusive row range between them. In newest-first storage the end
    /// bound lands at the numerically smaller index. A degenerate window
    /// whose bounds land on the same row accumulates nothing.
    pub fn cumulative(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
        let start_idx = self.nearest_row(start);
        let end_idx = self.nearest_row(end);

        let (lo, hi) = (end_idx.min(start_idx), end_idx.max(start_idx));
        if lo == hi {
            return 0.0;
        }

        self.deltas[lo..=hi].iter().sum()
    }

    // Nearest-timestamp row over the descending index.
    fn nearest_row(&self, target: DateTime<Utc>) -> usize {
        let idx = self.timestamps.partition_point(|&t| t > target);
        if idx == 0 {
            return 0;
        }
        if idx == self.timestamps.len() {
            return self.timestamps.len() - 1;
        }

        let after = self.timestamps[idx - 1] - target; // first timestamp > target
        let before = target - self.timestamps[idx]; // first timestamp <= target
        if after < before {
            idx - 1
        } else {
            idx
        }
    }
}

// Sign-inverted diff with gauge-reset clamping: a counter dropping back to
// zero would otherwise show up as a large negative accumulation.
fn derive_deltas(values: &[f64]) -> Vec<f64> {
    let mut deltas = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        if i == 0 {
            deltas.push(0.0);
        } else {
            deltas.push((-(values[i] - values[i - 1])).max(0.0));
        }
    }

    deltas
}

fn parse_row(line: &str) -> Option<(NaiveDateTime, f64)> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < 3 {
        return None;
    }

    let stamp = format!("{} {}", fields[0], fields[1]);
    let timestamp = NaiveDateTime::parse_from_str(&stamp, "%m/%d/%Y %H:%M:%S").ok()?;
    let value = fields[2].parse::<f64>().ok()?;

    Some((timestamp, value))
}

// -- Tests -------------------------------------------------------------------
