//! Temporal file index over one day's archive listing.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::{EngineError, EngineResult};
use crate::mrms::path::parse_valid_time;

/// One time-stamped artifact from an archive listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub timestamp: DateTime<Utc>,
    pub path: String,
}

impl ArchiveEntry {
    /// Builds entries from raw listing paths, skipping objects whose names do
    /// not carry a parseable valid time.
    pub fn from_listing(paths: &[String]) -> Vec<ArchiveEntry> {
        paths
            .iter()
            .filter_map(|p| {
                let timestamp = parse_valid_time(p)?;
                Some(ArchiveEntry {
                    timestamp,
                    path: p.clone(),
                })
            })
            .collect()
    }
}

/// Policy for picking one artifact relative to a target time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Minimal `|timestamp - target|`, ties to the earliest timestamp.
    Nearest,
    /// Latest artifact with `timestamp <= target`.
    First,
    /// Earliest artifact with `timestamp >= target`.
    Next,
}

impl FromStr for ResolveMode {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(ResolveMode::Nearest),
            "first" => Ok(ResolveMode::First),
            "next" => Ok(ResolveMode::Next),
            other => Err(EngineError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for ResolveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResolveMode::Nearest => "nearest",
            ResolveMode::First => "first",
            ResolveMode::Next => "next",
        };
        f.write_str(s)
    }
}

/// Picks exactly one entry for `target` under `mode`.
///
/// The input need not be sorted; it is sorted once per call.
pub fn resolve(
    entries: &[ArchiveEntry],
    target: DateTime<Utc>,
    mode: ResolveMode,
) -> EngineResult<ArchiveEntry> {
    if entries.is_empty() {
        return Err(EngineError::InvalidInput(
            "empty archive entry set".to_string(),
        ));
    }

    let mut sorted: Vec<&ArchiveEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.timestamp);

    let not_found = || EngineError::NotFound {
        mode: mode.to_string(),
        target: target.to_rfc3339(),
    };

    let chosen = match mode {
        ResolveMode::Nearest => {
            // stable min: ties resolve to the earliest timestamp
            sorted
                .iter()
                .min_by_key(|e| distance(e.timestamp, target))
                .expect("non-empty")
        }
        ResolveMode::First => {
            let idx = sorted.partition_point(|e| e.timestamp <= target);
            if idx == 0 {
                return Err(not_found());
            }
            &sorted[idx - 1]
        }
        ResolveMode::Next => {
            let idx = sorted.partition_point(|e| e.timestamp < target);
            if idx == sorted.len() {
                return Err(not_found());
            }
            &sorted[idx]
        }
    };

    Ok((*chosen).clone())
}

fn distance(a: DateTime<Utc>, b: DateTime<Utc>) -> chrono::Duration {
    if a >= b {
        a - b
    } else {
        b - a
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    fn entry(h: u32, m: u32) -> ArchiveEntry {
        ArchiveEntry {
            timestamp: Utc.with_ymd_and_hms(2023, 8, 21, h, m, 0).unwrap(),
            path: format!("CONUS/p/20230821/MRMS_p_20230821-{:02}{:02}00.grib2.gz", h, m),
        }
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 8, 21, h, m, 0).unwrap()
    }

    #[test]
    fn should_resolve_nearest_with_unsorted_input() {
        let entries = vec![entry(6, 0), entry(2, 0), entry(4, 0)];
        let chosen = resolve(&entries, at(3, 40), ResolveMode::Nearest).unwrap();

        assert_eq!(chosen.timestamp, at(4, 0));
    }

    #[test]
    fn should_break_nearest_ties_to_earliest() {
        let entries = vec![entry(4, 0), entry(2, 0)];
        let chosen = resolve(&entries, at(3, 0), ResolveMode::Nearest).unwrap();

        assert_eq!(chosen.timestamp, at(2, 0));
    }

    #[test]
    fn should_resolve_first_as_latest_at_or_before() {
        let entries = vec![entry(2, 0), entry(4, 0), entry(6, 0)];

        let chosen = resolve(&entries, at(5, 0), ResolveMode::First).unwrap();
        assert_eq!(chosen.timestamp, at(4, 0));

        // exact hit is included
        let chosen = resolve(&entries, at(4, 0), ResolveMode::First).unwrap();
        assert_eq!(chosen.timestamp, at(4, 0));
    }

    #[test]
    fn should_fail_first_when_nothing_precedes() {
        let entries = vec![entry(2, 0), entry(4, 0)];
        let err = resolve(&entries, at(1, 0), ResolveMode::First).unwrap_err();

        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[test]
    fn should_resolve_next_as_earliest_at_or_after() {
        let entries = vec![entry(2, 0), entry(4, 0), entry(6, 0)];

        let chosen = resolve(&entries, at(3, 0), ResolveMode::Next).unwrap();
        assert_eq!(chosen.timestamp, at(4, 0));

        let chosen = resolve(&entries, at(6, 0), ResolveMode::Next).unwrap();
        assert_eq!(chosen.timestamp, at(6, 0));
    }

    #[test]
    fn should_fail_next_when_nothing_follows() {
        let entries = vec![entry(2, 0), entry(4, 0)];
        let err = resolve(&entries, at(7, 0), ResolveMode::Next).unwrap_err();

        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[test]
    fn should_fail_fast_on_empty_candidate_set() {
        let err = resolve(&[], at(0, 0), ResolveMode::Nearest).unwrap_err();

        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn should_parse_modes() {
        assert_eq!("Nearest".parse::<ResolveMode>().unwrap(), ResolveMode::Nearest);
        assert_eq!("first".parse::<ResolveMode>().unwrap(), ResolveMode::First);
        assert!(matches!(
            "soonest".parse::<ResolveMode>(),
            Err(EngineError::InvalidMode(_))
        ));
    }

    #[test]
    fn should_build_entries_from_mixed_listing() {
        let paths = vec![
            "CONUS/p/20230821/MRMS_p_20230821-020000.grib2.gz".to_string(),
            "CONUS/p/20230821/README.txt".to_string(),
        ];
        let entries = ArchiveEntry::from_listing(&paths);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].timestamp, at(2, 0));
    }
}
