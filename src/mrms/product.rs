//! MRMS product codes and their window steps.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;

use crate::error::{EngineError, EngineResult};

/// Radar-only QPE products carried by the `noaa-mrms-pds` archive.
///
/// The 15-minute and 48-hour variants exist in the archive but are not
/// supported here; parsing them fails with `UnsupportedProduct` rather than
/// silently defaulting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MrmsProduct {
    RadarOnlyQpe01H,
    RadarOnlyQpe03H,
    RadarOnlyQpe06H,
    RadarOnlyQpe12H,
    RadarOnlyQpe24H,
}

impl MrmsProduct {
    /// Directory name under the domain prefix, level suffix included.
    pub fn archive_code(&self) -> &'static str {
        match self {
            MrmsProduct::RadarOnlyQpe01H => "RadarOnly_QPE_01H_00.00",
            MrmsProduct::RadarOnlyQpe03H => "RadarOnly_QPE_03H_00.00",
            MrmsProduct::RadarOnlyQpe06H => "RadarOnly_QPE_06H_00.00",
            MrmsProduct::RadarOnlyQpe12H => "RadarOnly_QPE_12H_00.00",
            MrmsProduct::RadarOnlyQpe24H => "RadarOnly_QPE_24H_00.00",
        }
    }

    /// Accumulation period, which is also the pipeline's default window step.
    pub fn step(&self) -> Duration {
        match self {
            MrmsProduct::RadarOnlyQpe01H => Duration::hours(1),
            MrmsProduct::RadarOnlyQpe03H => Duration::hours(3),
            MrmsProduct::RadarOnlyQpe06H => Duration::hours(6),
            MrmsProduct::RadarOnlyQpe12H => Duration::hours(12),
            MrmsProduct::RadarOnlyQpe24H => Duration::hours(24),
        }
    }

    /// Whether a whole calendar day of snapshots should be fetched in one
    /// batch. Only worthwhile for the hourly product, where one day's listing
    /// serves up to 24 windows.
    pub fn batch_by_day(&self) -> bool {
        matches!(self, MrmsProduct::RadarOnlyQpe01H)
    }
}

impl FromStr for MrmsProduct {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        match s {
            "RadarOnly_QPE_01H" | "RadarOnly_QPE_01H_00.00" => Ok(MrmsProduct::RadarOnlyQpe01H),
            "RadarOnly_QPE_03H" | "RadarOnly_QPE_03H_00.00" => Ok(MrmsProduct::RadarOnlyQpe03H),
            "RadarOnly_QPE_06H" | "RadarOnly_QPE_06H_00.00" => Ok(MrmsProduct::RadarOnlyQpe06H),
            "RadarOnly_QPE_12H" | "RadarOnly_QPE_12H_00.00" => Ok(MrmsProduct::RadarOnlyQpe12H),
            "RadarOnly_QPE_24H" | "RadarOnly_QPE_24H_00.00" => Ok(MrmsProduct::RadarOnlyQpe24H),
            other => Err(EngineError::UnsupportedProduct(other.to_string())),
        }
    }
}

impl fmt::Display for MrmsProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.archive_code())
    }
}

// -- Tests -------------------------------------------------------------------
