//! Archive path layout for the MRMS object store.
//!
//! Objects are laid out as
//! `{DOMAIN}/{PRODUCT}/{YYYYMMDD}/MRMS_{PRODUCT}_{yyyymmdd}-{hhmmss}.grib2.gz`
//! and the file name is the only place the valid time is encoded.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::mrms::product::MrmsProduct;

pub const DOMAIN_CONUS: &str = "CONUS";

/// Listing prefix for one product and one calendar day.
pub fn day_prefix(domain: &str, product: MrmsProduct, date: NaiveDate) -> String {
    format!(
        "{}/{}/{}",
        domain,
        product.archive_code(),
        date.format("%Y%m%d")
    )
}

/// Parses the valid time embedded in an archive object path.
///
/// Returns `None` for objects that do not follow the
/// `MRMS_*_{yyyymmdd}-{hhmmss}.grib2.gz` naming, so listings containing
/// unrelated objects can be filtered rather than failed.
pub fn parse_valid_time(path: &str) -> Option<DateTime<Utc>> {
    let name = path.rsplit('/').next()?;
    let stem = name.strip_suffix(".grib2.gz")?;
    if !stem.starts_with("MRMS_") {
        return None;
    }
    let (_, stamp) = stem.rsplit_once('_')?;

    NaiveDateTime::parse_from_str(stamp, "%Y%m%d-%H%M%S")
        .ok()
        .map(|dt| dt.and_utc())
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn should_build_day_prefix() {
        let date = NaiveDate::from_ymd_opt(2023, 8, 21).unwrap();
        let prefix = day_prefix(DOMAIN_CONUS, MrmsProduct::RadarOnlyQpe01H, date);

        assert_eq!(prefix, "CONUS/RadarOnly_QPE_01H_00.00/20230821");
    }

    #[test]
    fn should_parse_valid_time_from_path() {
        let path =
            "CONUS/RadarOnly_QPE_01H_00.00/20230821/MRMS_RadarOnly_QPE_01H_00.00_20230821-023822.grib2.gz";
        let t = parse_valid_time(path).unwrap();

        assert_eq!(t.to_rfc3339(), "2023-08-21T02:38:22+00:00");
    }

    #[test]
    fn should_reject_foreign_names() {
        assert!(parse_valid_time("CONUS/RadarOnly_QPE_01H_00.00/20230821/index.html").is_none());
        assert!(parse_valid_time("MRMS_RadarOnly_QPE_01H_00.00_20230821.grib2.gz").is_none());
        assert!(parse_valid_time("Other_20230821-023822.grib2.gz").is_none());
    }
}
