//! Rain-gauge station metadata.
//!
//! One CSV maps station id to coordinates. Ids at or below zero mark retired
//! or placeholder rows and never reach the engine.

use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
}

/// Loads valid stations (id > 0) from the metadata file.
pub fn load_stations(path: &Path) -> EngineResult<Vec<Station>> {
    let file = File::open(path).map_err(|e| {
        EngineError::InvalidInput(format!("station metadata {}: {}", path.display(), e))
    })?;
    let mut lines = io::BufReader::new(file).lines();

    let header = match lines.next() {
        Some(line) => line?,
        None => {
            return Err(EngineError::InvalidInput(format!(
                "station metadata {} is empty",
                path.display()
            )))
        }
    };
    let columns = ColumnIndex::from_header(&header, path)?;

    let mut stations = Vec::new();
    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if let Some(station) = columns.parse_row(&line) {
            if station.id > 0 {
                stations.push(station);
            }
        }
    }

    Ok(stations)
}

// Column positions resolved from the header row, so extra metadata columns
// (names, install dates) don't matter.
struct ColumnIndex {
    id: usize,
    lat: usize,
    lon: usize,
}

impl ColumnIndex {
    fn from_header(header: &str, path: &Path) -> EngineResult<Self> {
        let names: Vec<&str> = header.split(',').map(str::trim).collect();
        let find = |name: &str| names.iter().position(|&n| n == name);

        match (find("station_id"), find("lat"), find("lon")) {
            (Some(id), Some(lat), Some(lon)) => Ok(Self { id, lat, lon }),
            _ => Err(EngineError::InvalidInput(format!(
                "station metadata {} lacks station_id/lat/lon columns",
                path.display()
            ))),
        }
    }

    fn parse_row(&self, line: &str) -> Option<Station> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();

        Some(Station {
            id: fields.get(self.id)?.parse().ok()?,
            lat: fields.get(self.lat)?.parse().ok()?,
            lon: fields.get(self.lon)?.parse().ok()?,
        })
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn metadata_fixture(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn should_load_valid_stations_only() {
        let file = metadata_fixture(
            "station_id,name,lat,lon\n\
             4724,FLAMINGO,36.114,-115.172\n\
             -1,RETIRED,36.0,-115.0\n\
             0,PLACEHOLDER,36.0,-115.0\n\
             217,DURANGO,36.020,-115.260\n",
        );

        let stations = load_stations(file.path()).unwrap();

        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0], Station { id: 4724, lat: 36.114, lon: -115.172 });
        assert_eq!(stations[1].id, 217);
    }

    #[test]
    fn should_skip_malformed_rows() {
        let file = metadata_fixture(
            "station_id,lat,lon\n\
             4724,36.114,-115.172\n\
             not,a,row\n",
        );

        let stations = load_stations(file.path()).unwrap();
        assert_eq!(stations.len(), 1);
    }

    #[test]
    fn should_fail_without_required_columns() {
        let file = metadata_fixture("id,latitude,longitude\n1,36.0,-115.0\n");

        let err = load_stations(file.path()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn should_fail_on_missing_file() {
        let err = load_stations(Path::new("/nonexistent/metadata.csv")).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }
}
