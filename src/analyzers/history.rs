//! Historical CSV files: crowd counts, incidents and monsoon seasons.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzers::types::History;

pub const CROWD_FILE: &str = "crowd_data.csv";
pub const INCIDENTS_FILE: &str = "incidents_data.csv";
pub const WEATHER_FILE: &str = "weather_data.csv";

/// Writes the three historical CSVs into `dir`, overwriting existing files.
///
/// Returns the paths written, in crowd, incidents, weather order.
pub fn write_history(dir: &Path, history: &History) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create history directory {}", dir.display()))?;

    let paths = vec![
        write_rows(&dir.join(CROWD_FILE), &history.crowd)?,
        write_rows(&dir.join(INCIDENTS_FILE), &history.incidents)?,
        write_rows(&dir.join(WEATHER_FILE), &history.weather)?,
    ];

    info!(dir = %dir.display(), files = paths.len(), "Historical data files written");
    Ok(paths)
}

/// Reads the three historical CSVs from `dir`. A missing file is an error.
pub fn load_history(dir: &Path) -> Result<History> {
    let history = History {
        crowd: load_rows(&dir.join(CROWD_FILE))?,
        incidents: load_rows(&dir.join(INCIDENTS_FILE))?,
        weather: load_rows(&dir.join(WEATHER_FILE))?,
    };

    info!(
        crowd_years = history.crowd.len(),
        incidents = history.incidents.len(),
        weather_years = history.weather.len(),
        "Historical data loaded"
    );
    Ok(history)
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<PathBuf> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    debug!(path = %path.display(), rows = rows.len(), "History file written");
    Ok(path.to_path_buf())
}

fn load_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut rdr = csv::Reader::from_reader(file);
    let mut rows = Vec::new();

    for result in rdr.deserialize() {
        let record: T = result.with_context(|| format!("Malformed row in {}", path.display()))?;
        rows.push(record);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::{CrowdYear, IncidentRecord, WeatherYear};
    use chrono::NaiveDate;

    fn sample() -> History {
        History {
            crowd: vec![CrowdYear {
                year: 2024,
                valuablemandals: 3,
                largemandals: 22,
                smallmandals: 36,
                householdganpatis: 23000,
                totalpublicmandals: 61,
                notes: "Highest household count - full recovery".to_string(),
            }],
            incidents: vec![
                IncidentRecord {
                    year: 2022,
                    date: NaiveDate::from_ymd_opt(2022, 9, 9),
                    incidenttype: "assault".to_string(),
                    location: "Panchavati area".to_string(),
                    policestation: "Panchavati PS".to_string(),
                    fatalities: 0,
                    severity: "serious".to_string(),
                    ipcsections: Some("326,324,323,504,34".to_string()),
                    details: "Knife assault during procession dispute at 2045".to_string(),
                },
                IncidentRecord {
                    year: 2017,
                    date: None,
                    incidenttype: "drowning".to_string(),
                    location: "Darana River".to_string(),
                    policestation: "Nashik Road PS".to_string(),
                    fatalities: 1,
                    severity: "fatal".to_string(),
                    ipcsections: None,
                    details: "Ganpati immersion drowning".to_string(),
                },
            ],
            weather: vec![WeatherYear {
                year: 2015,
                nashikmonsoonrainfallmm: 429,
                gangapurdamdischargecusecs: None,
                floodrisklevel: "low".to_string(),
                weatherimpactonfestival: "minimal".to_string(),
                notableevents: "Lowest rainfall in study period".to_string(),
            }],
        }
    }

    #[test]
    fn test_write_then_load_history() {
        let dir = tempfile::tempdir().unwrap();
        let history = sample();

        let paths = write_history(dir.path(), &history).unwrap();
        assert_eq!(paths.len(), 3);
        assert!(dir.path().join(INCIDENTS_FILE).exists());

        let loaded = load_history(dir.path()).unwrap();
        assert_eq!(loaded, history);
    }

    #[test]
    fn test_incident_header_matches_source_layout() {
        let dir = tempfile::tempdir().unwrap();
        write_history(dir.path(), &sample()).unwrap();

        let content = std::fs::read_to_string(dir.path().join(INCIDENTS_FILE)).unwrap();
        assert_eq!(
            content.lines().next().unwrap(),
            "year,date,incidenttype,location,policestation,fatalities,severity,ipcsections,details"
        );
        assert!(content.contains("\"326,324,323,504,34\""));
        assert!(content.contains("2017,,drowning"));
    }

    #[test]
    fn test_load_history_missing_file_names_it() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_history(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains(CROWD_FILE));
    }
}
