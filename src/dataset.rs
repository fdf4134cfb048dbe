//! The canonical festival dataset.
//!
//! All planning tables and charts are derived from one JSON document. The
//! default document is compiled into the binary; a different file can be
//! loaded with [`FestivalDataset::load`]. Either way the dataset is validated
//! before it is handed out.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::analyzers::risk::{RiskScale, RiskTier};
use crate::analyzers::types::History;

const EMBEDDED: &str = include_str!("../data/ganpati_2025.json");

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse dataset: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("dataset section '{0}' is empty")]
    EmptySection(&'static str),

    #[error("timeline dates must strictly increase: {previous} then {next}")]
    DateOrder { previous: NaiveDate, next: NaiveDate },

    #[error("history years must strictly increase in '{section}': {previous} then {next}")]
    YearOrder {
        section: &'static str,
        previous: i32,
        next: i32,
    },

    #[error("duplicate {kind} '{name}'")]
    Duplicate { kind: &'static str, name: String },

    #[error("zone '{zone}' allocates undeclared equipment '{equipment}'")]
    UnknownEquipment { zone: String, equipment: String },

    #[error("equipment '{equipment}' is over-allocated: {allocated} across zones, {total} declared")]
    OverAllocated {
        equipment: String,
        allocated: u32,
        total: u32,
    },
}

/// Festival identity used in titles and filenames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FestivalInfo {
    pub name: String,
    pub city: String,
    pub year: i32,
}

/// Traffic diversion level for a festival day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TrafficDiversion {
    None,
    Minor,
    Major,
    Critical,
}

impl fmt::Display for TrafficDiversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrafficDiversion::None => "None",
            TrafficDiversion::Minor => "Minor",
            TrafficDiversion::Major => "Major",
            TrafficDiversion::Critical => "Critical",
        };
        f.write_str(label)
    }
}

/// One festival day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub date: NaiveDate,
    pub label: String,
    pub risk_tier: RiskTier,
    pub estimated_crowd_size: u32,
    pub personnel_assigned: u32,
    pub medical_teams: u32,
    pub traffic_diversion: TrafficDiversion,
}

/// Officers and equipment posted to one zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneAllocation {
    pub zone_name: String,
    pub officer_counts_by_rank: IndexMap<String, u32>,
    pub equipment_counts_by_type: IndexMap<String, u32>,
    pub peak_crowd_expected: String,
    pub critical_hours: String,
    pub responsibilities: String,
}

impl ZoneAllocation {
    pub fn total_personnel(&self) -> u32 {
        self.officer_counts_by_rank.values().sum()
    }

    pub fn officers(&self, rank: &str) -> u32 {
        self.officer_counts_by_rank.get(rank).copied().unwrap_or(0)
    }

    pub fn equipment(&self, equipment_type: &str) -> u32 {
        self.equipment_counts_by_type
            .get(equipment_type)
            .copied()
            .unwrap_or(0)
    }
}

/// Declared city-wide stock of one equipment type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentType {
    pub equipment_type: String,
    pub total_quantity: u32,
    pub primary_location: String,
    #[serde(default)]
    pub primary_use: String,
    #[serde(default)]
    pub deployment_zone: String,
}

/// Historical risk profile of an immersion site or hotspot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRiskScore {
    pub location_name: String,
    pub incident_count: u32,
    pub fatality_count: u32,
    pub numeric_risk_score: u32,
    pub recommended_personnel: u32,
}

/// One weather parameter under watch during the festival.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherProtocol {
    pub parameter: String,
    pub monitoring_frequency: String,
    pub critical_threshold: String,
    pub action_required: String,
    pub responsible_agency: String,
}

/// Personnel posted to one police station or unit.
///
/// `coverage` is either a risk tier label or a descriptive label such as
/// `City-wide` or `Mobile`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationDeployment {
    pub station: String,
    pub personnel: u32,
    pub coverage: String,
    pub responsibility: String,
}

impl StationDeployment {
    pub fn tier(&self) -> Option<RiskTier> {
        self.coverage.parse().ok()
    }
}

/// One hour of the main immersion day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySlot {
    pub hour: String,
    pub personnel: u32,
    pub crowd: u32,
    pub risk_tier: RiskTier,
    #[serde(default)]
    pub key_event: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPlan {
    pub date: NaiveDate,
    pub title: String,
    pub slots: Vec<HourlySlot>,
}

/// Everything the planner knows about one festival season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FestivalDataset {
    pub festival: FestivalInfo,
    #[serde(default)]
    pub risk_scale: RiskScale,
    pub timeline: Vec<TimelineEntry>,
    pub zones: Vec<ZoneAllocation>,
    pub equipment: Vec<EquipmentType>,
    pub locations: Vec<LocationRiskScore>,
    pub weather_monitoring: Vec<WeatherProtocol>,
    pub stations: Vec<StationDeployment>,
    pub hourly_plan: HourlyPlan,
    pub history: History,
}

impl FestivalDataset {
    /// The dataset compiled into the binary.
    pub fn embedded() -> Result<Self, DatasetError> {
        Self::from_json_str(EMBEDDED)
    }

    /// Loads and validates a dataset from a JSON file.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let content = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset = Self::from_json_str(&content)?;
        info!(path = %path.display(), "Dataset loaded from file");
        Ok(dataset)
    }

    pub fn from_json_str(content: &str) -> Result<Self, DatasetError> {
        let dataset: FestivalDataset = serde_json::from_str(content)?;
        dataset.validate()?;
        debug!(
            festival = %dataset.festival.name,
            year = dataset.festival.year,
            days = dataset.timeline.len(),
            zones = dataset.zones.len(),
            locations = dataset.locations.len(),
            "Dataset validated"
        );
        Ok(dataset)
    }

    /// Checks the cross-record invariants serde cannot express.
    pub fn validate(&self) -> Result<(), DatasetError> {
        if self.timeline.is_empty() {
            return Err(DatasetError::EmptySection("timeline"));
        }
        if self.zones.is_empty() {
            return Err(DatasetError::EmptySection("zones"));
        }

        for pair in self.timeline.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(DatasetError::DateOrder {
                    previous: pair[0].date,
                    next: pair[1].date,
                });
            }
        }

        ensure_unique("zone", self.zones.iter().map(|z| z.zone_name.as_str()))?;
        ensure_unique(
            "equipment type",
            self.equipment.iter().map(|e| e.equipment_type.as_str()),
        )?;
        ensure_unique(
            "location",
            self.locations.iter().map(|l| l.location_name.as_str()),
        )?;
        ensure_unique("station", self.stations.iter().map(|s| s.station.as_str()))?;

        self.validate_equipment()?;

        ensure_increasing("crowd", self.history.crowd.iter().map(|c| c.year))?;
        ensure_increasing("weather", self.history.weather.iter().map(|w| w.year))?;

        Ok(())
    }

    /// Per-type sums across zones must not exceed the declared totals.
    fn validate_equipment(&self) -> Result<(), DatasetError> {
        for zone in &self.zones {
            for equipment in zone.equipment_counts_by_type.keys() {
                if !self.equipment.iter().any(|e| &e.equipment_type == equipment) {
                    return Err(DatasetError::UnknownEquipment {
                        zone: zone.zone_name.clone(),
                        equipment: equipment.clone(),
                    });
                }
            }
        }

        for declared in &self.equipment {
            let allocated = self.allocated(&declared.equipment_type);
            if allocated > declared.total_quantity {
                return Err(DatasetError::OverAllocated {
                    equipment: declared.equipment_type.clone(),
                    allocated,
                    total: declared.total_quantity,
                });
            }
        }

        Ok(())
    }

    /// Units of an equipment type handed out across all zones.
    pub fn allocated(&self, equipment_type: &str) -> u32 {
        self.zones.iter().map(|z| z.equipment(equipment_type)).sum()
    }

    /// Rank labels in first-seen order across zones.
    pub fn rank_labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for zone in &self.zones {
            for rank in zone.officer_counts_by_rank.keys() {
                if !labels.contains(&rank.as_str()) {
                    labels.push(rank);
                }
            }
        }
        labels
    }

    /// Peak single-day personnel requirement.
    pub fn peak_personnel(&self) -> u32 {
        self.timeline
            .iter()
            .map(|d| d.personnel_assigned)
            .max()
            .unwrap_or(0)
    }

    /// The location with the highest risk score; ties keep the first listed.
    pub fn highest_risk_location(&self) -> Option<&LocationRiskScore> {
        self.locations.iter().reduce(|best, l| {
            if l.numeric_risk_score > best.numeric_risk_score {
                l
            } else {
                best
            }
        })
    }
}

fn ensure_unique<'a>(
    kind: &'static str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), DatasetError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(DatasetError::Duplicate {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

fn ensure_increasing(
    section: &'static str,
    years: impl Iterator<Item = i32>,
) -> Result<(), DatasetError> {
    let mut previous: Option<i32> = None;
    for year in years {
        if let Some(prev) = previous {
            if year <= prev {
                return Err(DatasetError::YearOrder {
                    section,
                    previous: prev,
                    next: year,
                });
            }
        }
        previous = Some(year);
    }
    Ok(())
}
