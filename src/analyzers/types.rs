//! Historical record types and the trend report built from them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One festival year of mandal and household counts (`crowd_data.csv`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrowdYear {
    pub year: i32,
    pub valuablemandals: u32,
    pub largemandals: u32,
    pub smallmandals: u32,
    pub householdganpatis: u32,
    pub totalpublicmandals: u32,
    pub notes: String,
}

/// One recorded incident (`incidents_data.csv`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    pub year: i32,
    pub date: Option<NaiveDate>,
    pub incidenttype: String,
    pub location: String,
    pub policestation: String,
    pub fatalities: u32,
    pub severity: String,
    pub ipcsections: Option<String>,
    pub details: String,
}

/// One monsoon season (`weather_data.csv`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherYear {
    pub year: i32,
    pub nashikmonsoonrainfallmm: u32,
    pub gangapurdamdischargecusecs: Option<u32>,
    pub floodrisklevel: String,
    pub weatherimpactonfestival: String,
    pub notableevents: String,
}

impl WeatherYear {
    pub fn is_high_flood_risk(&self) -> bool {
        matches!(self.floodrisklevel.as_str(), "high" | "veryhigh")
    }

    /// Unrecognised levels are neither high nor low.
    pub fn is_low_flood_risk(&self) -> bool {
        matches!(self.floodrisklevel.as_str(), "low" | "moderate")
    }
}

/// All historical series together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub crowd: Vec<CrowdYear>,
    pub incidents: Vec<IncidentRecord>,
    pub weather: Vec<WeatherYear>,
}

/// Incident totals for one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearIncidents {
    pub year: i32,
    pub total_incidents: usize,
    pub total_fatalities: u32,
}

/// The year with the most household ganpatis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakYear {
    pub year: i32,
    pub households: u32,
}

/// Year-over-year household drop across the COVID lockdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CovidImpact {
    pub year: i32,
    pub households: u32,
    pub drop_pct: f64,
}

/// Average fatalities split by flood-risk level of the year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherCorrelation {
    pub high_risk_years: Vec<i32>,
    pub avg_fatalities_high_risk: f64,
    pub avg_fatalities_low_risk: f64,
}

/// Next-year expectations derived from the recovery trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub year: i32,
    pub base_year: i32,
    pub annual_growth_pct: f64,
    pub households: u64,
    pub public_mandals: u32,
}

/// Complete historical trend analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub generated_at: DateTime<Utc>,
    pub first_year: i32,
    pub last_year: i32,
    pub avg_public_mandals: f64,
    pub avg_households: f64,
    pub household_stddev: f64,
    pub peak: Option<PeakYear>,
    pub covid_impact: Option<CovidImpact>,
    pub incidents_by_year: Vec<YearIncidents>,
    pub total_incidents: usize,
    pub total_fatalities: u32,
    pub fatal_incidents: usize,
    pub drowning_incidents: usize,
    pub drowning_deaths: u32,
    pub godavari_drownings: usize,
    pub weather: WeatherCorrelation,
    pub prediction: Option<Prediction>,
}
