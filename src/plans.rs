//! Planning tables derived from the festival dataset.
//!
//! Each builder returns a validated [`Table`]; [`planning_tables`] pairs every
//! table with the CSV filename it is published under.

use crate::analyzers::risk::{RiskScale, RiskTier};
use crate::dataset::FestivalDataset;
use crate::table::{Cell, Column, Table, TableError};

type Result<T> = core::result::Result<T, TableError>;

/// A table together with the filename it is exported to.
#[derive(Debug, Clone)]
pub struct NamedTable {
    pub file_name: String,
    pub table: Table,
}

/// Every planning table, in publication order.
pub fn planning_tables(dataset: &FestivalDataset) -> Result<Vec<NamedTable>> {
    let prefix = file_prefix(dataset);
    let year = dataset.festival.year;
    let historical = format!("{}_historical_incident_analysis.csv", slug(&dataset.festival.name));

    let tables = vec![
        (format!("{prefix}_daily_operations.csv"), daily_operations(dataset)?),
        (format!("{prefix}_critical_dates.csv"), critical_dates(dataset)?),
        (format!("{prefix}_zone_deployment.csv"), zone_deployment(dataset)?),
        (format!("{prefix}_resource_allocation.csv"), resource_allocation(dataset)?),
        (format!("{prefix}_equipment_deployment.csv"), equipment_deployment(dataset)?),
        (format!("{prefix}_equipment_details.csv"), equipment_details(dataset)?),
        (historical, incident_analysis(dataset)?),
        (format!("{prefix}_risk_locations.csv"), risk_locations(dataset)?),
        (format!("{prefix}_weather_monitoring.csv"), weather_monitoring(dataset)?),
        (format!("{prefix}_station_deployment.csv"), station_deployment(dataset)?),
        (format!("{prefix}_{}_hourly.csv", slug(&hourly_label(dataset))), hourly_plan(dataset)?),
    ];

    tracing::debug!(year, tables = tables.len(), "Planning tables built");

    Ok(tables
        .into_iter()
        .map(|(file_name, table)| NamedTable { file_name, table })
        .collect())
}

/// `ganpati_2025` for the Ganpati 2025 dataset.
pub fn file_prefix(dataset: &FestivalDataset) -> String {
    format!("{}_{}", slug(&dataset.festival.name), dataset.festival.year)
}

/// Lowercase, underscore-separated form of a label.
pub fn slug(label: &str) -> String {
    label
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Leading part of the hourly plan title, e.g. `Anant Chaturdashi`.
pub fn hourly_label(dataset: &FestivalDataset) -> String {
    let title = dataset.hourly_plan.title.as_str();
    title.split(" Plan").next().unwrap_or(title).to_string()
}

pub fn daily_operations(dataset: &FestivalDataset) -> Result<Table> {
    let days = &dataset.timeline;
    Table::from_columns(vec![
        Column::dates("Date", days.iter().map(|d| d.date)),
        Column::text("Event", days.iter().map(|d| d.label.as_str())),
        Column::text("Risk_Level", days.iter().map(|d| d.risk_tier.label())),
        Column::counts("Estimated_Crowd", days.iter().map(|d| d.estimated_crowd_size)),
        Column::counts("Personnel_Required", days.iter().map(|d| d.personnel_assigned)),
        Column::counts("Medical_Teams", days.iter().map(|d| d.medical_teams)),
        Column::text(
            "Traffic_Diversions",
            days.iter().map(|d| d.traffic_diversion.to_string()),
        ),
    ])
}

/// Days at High risk or above.
pub fn critical_dates(dataset: &FestivalDataset) -> Result<Table> {
    let daily = daily_operations(dataset)?;
    let critical = daily.filter(|row| {
        row.get("Risk_Level")
            .map(ToString::to_string)
            .and_then(|label| label.parse::<RiskTier>().ok())
            .is_some_and(|tier| tier.is_elevated())
    });
    critical.select(&[
        "Date",
        "Event",
        "Risk_Level",
        "Estimated_Crowd",
        "Personnel_Required",
        "Medical_Teams",
    ])
}

/// One row per zone: every rank as a column, then the derived total.
pub fn zone_deployment(dataset: &FestivalDataset) -> Result<Table> {
    let zones = &dataset.zones;
    let ranks = dataset.rank_labels();

    let mut columns = vec![Column::text("Zone", zones.iter().map(|z| z.zone_name.as_str()))];
    for rank in &ranks {
        columns.push(Column::counts(*rank, zones.iter().map(|z| z.officers(rank))));
    }

    Table::from_columns(columns)?
        .with_sum("Total_Personnel", &ranks)?
        .with_column(Column::text(
            "Peak_Crowd_Expected",
            zones.iter().map(|z| z.peak_crowd_expected.as_str()),
        ))?
        .with_column(Column::text(
            "Critical_Hours",
            zones.iter().map(|z| z.critical_hours.as_str()),
        ))?
        .with_column(Column::text(
            "Main_Responsibilities",
            zones.iter().map(|z| z.responsibilities.as_str()),
        ))
}

/// One row per rank: city-wide total, then each zone's share.
pub fn resource_allocation(dataset: &FestivalDataset) -> Result<Table> {
    let ranks = dataset.rank_labels();
    let mut columns = vec![Column::text("Resource_Type", ranks.iter().copied())];

    let zone_columns: Vec<Column> = dataset
        .zones
        .iter()
        .enumerate()
        .map(|(i, zone)| {
            Column::counts(
                format!("Zone_{}", i + 1),
                ranks.iter().map(|rank| zone.officers(rank)),
            )
        })
        .collect();
    let zone_names: Vec<String> = zone_columns.iter().map(|c| c.name().to_string()).collect();
    columns.extend(zone_columns);

    let zone_refs: Vec<&str> = zone_names.iter().map(String::as_str).collect();
    let table = Table::from_columns(columns)?.with_sum("Total_Count", &zone_refs)?;

    let mut order = vec!["Resource_Type", "Total_Count"];
    order.extend(zone_refs);
    table.select(&order)
}

/// One row per equipment type with per-zone allocation and the unallocated
/// remainder.
pub fn equipment_deployment(dataset: &FestivalDataset) -> Result<Table> {
    let equipment = &dataset.equipment;

    let mut columns = vec![
        Column::text(
            "Equipment_Type",
            equipment.iter().map(|e| e.equipment_type.as_str()),
        ),
        Column::counts("Total_Quantity", equipment.iter().map(|e| e.total_quantity)),
    ];
    for (i, zone) in dataset.zones.iter().enumerate() {
        columns.push(Column::counts(
            format!("Zone_{}_Allocation", i + 1),
            equipment.iter().map(|e| zone.equipment(&e.equipment_type)),
        ));
    }
    columns.push(Column::counts(
        "Unallocated",
        equipment
            .iter()
            .map(|e| e.total_quantity.saturating_sub(dataset.allocated(&e.equipment_type))),
    ));
    columns.push(Column::text(
        "Primary_Location",
        equipment.iter().map(|e| e.primary_location.as_str()),
    ));

    Table::from_columns(columns)
}

/// What each equipment type is for and where it goes.
pub fn equipment_details(dataset: &FestivalDataset) -> Result<Table> {
    let equipment = &dataset.equipment;
    Table::from_columns(vec![
        Column::text("Equipment", equipment.iter().map(|e| e.equipment_type.as_str())),
        Column::counts("Quantity", equipment.iter().map(|e| e.total_quantity)),
        Column::text("Primary_Use", equipment.iter().map(|e| e.primary_use.as_str())),
        Column::text(
            "Deployment_Zone",
            equipment.iter().map(|e| e.deployment_zone.as_str()),
        ),
    ])
}

/// Locations with at least this many past incidents count as high-risk.
pub const HIGH_RISK_MIN_INCIDENTS: u32 = 2;

/// Incident total column named after the history span, e.g.
/// `Total_Incidents_2015_2024`.
pub fn incidents_column(dataset: &FestivalDataset) -> String {
    let first = dataset.history.crowd.first().map_or(0, |c| c.year);
    let last = dataset.history.crowd.last().map_or(0, |c| c.year);
    format!("Total_Incidents_{first}_{last}")
}

pub fn incident_analysis(dataset: &FestivalDataset) -> Result<Table> {
    let locations = &dataset.locations;
    let scale = &dataset.risk_scale;

    Table::from_columns(vec![
        Column::text("Location", locations.iter().map(|l| l.location_name.as_str())),
        Column::counts(
            incidents_column(dataset),
            locations.iter().map(|l| l.incident_count),
        ),
        Column::counts("Fatalities", locations.iter().map(|l| l.fatality_count)),
        Column::counts("Risk_Score", locations.iter().map(|l| l.numeric_risk_score)),
        Column::counts(
            "Recommended_Personnel",
            locations.iter().map(|l| l.recommended_personnel),
        ),
        priority_column("Priority_Level", dataset, scale),
    ])
}

/// Locations with a repeated incident history, for the summary.
pub fn high_risk_locations(dataset: &FestivalDataset) -> Result<Table> {
    let column = incidents_column(dataset);
    incident_analysis(dataset)?
        .filter(|row| {
            row.get(&column)
                .and_then(Cell::as_f64)
                .is_some_and(|n| n >= f64::from(HIGH_RISK_MIN_INCIDENTS))
        })
        .select(&["Location", column.as_str(), "Fatalities", "Recommended_Personnel"])
}

/// Zone deployment cut down to ranks, totals and expected crowd.
pub fn zone_summary(dataset: &FestivalDataset) -> Result<Table> {
    let mut keep = vec!["Zone"];
    keep.extend(dataset.rank_labels());
    keep.extend(["Total_Personnel", "Peak_Crowd_Expected"]);
    zone_deployment(dataset)?.select(&keep)
}

pub fn risk_locations(dataset: &FestivalDataset) -> Result<Table> {
    let locations = &dataset.locations;
    Table::from_columns(vec![
        Column::text("Location", locations.iter().map(|l| l.location_name.as_str())),
        Column::counts("Risk_Score", locations.iter().map(|l| l.numeric_risk_score)),
        Column::counts(
            "Historical_Incidents",
            locations.iter().map(|l| l.incident_count),
        ),
        Column::counts("Fatalities", locations.iter().map(|l| l.fatality_count)),
        Column::counts(
            "Personnel_Needed",
            locations.iter().map(|l| l.recommended_personnel),
        ),
        priority_column("Risk_Category", dataset, &dataset.risk_scale),
    ])
}

fn priority_column(name: &str, dataset: &FestivalDataset, scale: &RiskScale) -> Column {
    Column::text(
        name,
        dataset
            .locations
            .iter()
            .map(|l| scale.categorize(l.numeric_risk_score).label()),
    )
}

pub fn weather_monitoring(dataset: &FestivalDataset) -> Result<Table> {
    let rows = &dataset.weather_monitoring;
    Table::from_columns(vec![
        Column::text("Parameter", rows.iter().map(|w| w.parameter.as_str())),
        Column::text(
            "Monitoring_Frequency",
            rows.iter().map(|w| w.monitoring_frequency.as_str()),
        ),
        Column::text(
            "Critical_Threshold",
            rows.iter().map(|w| w.critical_threshold.as_str()),
        ),
        Column::text(
            "Action_Required",
            rows.iter().map(|w| w.action_required.as_str()),
        ),
        Column::text(
            "Responsible_Agency",
            rows.iter().map(|w| w.responsible_agency.as_str()),
        ),
    ])
}

pub fn station_deployment(dataset: &FestivalDataset) -> Result<Table> {
    let stations = &dataset.stations;
    Table::from_columns(vec![
        Column::text("Station", stations.iter().map(|s| s.station.as_str())),
        Column::counts("Personnel", stations.iter().map(|s| s.personnel)),
        Column::text("Coverage", stations.iter().map(|s| s.coverage.as_str())),
        Column::text(
            "Responsibility",
            stations.iter().map(|s| s.responsibility.as_str()),
        ),
    ])?
    .with_share_of_total("Share_Pct", "Personnel")
}

pub fn hourly_plan(dataset: &FestivalDataset) -> Result<Table> {
    let slots = &dataset.hourly_plan.slots;
    Table::from_columns(vec![
        Column::text("Hour", slots.iter().map(|s| s.hour.as_str())),
        Column::counts("Personnel", slots.iter().map(|s| s.personnel)),
        Column::counts("Crowd", slots.iter().map(|s| s.crowd)),
        Column::text("Risk_Level", slots.iter().map(|s| s.risk_tier.label())),
        Column::new(
            "Key_Event",
            slots
                .iter()
                .map(|s| match &s.key_event {
                    Some(event) => Cell::Text(event.clone()),
                    None => Cell::Empty,
                })
                .collect(),
        ),
    ])?
    .with_ratio("Crowd_Per_Officer", "Crowd", "Personnel")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> FestivalDataset {
        FestivalDataset::embedded().unwrap()
    }

    #[test]
    fn test_slug_and_prefix() {
        assert_eq!(slug("Anant Chaturdashi"), "anant_chaturdashi");
        assert_eq!(slug("Zone 1 - Panchavati"), "zone_1_panchavati");
        assert_eq!(file_prefix(&dataset()), "ganpati_2025");
    }

    #[test]
    fn test_planning_table_filenames() {
        let tables = planning_tables(&dataset()).unwrap();
        let names: Vec<_> = tables.iter().map(|t| t.file_name.as_str()).collect();

        assert!(names.contains(&"ganpati_2025_daily_operations.csv"));
        assert!(names.contains(&"ganpati_historical_incident_analysis.csv"));
        assert!(names.contains(&"ganpati_2025_anant_chaturdashi_hourly.csv"));
        assert_eq!(names[5], "ganpati_2025_equipment_details.csv");
        assert_eq!(names.len(), 11);
    }

    #[test]
    fn test_daily_operations_shape() {
        let table = daily_operations(&dataset()).unwrap();
        assert_eq!(table.row_count(), 29);
        assert_eq!(table.column_count(), 7);
        assert_eq!(table.column("Date").unwrap().to_strings()[0], "2025-08-20");
        assert_eq!(table.max("Personnel_Required").unwrap(), Some(2655.0));
    }

    #[test]
    fn test_critical_dates_keep_high_and_above() {
        let table = critical_dates(&dataset()).unwrap();
        let events = table.column("Event").unwrap().to_strings();

        assert_eq!(
            events,
            [
                "Gauri Pujan",
                "Gauri Visarjan",
                "Eid Coincidence",
                "7-Day Visarjan",
                "Anant Chaturdashi"
            ]
        );
    }

    #[test]
    fn test_zone_deployment_totals() {
        let table = zone_deployment(&dataset()).unwrap();
        assert_eq!(
            table.column("Total_Personnel").unwrap().to_strings(),
            ["803", "593", "385", "580"]
        );
        assert_eq!(table.headers()[1], "DCP");
    }

    #[test]
    fn test_resource_allocation_is_rank_major() {
        let table = resource_allocation(&dataset()).unwrap();
        assert_eq!(table.row_count(), 8);
        assert_eq!(
            table.headers(),
            ["Resource_Type", "Total_Count", "Zone_1", "Zone_2", "Zone_3", "Zone_4"]
        );
        let row = table.row(4).unwrap();
        assert_eq!(row.get("Resource_Type").unwrap().to_string(), "Constables_Male");
        assert_eq!(row.get("Total_Count").unwrap().to_string(), "880");
    }

    #[test]
    fn test_equipment_fully_allocated() {
        let table = equipment_deployment(&dataset()).unwrap();
        assert_eq!(table.sum("Unallocated").unwrap(), 0.0);
        assert_eq!(table.sum("Total_Quantity").unwrap(), 897.0);
    }

    #[test]
    fn test_equipment_details_columns() {
        let table = equipment_details(&dataset()).unwrap();
        assert_eq!(
            table.headers(),
            ["Equipment", "Quantity", "Primary_Use", "Deployment_Zone"]
        );
        assert_eq!(table.row_count(), 11);

        let rescue = table
            .rows()
            .find(|r| r.get("Equipment").unwrap().to_string() == "Rescue Boats")
            .unwrap();
        assert_eq!(rescue.get("Quantity").unwrap().to_string(), "10");
        assert_eq!(rescue.get("Primary_Use").unwrap().to_string(), "Water rescue");
        assert_eq!(rescue.get("Deployment_Zone").unwrap().to_string(), "Ghats");
    }

    #[test]
    fn test_risk_categories_follow_scale() {
        let table = risk_locations(&dataset()).unwrap();
        assert_eq!(
            table.column("Risk_Category").unwrap().to_strings(),
            ["Critical", "High", "High", "Medium", "Medium", "Medium", "Medium", "Low"]
        );
        let incidents = incident_analysis(&dataset()).unwrap();
        assert!(incidents.column("Total_Incidents_2015_2024").is_ok());
    }

    #[test]
    fn test_incident_analysis_keeps_chart_order() {
        let incidents = incident_analysis(&dataset()).unwrap();
        let risk = risk_locations(&dataset()).unwrap();
        let order = incidents.column("Location").unwrap().to_strings();

        assert_eq!(order, risk.column("Location").unwrap().to_strings());
        assert_eq!(order[..3], ["Godaghat", "Darana River", "Panchavati Area"]);
    }

    #[test]
    fn test_high_risk_locations_by_incident_count() {
        let table = high_risk_locations(&dataset()).unwrap();
        assert_eq!(
            table.column("Location").unwrap().to_strings(),
            ["Godaghat", "Darana River", "Panchavati Area", "Valdevi River"]
        );
        assert_eq!(
            table.headers(),
            [
                "Location",
                "Total_Incidents_2015_2024",
                "Fatalities",
                "Recommended_Personnel"
            ]
        );
    }

    #[test]
    fn test_summary_tables_follow_dataset_names() {
        let mut dataset = dataset();
        dataset.history.crowd.remove(0);
        for zone in &mut dataset.zones {
            let count = zone.officer_counts_by_rank.shift_remove("Constables_Male").unwrap();
            zone.officer_counts_by_rank.insert("Constables".to_string(), count);
        }

        let high_risk = high_risk_locations(&dataset).unwrap();
        assert_eq!(high_risk.headers()[1], "Total_Incidents_2016_2024");
        assert_eq!(high_risk.row_count(), 4);

        let zones = zone_summary(&dataset).unwrap();
        assert!(zones.headers().contains(&"Constables"));
        assert!(!zones.headers().contains(&"Constables_Male"));
        assert_eq!(
            zones.column("Total_Personnel").unwrap().to_strings(),
            ["803", "593", "385", "580"]
        );
    }

    #[test]
    fn test_station_share_sums_to_hundred() {
        let table = station_deployment(&dataset()).unwrap();
        let total = table.sum("Share_Pct").unwrap();
        assert!((total - 100.0).abs() < 0.5, "{total}");
        assert_eq!(table.column("Share_Pct").unwrap().to_strings()[8], "34.8");
    }

    #[test]
    fn test_hourly_plan_ratio() {
        let table = hourly_plan(&dataset()).unwrap();
        assert_eq!(table.row_count(), 18);
        assert_eq!(table.column("Crowd_Per_Officer").unwrap().to_strings()[0], "5");
        assert!(table.column("Key_Event").unwrap().cells()[0].is_empty());
    }
}
