use bandobast_planner::analyzers::history::{load_history, write_history};
use bandobast_planner::analyzers::trends::analyze_trends;
use bandobast_planner::dataset::FestivalDataset;
use bandobast_planner::output::{export_csv, read_csv};
use bandobast_planner::plans::planning_tables;
use std::fs;

#[test]
fn test_full_pipeline() {
    let dataset = FestivalDataset::embedded().expect("Failed to load built-in dataset");
    let dir = tempfile::tempdir().unwrap();

    let tables = planning_tables(&dataset).expect("Failed to build planning tables");
    assert_eq!(tables.len(), 11);

    for named in &tables {
        let path = dir.path().join(&named.file_name);
        export_csv(&named.table, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content.lines().count(),
            named.table.row_count() + 1,
            "{}",
            named.file_name
        );

        let parsed = read_csv(&path).unwrap();
        assert_eq!(parsed.headers(), named.table.headers(), "{}", named.file_name);
        assert_eq!(parsed.row_count(), named.table.row_count());
    }
}

#[test]
fn test_risk_locations_csv() {
    let dataset = FestivalDataset::embedded().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let tables = planning_tables(&dataset).unwrap();
    let risk = tables
        .iter()
        .find(|t| t.file_name == "ganpati_2025_risk_locations.csv")
        .unwrap();

    let path = dir.path().join(&risk.file_name);
    export_csv(&risk.table, &path).unwrap();
    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<_> = content.lines().collect();

    assert_eq!(lines.len(), 9);
    assert!(lines[0].starts_with("Location,Risk_Score,"));
    assert!(lines[1].starts_with("Godaghat,27,"));
    assert!(lines[1].ends_with(",Critical"));
    assert!(lines[8].starts_with("Bitco Chowk,14,"));
    assert!(lines[8].ends_with(",Low"));
}

#[test]
fn test_history_round_trip_and_prediction() {
    let dataset = FestivalDataset::embedded().unwrap();
    let dir = tempfile::tempdir().unwrap();

    let written = write_history(dir.path(), &dataset.history).unwrap();
    assert_eq!(written.len(), 3);

    let loaded = load_history(dir.path()).unwrap();
    assert_eq!(loaded.crowd.len(), dataset.history.crowd.len());
    assert_eq!(loaded.incidents.len(), dataset.history.incidents.len());
    assert_eq!(loaded.weather.len(), dataset.history.weather.len());

    let report = analyze_trends(&loaded).unwrap();
    let prediction = report.prediction.expect("recovery years present");
    assert_eq!(prediction.year, 2025);
    assert_eq!(prediction.households, 32981);
    assert!((prediction.annual_growth_pct - 43.4).abs() < 0.05);
}

#[test]
fn test_load_dataset_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dataset.json");
    fs::write(&path, include_str!("../data/ganpati_2025.json")).unwrap();

    let dataset = FestivalDataset::load(&path).unwrap();
    assert_eq!(dataset, FestivalDataset::embedded().unwrap());

    assert!(FestivalDataset::load(&dir.path().join("missing.json")).is_err());
}
