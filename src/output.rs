//! Output formatting and persistence for tables.
//!
//! Supports pretty console tables, JSON rendering, CSV export (plain or
//! gzip-compressed) and reading CSV back into a [`Table`].

use anyhow::{Context, Result};
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::{debug, info};

use crate::table::{Column, Table};

/// Renders a table as an aligned text grid.
pub fn render_pretty(table: &Table) -> String {
    let mut builder = Builder::default();
    builder.push_record(table.headers().into_iter().map(str::to_string));
    for row in table.rows() {
        builder.push_record(row.cells().map(ToString::to_string));
    }
    let mut grid = builder.build();
    grid.with(Style::psql());
    grid.to_string()
}

/// Logs a titled table at info level.
pub fn print_pretty(title: &str, table: &Table) {
    info!("{title}\n{}", render_pretty(table));
}

/// Logs any serializable value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Table rows as JSON objects keyed by column name.
pub fn to_records(table: &Table) -> Result<Vec<serde_json::Map<String, serde_json::Value>>> {
    let headers = table.headers();
    table
        .rows()
        .map(|row| {
            headers
                .iter()
                .zip(row.cells())
                .map(|(name, cell)| Ok((name.to_string(), serde_json::to_value(cell)?)))
                .collect::<Result<serde_json::Map<_, _>>>()
        })
        .collect()
}

/// Writes the header row and one record per table row.
pub fn write_table<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(writer);

    writer.write_record(table.headers())?;
    for row in table.rows() {
        writer.write_record(row.cells().map(ToString::to_string))?;
    }
    writer.flush()?;

    Ok(())
}

/// Exports a table as CSV, replacing any existing file at `path`.
pub fn export_csv(table: &Table, path: &Path) -> Result<()> {
    debug!(path = %path.display(), rows = table.row_count(), "Exporting CSV");

    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_table(table, file).with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

/// Exports a table as gzip-compressed CSV, replacing any existing file.
pub fn export_csv_gz(table: &Table, path: &Path) -> Result<()> {
    debug!(path = %path.display(), rows = table.row_count(), "Exporting compressed CSV");

    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut encoder = GzEncoder::new(file, Compression::default());
    write_table(table, &mut encoder)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    encoder.finish()?;

    Ok(())
}

/// Reads a CSV file into a table of text cells.
///
/// Column order and row order follow the file.
pub fn read_csv(path: &Path) -> Result<Table> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut rdr = csv::Reader::from_reader(file);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let mut values: Vec<Vec<String>> = vec![Vec::new(); headers.len()];

    for result in rdr.records() {
        let record = result.with_context(|| format!("Malformed row in {}", path.display()))?;
        for (column, field) in values.iter_mut().zip(record.iter()) {
            column.push(field.to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(values)
        .map(|(name, cells)| Column::text(name, cells))
        .collect();

    let table = Table::from_columns(columns)
        .with_context(|| format!("Invalid table in {}", path.display()))?;
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;
    use std::fs;
    use std::io::Read;

    fn locations() -> Table {
        Table::from_columns(vec![
            Column::text(
                "Location",
                [
                    "Godaghat",
                    "Darana River",
                    "Panchavati Area",
                    "Kapila Sangam",
                    "Bhadrakali",
                    "Wakadi Barav",
                    "Valdevi River",
                    "Bitco Chowk",
                ],
            ),
            Column::counts("Risk_Score", [27, 21, 21, 19, 19, 19, 16, 14]),
        ])
        .unwrap()
    }

    #[test]
    fn test_export_csv_keeps_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("risk_locations.csv");

        export_csv(&locations(), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "Location,Risk_Score");
        assert_eq!(lines[1], "Godaghat,27");
        assert_eq!(lines[8], "Bitco Chowk,14");
    }

    #[test]
    fn test_export_csv_line_and_field_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stations.csv");
        let table = Table::from_columns(vec![
            Column::text("Station", ["Panchavati PS", "Special Units"]),
            Column::counts("Personnel", [180, 512]),
            Column::text("Responsibility", ["Main route, Godaghat", "QRT, RCP, SRPF, BDDS"]),
        ])
        .unwrap();

        export_csv(&table, &path).unwrap();

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(&path)
            .unwrap();
        let records: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), table.row_count() + 1);
        assert!(records.iter().all(|r| r.len() == table.column_count()));
    }

    #[test]
    fn test_export_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("round_trip.csv");
        let original = Table::from_columns(vec![
            Column::dates(
                "Date",
                [
                    chrono::NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
                    chrono::NaiveDate::from_ymd_opt(2025, 9, 2).unwrap(),
                ],
            ),
            Column::text("Event", ["Gauri Pujan", "Gauri \"Visarjan\", day 7"]),
            Column::numbers("Share", [11.5, 0.25]),
            Column::new("Note", vec![Cell::Empty, Cell::Text("peak".into())]),
        ])
        .unwrap();

        export_csv(&original, &path).unwrap();
        let parsed = read_csv(&path).unwrap();

        assert_eq!(parsed.headers(), original.headers());
        for column in original.columns() {
            assert_eq!(
                parsed.column(column.name()).unwrap().to_strings(),
                column.to_strings()
            );
        }
    }

    #[test]
    fn test_export_csv_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overwrite.csv");
        fs::write(&path, "stale,content\n1,2\n3,4\n5,6\n").unwrap();

        let table = Table::from_columns(vec![Column::counts("Personnel", [2655])]).unwrap();
        export_csv(&table, &path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "Personnel\n2655\n");
    }

    #[test]
    fn test_export_csv_gz_decompresses_to_plain_csv() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("plain.csv");
        let packed = dir.path().join("packed.csv.gz");

        export_csv(&locations(), &plain).unwrap();
        export_csv_gz(&locations(), &packed).unwrap();

        let mut decoder = flate2::read::GzDecoder::new(File::open(&packed).unwrap());
        let mut content = String::new();
        decoder.read_to_string(&mut content).unwrap();
        assert_eq!(content, fs::read_to_string(&plain).unwrap());
    }

    #[test]
    fn test_read_csv_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_csv(&dir.path().join("absent.csv")).is_err());
    }

    #[test]
    fn test_render_pretty_contains_headers_and_values() {
        let rendered = render_pretty(&locations());
        assert!(rendered.contains("Location"));
        assert!(rendered.contains("Bitco Chowk"));
        assert!(rendered.contains("27"));
    }

    #[test]
    fn test_to_records() {
        let records = to_records(&locations()).unwrap();
        assert_eq!(records.len(), 8);
        assert_eq!(records[0]["Location"], "Godaghat");
        assert_eq!(records[0]["Risk_Score"], 27);
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&to_records(&locations()).unwrap()).unwrap();
    }
}
