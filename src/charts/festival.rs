//! The festival chart set: tables shaped for charting plus their specs.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use super::{ChartKind, ChartSpec, render_chart};
use crate::analyzers::trends::{COVID_YEAR, analyze_trends};
use crate::dataset::FestivalDataset;
use crate::plans::{file_prefix, hourly_label, slug};
use crate::table::{Column, Table};

/// A chart ready to render: its data, presentation and output filename.
#[derive(Debug, Clone)]
pub struct NamedChart {
    pub file_name: String,
    pub table: Table,
    pub spec: ChartSpec,
}

/// Every festival chart, in publication order.
pub fn festival_charts(dataset: &FestivalDataset) -> Result<Vec<NamedChart>> {
    let festival = &dataset.festival;
    let prefix = file_prefix(dataset);

    Ok(vec![
        NamedChart {
            file_name: format!("{}_household_trends.png", slug(&festival.name)),
            table: household_trends(dataset)?,
            spec: ChartSpec::new(ChartKind::Line, "Year", "Households")
                .title(&format!("{} {} Household Trends", festival.city, festival.name))
                .axis_labels("Year", "Households")
                .color_by("Series"),
        },
        NamedChart {
            file_name: format!("{prefix}_timeline.png"),
            table: timeline(dataset)?,
            spec: ChartSpec::new(ChartKind::Bar, "Day", "Personnel")
                .title(&format!("{} {} Risk Timeline", festival.name, festival.year))
                .axis_labels("Date", "Personnel")
                .color_by("Risk_Level"),
        },
        NamedChart {
            file_name: "risk_assessment_chart.png".to_string(),
            table: crate::plans::risk_locations(dataset)?,
            spec: ChartSpec::new(ChartKind::Bar, "Location", "Risk_Score")
                .title(&format!("Risk Assessment - {} {}", festival.name, festival.year))
                .axis_labels("Locations", "Risk Score")
                .color_by("Risk_Category")
                .with_values(),
        },
        NamedChart {
            file_name: "police_deployment_chart.png".to_string(),
            table: crate::plans::station_deployment(dataset)?,
            spec: ChartSpec::new(ChartKind::HorizontalBar, "Station", "Personnel")
                .title("Police Deployment by Station")
                .axis_labels("Station", "Personnel")
                .color_by("Coverage")
                .with_values(),
        },
        NamedChart {
            file_name: format!("{}_plan.png", slug(&hourly_label(dataset))),
            table: crate::plans::hourly_plan(dataset)?,
            spec: ChartSpec::new(ChartKind::Line, "Hour", "Personnel")
                .title(&dataset.hourly_plan.title)
                .axis_labels("Hour", "Personnel")
                .color_by("Risk_Level"),
        },
    ])
}

/// Renders every chart into `dir`, creating it if needed.
pub fn render_all(charts: &[NamedChart], dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut written = Vec::with_capacity(charts.len());
    for chart in charts {
        let path = dir.join(&chart.file_name);
        render_chart(&chart.table, &chart.spec, &path)
            .with_context(|| format!("Failed to render {}", chart.file_name))?;
        info!(path = %path.display(), "Chart written");
        written.push(path);
    }

    Ok(written)
}

/// Household counts per year with the projected next year appended.
///
/// The `Series` column tags each row as `Historical`, `COVID Impact` or
/// `Prediction` for coloring.
pub fn household_trends(dataset: &FestivalDataset) -> Result<Table> {
    let history = &dataset.history;
    let report = analyze_trends(history)?;

    let mut years: Vec<i64> = Vec::new();
    let mut households: Vec<i64> = Vec::new();
    let mut series: Vec<&str> = Vec::new();

    for year in &history.crowd {
        years.push(year.year.into());
        households.push(year.householdganpatis.into());
        series.push(if year.year == COVID_YEAR {
            "COVID Impact"
        } else {
            "Historical"
        });
    }

    if let Some(prediction) = &report.prediction {
        years.push(prediction.year.into());
        households.push(i64::try_from(prediction.households)?);
        series.push("Prediction");
    }

    let table = Table::from_columns(vec![
        Column::counts("Year", years),
        Column::counts("Households", households),
        Column::text("Series", series),
    ])?;
    Ok(table)
}

/// Personnel per festival day, labelled `20 Aug` style.
pub fn timeline(dataset: &FestivalDataset) -> Result<Table> {
    let days = &dataset.timeline;
    let table = Table::from_columns(vec![
        Column::text("Day", days.iter().map(|d| d.date.format("%d %b").to_string())),
        Column::counts("Personnel", days.iter().map(|d| d.personnel_assigned)),
        Column::text("Risk_Level", days.iter().map(|d| d.risk_tier.label())),
    ])?;
    Ok(table)
}
