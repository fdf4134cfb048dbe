//! CLI entry point for the Bandobast planner.
//!
//! Provides subcommands for exporting the festival planning tables, rendering
//! charts, seeding and analyzing historical data, and running ad-hoc growth
//! projections.

use anyhow::{Context, Result};
use bandobast_planner::analyzers::history::{load_history, write_history};
use bandobast_planner::analyzers::projection::project_next;
use bandobast_planner::analyzers::trends::{analyze_trends, crowd_table, incidents_by_year_table};
use bandobast_planner::charts::festival::{festival_charts, render_all};
use bandobast_planner::dataset::FestivalDataset;
use bandobast_planner::output::{export_csv, export_csv_gz, print_json, print_pretty};
use bandobast_planner::plans::{critical_dates, high_risk_locations, planning_tables, zone_summary};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bandobast_planner")]
#[command(about = "Festival bandobast planning: tables, charts and crowd trends", long_about = None)]
struct Cli {
    /// Dataset JSON to use instead of the built-in Ganpati 2025 pack
    #[arg(long, global = true, env = "BANDOBAST_DATASET")]
    dataset: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write every planning table as CSV
    Export {
        /// Directory to write CSV files into
        #[arg(short, long, env = "BANDOBAST_OUTPUT_DIR", default_value = "output")]
        output_dir: PathBuf,

        /// Gzip compress CSV files
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Render every chart as PNG
    Charts {
        /// Directory to write PNG files into
        #[arg(short, long, env = "BANDOBAST_OUTPUT_DIR", default_value = "output")]
        output_dir: PathBuf,
    },
    /// Write the historical crowd, incident and weather CSVs
    SeedHistory {
        /// Directory to write the history CSVs into
        #[arg(short, long, env = "BANDOBAST_OUTPUT_DIR", default_value = "output")]
        output_dir: PathBuf,
    },
    /// Analyze historical CSVs and report trends
    Trends {
        /// Directory containing crowd_data.csv, incidents_data.csv and weather_data.csv
        #[arg(short = 'd', long, default_value = "output")]
        data_dir: PathBuf,

        /// Emit the full report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Log critical dates, zone strength, high-risk locations and totals
    Summary,
    /// Project the next value of a yearly series with its compound growth rate
    Project {
        /// Observations in chronological order
        #[arg(value_name = "VALUES", required = true, num_args = 1.., allow_negative_numbers = true)]
        values: Vec<f64>,
    },
    /// Load and validate the dataset only
    Validate,
    /// Export tables, seed history and render charts
    All {
        /// Directory to write every output into
        #[arg(short, long, env = "BANDOBAST_OUTPUT_DIR", default_value = "output")]
        output_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_logging()?;

    let cli = Cli::parse();

    let dataset = || load_dataset(cli.dataset.as_deref());

    match cli.command {
        Commands::Export { output_dir, gzip } => {
            export(&dataset()?, &output_dir, gzip)?;
        }
        Commands::Charts { output_dir } => {
            charts(&dataset()?, &output_dir)?;
        }
        Commands::SeedHistory { output_dir } => {
            seed_history(&dataset()?, &output_dir)?;
        }
        Commands::Trends { data_dir, json } => trends(&data_dir, json)?,
        Commands::Summary => summary(&dataset()?)?,
        Commands::Project { values } => project(&values)?,
        Commands::Validate => {
            let dataset = dataset()?;
            info!(
                festival = %dataset.festival.name,
                city = %dataset.festival.city,
                year = dataset.festival.year,
                days = dataset.timeline.len(),
                zones = dataset.zones.len(),
                equipment_types = dataset.equipment.len(),
                locations = dataset.locations.len(),
                stations = dataset.stations.len(),
                "Dataset is valid"
            );
        }
        Commands::All { output_dir } => {
            let dataset = dataset()?;
            let tables = export(&dataset, &output_dir, false)?;
            let history = seed_history(&dataset, &output_dir)?;
            let charts = charts(&dataset, &output_dir)?;
            info!(
                output_dir = %output_dir.display(),
                tables = tables.len(),
                history = history.len(),
                charts = charts.len(),
                "Planning pack complete"
            );
        }
    }

    Ok(())
}

/// Colored stderr plus a JSON daily rolling log file.
///
/// The returned guard flushes the file writer when dropped.
fn init_logging() -> Result<WorkerGuard> {
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/bandobast_planner.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bandobast_planner.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(file_guard)
}

/// Loads the dataset from a JSON file, or the built-in pack when no path is given.
fn load_dataset(path: Option<&Path>) -> Result<FestivalDataset> {
    let dataset = match path {
        Some(path) => FestivalDataset::load(path)
            .with_context(|| format!("Failed to load dataset {}", path.display()))?,
        None => FestivalDataset::embedded().context("Built-in dataset is invalid")?,
    };
    Ok(dataset)
}

fn create_output_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))
}

/// Writes every planning table into `output_dir`.
#[tracing::instrument(skip(dataset), fields(output_dir = %output_dir.display()))]
fn export(dataset: &FestivalDataset, output_dir: &Path, gzip: bool) -> Result<Vec<PathBuf>> {
    create_output_dir(output_dir)?;

    let mut written = Vec::new();
    for named in planning_tables(dataset)? {
        let path = if gzip {
            output_dir.join(format!("{}.gz", named.file_name))
        } else {
            output_dir.join(&named.file_name)
        };

        if gzip {
            export_csv_gz(&named.table, &path)?;
        } else {
            export_csv(&named.table, &path)?;
        }

        info!(path = %path.display(), rows = named.table.row_count(), "Table exported");
        written.push(path);
    }

    Ok(written)
}

#[tracing::instrument(skip(dataset), fields(output_dir = %output_dir.display()))]
fn charts(dataset: &FestivalDataset, output_dir: &Path) -> Result<Vec<PathBuf>> {
    render_all(&festival_charts(dataset)?, output_dir)
}

#[tracing::instrument(skip(dataset), fields(output_dir = %output_dir.display()))]
fn seed_history(dataset: &FestivalDataset, output_dir: &Path) -> Result<Vec<PathBuf>> {
    create_output_dir(output_dir)?;
    let written = write_history(output_dir, &dataset.history)?;
    info!(files = written.len(), "Historical data written");
    Ok(written)
}

/// Loads the historical CSVs and reports crowd, incident and weather trends.
#[tracing::instrument(fields(data_dir = %data_dir.display()))]
fn trends(data_dir: &Path, json: bool) -> Result<()> {
    let history = load_history(data_dir)?;
    let report = analyze_trends(&history)?;

    if json {
        return print_json(&report);
    }

    print_pretty("Crowd history", &crowd_table(&history)?);
    print_pretty("Incidents by year", &incidents_by_year_table(&report)?);

    info!(
        avg_public_mandals = report.avg_public_mandals,
        avg_households = report.avg_households,
        total_incidents = report.total_incidents,
        total_fatalities = report.total_fatalities,
        drowning_incidents = report.drowning_incidents,
        drowning_deaths = report.drowning_deaths,
        godavari_drownings = report.godavari_drownings,
        "Historical totals"
    );

    if let Some(peak) = &report.peak {
        info!(year = peak.year, households = peak.households, "Peak household year");
    }
    if let Some(covid) = &report.covid_impact {
        info!(year = covid.year, drop_pct = covid.drop_pct, "COVID impact");
    }
    info!(
        high_risk_years = ?report.weather.high_risk_years,
        avg_fatalities_high_risk = report.weather.avg_fatalities_high_risk,
        avg_fatalities_low_risk = report.weather.avg_fatalities_low_risk,
        "Weather correlation"
    );

    match &report.prediction {
        Some(prediction) => info!(
            year = prediction.year,
            base_year = prediction.base_year,
            annual_growth_pct = prediction.annual_growth_pct,
            households = prediction.households,
            public_mandals = prediction.public_mandals,
            "Prediction"
        ),
        None => warn!("Not enough recovery years for a prediction"),
    }

    Ok(())
}

/// Logs the headline planning figures.
#[tracing::instrument(skip(dataset))]
fn summary(dataset: &FestivalDataset) -> Result<()> {
    let festival = &dataset.festival;
    info!(
        festival = %festival.name,
        city = %festival.city,
        year = festival.year,
        "Bandobast plan summary"
    );

    print_pretty(
        "Critical dates",
        &critical_dates(dataset)?.select(&[
            "Date",
            "Event",
            "Risk_Level",
            "Estimated_Crowd",
            "Personnel_Required",
        ])?,
    );

    print_pretty("Zone deployment", &zone_summary(dataset)?);
    print_pretty("High-risk locations", &high_risk_locations(dataset)?);

    let zone_personnel: u32 = dataset.zones.iter().map(|z| z.total_personnel()).sum();
    let station_personnel: u32 = dataset.stations.iter().map(|s| s.personnel).sum();
    let equipment: u32 = dataset.equipment.iter().map(|e| e.total_quantity).sum();
    info!(
        zone_personnel,
        station_personnel,
        peak_day_personnel = dataset.peak_personnel(),
        equipment,
        "Resource totals"
    );

    if let Some(location) = dataset.highest_risk_location() {
        info!(
            location = %location.location_name,
            risk_score = location.numeric_risk_score,
            "Highest-risk location"
        );
    }

    Ok(())
}

/// Runs the compound growth projection on ad-hoc values.
#[tracing::instrument]
fn project(values: &[f64]) -> Result<()> {
    let projection = project_next(values)?;
    info!(
        annual_growth_pct = projection.rate_pct(),
        projected = projection.projected,
        projected_count = projection.projected_count(),
        "Projection"
    );
    Ok(())
}
