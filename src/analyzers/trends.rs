use anyhow::Result;
use chrono::Utc;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::analyzers::projection::project_next;
use crate::analyzers::types::{
    CovidImpact, History, PeakYear, Prediction, TrendReport, WeatherCorrelation, YearIncidents,
};
use crate::analyzers::utility::{mean, pct, round_to, stddev};
use crate::table::{Column, Table};

/// Year households collapsed under lockdown; compared against the year before.
pub const COVID_YEAR: i32 = 2020;

/// First year of the post-COVID recovery the growth rate is fitted on.
pub const RECOVERY_START: i32 = 2021;

/// Builds the full [`TrendReport`] from historical series.
///
/// Averages and the peak come from every crowd year. The next-year prediction
/// fits a compound growth rate on household counts from `RECOVERY_START`
/// onward and carries the latest public-mandal count forward.
pub fn analyze_trends(history: &History) -> Result<TrendReport> {
    let households: Vec<f64> = history
        .crowd
        .iter()
        .map(|c| c.householdganpatis as f64)
        .collect();
    let mandals: Vec<f64> = history
        .crowd
        .iter()
        .map(|c| c.totalpublicmandals as f64)
        .collect();

    let avg_households = mean(&households);
    let household_stddev = stddev(&households, avg_households);

    let peak = history
        .crowd
        .iter()
        .reduce(|best, c| {
            if c.householdganpatis > best.householdganpatis {
                c
            } else {
                best
            }
        })
        .map(|c| PeakYear {
            year: c.year,
            households: c.householdganpatis,
        });

    let covid_impact = covid_impact(history);

    let mut by_year: BTreeMap<i32, YearIncidents> = BTreeMap::new();
    for incident in &history.incidents {
        let entry = by_year.entry(incident.year).or_insert(YearIncidents {
            year: incident.year,
            total_incidents: 0,
            total_fatalities: 0,
        });
        entry.total_incidents += 1;
        entry.total_fatalities += incident.fatalities;
    }

    let drownings: Vec<_> = history
        .incidents
        .iter()
        .filter(|i| i.incidenttype == "drowning")
        .collect();

    let weather = weather_correlation(history, &by_year);
    let prediction = predict(history)?;

    let report = TrendReport {
        generated_at: Utc::now(),
        first_year: history.crowd.first().map_or(0, |c| c.year),
        last_year: history.crowd.last().map_or(0, |c| c.year),
        avg_public_mandals: mean(&mandals),
        avg_households,
        household_stddev,
        peak,
        covid_impact,
        total_incidents: history.incidents.len(),
        total_fatalities: history.incidents.iter().map(|i| i.fatalities).sum(),
        fatal_incidents: history
            .incidents
            .iter()
            .filter(|i| i.severity == "fatal")
            .count(),
        drowning_incidents: drownings.len(),
        drowning_deaths: drownings.iter().map(|i| i.fatalities).sum(),
        godavari_drownings: drownings
            .iter()
            .filter(|i| i.location.contains("Godavari"))
            .count(),
        incidents_by_year: by_year.into_values().collect(),
        weather,
        prediction,
    };

    debug!(
        first_year = report.first_year,
        last_year = report.last_year,
        total_incidents = report.total_incidents,
        "Trend report built"
    );

    Ok(report)
}

fn covid_impact(history: &History) -> Option<CovidImpact> {
    let during = history.crowd.iter().find(|c| c.year == COVID_YEAR)?;
    let before = history.crowd.iter().find(|c| c.year == COVID_YEAR - 1)?;
    let before_count = before.householdganpatis as f64;
    let drop = before_count - during.householdganpatis as f64;

    Some(CovidImpact {
        year: during.year,
        households: during.householdganpatis,
        drop_pct: round_to(pct(drop, before_count), 1),
    })
}

/// Years without incidents count as zero fatalities.
fn weather_correlation(
    history: &History,
    by_year: &BTreeMap<i32, YearIncidents>,
) -> WeatherCorrelation {
    let fatalities_in = |year: i32| by_year.get(&year).map_or(0.0, |y| y.total_fatalities as f64);

    let high: Vec<_> = history.weather.iter().filter(|w| w.is_high_flood_risk()).collect();
    let low: Vec<_> = history.weather.iter().filter(|w| w.is_low_flood_risk()).collect();

    let high_fatalities: Vec<f64> = high.iter().map(|w| fatalities_in(w.year)).collect();
    let low_fatalities: Vec<f64> = low.iter().map(|w| fatalities_in(w.year)).collect();

    WeatherCorrelation {
        high_risk_years: high.iter().map(|w| w.year).collect(),
        avg_fatalities_high_risk: round_to(mean(&high_fatalities), 1),
        avg_fatalities_low_risk: round_to(mean(&low_fatalities), 1),
    }
}

fn predict(history: &History) -> Result<Option<Prediction>> {
    let recovery: Vec<_> = history
        .crowd
        .iter()
        .filter(|c| c.year >= RECOVERY_START)
        .collect();

    let Some(latest) = recovery.last() else {
        warn!(
            recovery_start = RECOVERY_START,
            "No recovery years on record, skipping prediction"
        );
        return Ok(None);
    };
    if recovery.len() < 2 {
        warn!(
            years = recovery.len(),
            "Recovery series too short, skipping prediction"
        );
        return Ok(None);
    }

    let series: Vec<f64> = recovery
        .iter()
        .map(|c| c.householdganpatis as f64)
        .collect();
    let projection = project_next(&series)?;

    Ok(Some(Prediction {
        year: latest.year + 1,
        base_year: latest.year,
        annual_growth_pct: round_to(projection.rate_pct(), 1),
        households: projection.projected_count(),
        public_mandals: latest.totalpublicmandals,
    }))
}

/// Crowd history as a table with `total_events` and `growth_rate` derived.
pub fn crowd_table(history: &History) -> Result<Table> {
    let crowd = &history.crowd;
    let table = Table::from_columns(vec![
        Column::counts("year", crowd.iter().map(|c| c.year)),
        Column::counts("totalpublicmandals", crowd.iter().map(|c| c.totalpublicmandals)),
        Column::counts("householdganpatis", crowd.iter().map(|c| c.householdganpatis)),
        Column::text("notes", crowd.iter().map(|c| c.notes.as_str())),
    ])?
    .with_sum("total_events", &["totalpublicmandals", "householdganpatis"])?
    .with_pct_change("growth_rate", "householdganpatis")?;

    Ok(table)
}

/// Incidents and fatalities per year.
pub fn incidents_by_year_table(report: &TrendReport) -> Result<Table> {
    let rows = &report.incidents_by_year;
    let table = Table::from_columns(vec![
        Column::counts("year", rows.iter().map(|r| r.year)),
        Column::counts("total_fatalities", rows.iter().map(|r| r.total_fatalities)),
        Column::counts(
            "total_incidents",
            rows.iter().map(|r| r.total_incidents as i64),
        ),
    ])?;
    Ok(table)
}
