//! Compound annual growth rate and one-step projection.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ProjectionError {
    #[error("growth projection needs at least two observations, got {0}")]
    TooShort(usize),

    #[error("growth projection needs a positive first observation, got {0}")]
    NonPositiveBase(f64),

    #[error("observation {index} is not a finite non-negative number: {value}")]
    InvalidObservation { index: usize, value: f64 },
}

/// Result of projecting one period past the end of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrowthProjection {
    /// Constant per-period rate reproducing `last / first` over the span.
    pub rate: f64,
    /// `last * (1 + rate)`.
    pub projected: f64,
}

impl GrowthProjection {
    /// The projection truncated toward zero, as the planning reports quote it.
    pub fn projected_count(&self) -> u64 {
        self.projected.trunc() as u64
    }

    pub fn rate_pct(&self) -> f64 {
        self.rate * 100.0
    }
}

/// Computes `(last/first)^(1/(n-1)) - 1` and projects `last * (1 + rate)`.
///
/// # Errors
///
/// Series shorter than two, a first value that is zero or negative, and
/// non-finite or negative observations are rejected.
pub fn project_next(series: &[f64]) -> Result<GrowthProjection, ProjectionError> {
    if series.len() < 2 {
        return Err(ProjectionError::TooShort(series.len()));
    }
    for (index, &value) in series.iter().enumerate() {
        if !value.is_finite() || value < 0.0 {
            return Err(ProjectionError::InvalidObservation { index, value });
        }
    }

    let first = series[0];
    let last = series[series.len() - 1];
    if first <= 0.0 {
        return Err(ProjectionError::NonPositiveBase(first));
    }

    let periods = (series.len() - 1) as f64;
    let rate = (last / first).powf(1.0 / periods) - 1.0;

    Ok(GrowthProjection {
        rate,
        projected: last * (1.0 + rate),
    })
}
