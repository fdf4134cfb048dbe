//! Risk tiers and score bucketing.
//!
//! Every chart and table colors and labels risk through [`RiskTier`]; the
//! tier-to-color mapping lives here and nowhere else.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Fixed, ordered severity labels: `Low < Medium < High < VeryHigh < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
    Critical,
}

impl RiskTier {
    pub const ALL: [RiskTier; 5] = [
        RiskTier::Low,
        RiskTier::Medium,
        RiskTier::High,
        RiskTier::VeryHigh,
        RiskTier::Critical,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RiskTier::Low => "Low",
            RiskTier::Medium => "Medium",
            RiskTier::High => "High",
            RiskTier::VeryHigh => "Very High",
            RiskTier::Critical => "Critical",
        }
    }

    /// Display color as a hex triplet.
    pub fn hex(self) -> &'static str {
        match self {
            RiskTier::Low => "#2E8B57",
            RiskTier::Medium => "#D2BA4C",
            RiskTier::High => "#B4413C",
            RiskTier::VeryHigh => "#DB4545",
            RiskTier::Critical => "#13343B",
        }
    }

    /// `true` for the tiers that put a day on the critical-dates list.
    pub fn is_elevated(self) -> bool {
        self >= RiskTier::High
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RiskTier {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "low" => Ok(RiskTier::Low),
            "medium" => Ok(RiskTier::Medium),
            "high" => Ok(RiskTier::High),
            "veryhigh" => Ok(RiskTier::VeryHigh),
            "critical" => Ok(RiskTier::Critical),
            _ => Err(RiskError::UnknownTier(s.to_string())),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum RiskError {
    #[error("unknown risk tier '{0}'")]
    UnknownTier(String),

    #[error("risk scale needs at least one band")]
    NoBands,

    #[error("risk scale thresholds must strictly decrease: {previous} then {next}")]
    ThresholdOrder { previous: u32, next: u32 },

    #[error("risk scale tiers must strictly decrease: {previous} then {next}")]
    TierOrder { previous: RiskTier, next: RiskTier },
}

/// One `(threshold, tier)` step of a [`RiskScale`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskBand {
    pub min_score: u32,
    pub tier: RiskTier,
}

#[derive(Debug, Clone, Deserialize)]
struct RawRiskScale {
    bands: Vec<RiskBand>,
    floor: RiskTier,
}

/// Step function from a numeric risk score to a [`RiskTier`].
///
/// Bands are held in descending threshold order and the first band whose
/// threshold is at or below the score wins. Scores below every band fall to
/// the floor tier. Construction enforces that both thresholds and tiers
/// strictly decrease, which keeps bucketing monotonic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRiskScale")]
pub struct RiskScale {
    bands: Vec<RiskBand>,
    floor: RiskTier,
}

impl RiskScale {
    pub fn new(bands: Vec<RiskBand>, floor: RiskTier) -> Result<Self, RiskError> {
        if bands.is_empty() {
            return Err(RiskError::NoBands);
        }
        for pair in bands.windows(2) {
            if pair[1].min_score >= pair[0].min_score {
                return Err(RiskError::ThresholdOrder {
                    previous: pair[0].min_score,
                    next: pair[1].min_score,
                });
            }
            if pair[1].tier >= pair[0].tier {
                return Err(RiskError::TierOrder {
                    previous: pair[0].tier,
                    next: pair[1].tier,
                });
            }
        }
        if let Some(last) = bands.last() {
            if floor >= last.tier {
                return Err(RiskError::TierOrder {
                    previous: last.tier,
                    next: floor,
                });
            }
        }
        Ok(Self { bands, floor })
    }

    pub fn categorize(&self, score: u32) -> RiskTier {
        self.bands
            .iter()
            .find(|band| score >= band.min_score)
            .map_or(self.floor, |band| band.tier)
    }

    pub fn bands(&self) -> &[RiskBand] {
        &self.bands
    }
}

impl TryFrom<RawRiskScale> for RiskScale {
    type Error = RiskError;

    fn try_from(raw: RawRiskScale) -> Result<Self, Self::Error> {
        RiskScale::new(raw.bands, raw.floor)
    }
}

/// | Score  | Tier     |
/// |--------|----------|
/// | >= 25  | Critical |
/// | >= 20  | High     |
/// | >= 15  | Medium   |
/// | < 15   | Low      |
impl Default for RiskScale {
    fn default() -> Self {
        Self {
            bands: vec![
                RiskBand {
                    min_score: 25,
                    tier: RiskTier::Critical,
                },
                RiskBand {
                    min_score: 20,
                    tier: RiskTier::High,
                },
                RiskBand {
                    min_score: 15,
                    tier: RiskTier::Medium,
                },
            ],
            floor: RiskTier::Low,
        }
    }
}

/// Buckets a score on the default scale.
pub fn categorize(score: u32) -> RiskTier {
    RiskScale::default().categorize(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_boundaries() {
        assert_eq!(categorize(27), RiskTier::Critical);
        assert_eq!(categorize(25), RiskTier::Critical);
        assert_eq!(categorize(24), RiskTier::High);
        assert_eq!(categorize(21), RiskTier::High);
        assert_eq!(categorize(20), RiskTier::High);
        assert_eq!(categorize(19), RiskTier::Medium);
        assert_eq!(categorize(15), RiskTier::Medium);
        assert_eq!(categorize(14), RiskTier::Low);
        assert_eq!(categorize(0), RiskTier::Low);
    }

    #[test]
    fn test_categorize_is_monotonic() {
        let scale = RiskScale::default();
        for a in 0..40 {
            for b in a..40 {
                assert!(scale.categorize(a) <= scale.categorize(b), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn test_tier_ordering_and_labels() {
        assert!(RiskTier::Low < RiskTier::Medium);
        assert!(RiskTier::High < RiskTier::VeryHigh);
        assert!(RiskTier::VeryHigh < RiskTier::Critical);
        assert_eq!(RiskTier::VeryHigh.to_string(), "Very High");
        assert_eq!("Very High".parse::<RiskTier>().unwrap(), RiskTier::VeryHigh);
        assert_eq!("veryhigh".parse::<RiskTier>().unwrap(), RiskTier::VeryHigh);
        assert!("Low-Medium".parse::<RiskTier>().is_err());
    }

    #[test]
    fn test_every_tier_has_distinct_color() {
        let mut colors: Vec<_> = RiskTier::ALL.iter().map(|t| t.hex()).collect();
        colors.sort_unstable();
        colors.dedup();
        assert_eq!(colors.len(), RiskTier::ALL.len());
    }

    #[test]
    fn test_scale_rejects_non_monotonic_bands() {
        let err = RiskScale::new(
            vec![
                RiskBand {
                    min_score: 20,
                    tier: RiskTier::Medium,
                },
                RiskBand {
                    min_score: 10,
                    tier: RiskTier::High,
                },
            ],
            RiskTier::Low,
        )
        .unwrap_err();
        assert!(matches!(err, RiskError::TierOrder { .. }));

        let err = RiskScale::new(
            vec![
                RiskBand {
                    min_score: 10,
                    tier: RiskTier::High,
                },
                RiskBand {
                    min_score: 10,
                    tier: RiskTier::Medium,
                },
            ],
            RiskTier::Low,
        )
        .unwrap_err();
        assert!(matches!(err, RiskError::ThresholdOrder { .. }));

        assert_eq!(
            RiskScale::new(vec![], RiskTier::Low).unwrap_err(),
            RiskError::NoBands
        );
    }

    #[test]
    fn test_scale_deserializes_with_validation() {
        let scale: RiskScale = serde_json::from_str(
            r#"{"bands":[{"min_score":30,"tier":"Critical"},{"min_score":10,"tier":"Very High"}],"floor":"Low"}"#,
        )
        .unwrap();
        assert_eq!(scale.categorize(12), RiskTier::VeryHigh);

        let bad = serde_json::from_str::<RiskScale>(
            r#"{"bands":[{"min_score":10,"tier":"Low"}],"floor":"High"}"#,
        );
        assert!(bad.is_err());
    }
}
