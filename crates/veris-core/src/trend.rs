//! Trend classification between consecutive snapshots.
//!
//! A pure read-time derivation: nothing here is persisted. The trend of a
//! scope is computed from its two most recent snapshots; a scope with
//! fewer than two snapshots has trend [`Trend::Unknown`], which is a
//! normal state for a fresh scope, not an error.

use serde::{Deserialize, Serialize};

use crate::snapshot::RiskScoreSnapshot;

/// Absolute score change below which a delta counts as noise.
pub const DEFAULT_TREND_THRESHOLD: f64 = 0.1;

/// Direction of change between the two most recent snapshots of a scope.
///
/// Lower risk is better, so a decreasing score is `Improving`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    /// Risk score decreased by at least the noise threshold.
    Improving,
    /// Risk score increased by at least the noise threshold.
    Declining,
    /// Absolute change below the noise threshold.
    Stable,
    /// Fewer than two snapshots exist for the scope.
    Unknown,
}

impl Trend {
    /// Return the string representation of this trend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Improving => "IMPROVING",
            Self::Declining => "DECLINING",
            Self::Stable => "STABLE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured delta between the two most recent snapshots.
///
/// `change = after - before`; consumers interpret negative change as
/// improvement. `trigger` is the latest snapshot's trigger tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreDelta {
    /// Previous overall risk score.
    pub before: f64,
    /// Latest overall risk score.
    pub after: f64,
    /// `after - before`.
    pub change: f64,
    /// Trigger tag of the latest snapshot.
    pub trigger: String,
}

/// Classify the trend for a scope from its latest and second-latest
/// snapshots, newest first.
///
/// Returns the trend and, when two snapshots exist, the structured delta.
/// A non-finite or non-positive `threshold` falls back to
/// [`DEFAULT_TREND_THRESHOLD`].
pub fn classify(
    latest: &RiskScoreSnapshot,
    previous: Option<&RiskScoreSnapshot>,
    threshold: f64,
) -> (Trend, Option<ScoreDelta>) {
    let threshold = if threshold.is_finite() && threshold > 0.0 {
        threshold
    } else {
        DEFAULT_TREND_THRESHOLD
    };

    let previous = match previous {
        Some(p) => p,
        None => return (Trend::Unknown, None),
    };

    let before = previous.overall_risk_score;
    let after = latest.overall_risk_score;
    let change = after - before;

    let trend = if change.abs() < threshold {
        Trend::Stable
    } else if change < 0.0 {
        Trend::Improving
    } else {
        Trend::Declining
    };

    let delta = ScoreDelta {
        before,
        after,
        change,
        trigger: latest.triggered_by.as_str().to_string(),
    };

    (trend, Some(delta))
}
