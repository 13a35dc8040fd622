//! Score calculation.
//!
//! Converts validated [`ScopeMetrics`] into four factor scores and the
//! composite risk score. Pure: no clock, no I/O, no randomness.
//!
//! ## Formula
//!
//! ```text
//! task_completion   = completed / max(total, 1) * 100
//! risk_mitigation   = mitigated / max(all risks, 1) * 100
//! timely_completion = on_time / completed * 100        (100 when completed = 0)
//! overall_health    = 0.4·completion + 0.4·mitigation + 0.2·timeliness
//! overall_risk      = 100 − overall_health
//! ```
//!
//! Increasing `high_risks` with everything else fixed shrinks
//! `risk_mitigation`, which lowers health and raises risk, so the score is
//! monotone in unmitigated risk counts. All five outputs are bounded in
//! [0, 100] for any valid input.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metrics::{InvalidMetricsError, ScopeMetrics};

/// Weights do not form a convex combination.
#[derive(Debug, Error, PartialEq)]
pub enum WeightError {
    /// A weight was negative or NaN.
    #[error("weights must be non-negative finite numbers")]
    InvalidWeight,

    /// The weights do not sum to 1.
    #[error("weights must sum to 1.0, got {sum}")]
    BadSum {
        /// Actual sum of the three weights.
        sum: f64,
    },
}

/// Weights blending the three base factors into `overall_health`.
///
/// Must sum to 1; validated by [`ScoreWeights::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Weight of the task-completion factor.
    pub task_completion: f64,
    /// Weight of the risk-mitigation factor.
    pub risk_mitigation: f64,
    /// Weight of the timely-completion factor.
    pub timely_completion: f64,
}

impl ScoreWeights {
    /// Check that all weights are finite, non-negative, and sum to 1.
    pub fn validate(&self) -> Result<(), WeightError> {
        let ws = [
            self.task_completion,
            self.risk_mitigation,
            self.timely_completion,
        ];
        if ws.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(WeightError::InvalidWeight);
        }
        let sum: f64 = ws.iter().sum();
        if (sum - 1.0).abs() > 1e-9 {
            return Err(WeightError::BadSum { sum });
        }
        Ok(())
    }
}

impl Default for ScoreWeights {
    /// Default blend: completion 0.4, mitigation 0.4, timeliness 0.2.
    fn default() -> Self {
        Self {
            task_completion: 0.4,
            risk_mitigation: 0.4,
            timely_completion: 0.2,
        }
    }
}

/// The four factor scores, each in [0, 100]. Stored at full precision;
/// [`round1`] produces the one-decimal display form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalculationFactors {
    /// Percentage of tasks completed.
    pub task_completion: f64,
    /// Percentage of identified risks mitigated.
    pub risk_mitigation: f64,
    /// Percentage of completed tasks finished on time.
    pub timely_completion: f64,
    /// Weighted blend of the three factors above.
    pub overall_health: f64,
}

impl CalculationFactors {
    /// Copy with every factor rounded to one decimal place.
    pub fn rounded(&self) -> Self {
        Self {
            task_completion: round1(self.task_completion),
            risk_mitigation: round1(self.risk_mitigation),
            timely_completion: round1(self.timely_completion),
            overall_health: round1(self.overall_health),
        }
    }
}

/// Result of one score calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// The four factor scores.
    pub factors: CalculationFactors,
    /// Composite risk score, 0–100, lower is better.
    pub overall_risk_score: f64,
}

/// Round to one decimal place for display.
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Clamp a computed percentage into [0, 100].
fn pct(numerator: u64, denominator: u64) -> f64 {
    let d = denominator.max(1);
    ((numerator as f64 / d as f64) * 100.0).clamp(0.0, 100.0)
}

/// Compute the factor scores and composite risk score for a scope.
///
/// Validates the metrics invariants first; an invariant violation is an
/// upstream data-integrity bug and propagates as [`InvalidMetricsError`].
///
/// Empty-scope defaults: with no tasks, `task_completion` is 0; with no
/// completed tasks, `timely_completion` is 100 (an empty scope is not
/// penalized for timeliness); with no known risks, `risk_mitigation` is 0.
pub fn calculate(
    metrics: &ScopeMetrics,
    weights: &ScoreWeights,
) -> Result<ScoreBreakdown, InvalidMetricsError> {
    metrics.validate()?;
    debug_assert!(weights.validate().is_ok(), "weights must be validated");

    let task_completion = pct(metrics.completed_tasks, metrics.total_tasks);
    let risk_mitigation = pct(metrics.mitigated_risks, metrics.total_risks());
    let timely_completion = if metrics.completed_tasks == 0 {
        100.0
    } else {
        pct(metrics.tasks_on_time, metrics.completed_tasks)
    };

    let overall_health = (task_completion * weights.task_completion
        + risk_mitigation * weights.risk_mitigation
        + timely_completion * weights.timely_completion)
        .clamp(0.0, 100.0);

    Ok(ScoreBreakdown {
        factors: CalculationFactors {
            task_completion,
            risk_mitigation,
            timely_completion,
            overall_health,
        },
        overall_risk_score: (100.0 - overall_health).clamp(0.0, 100.0),
    })
}
