//! # veris-core — Risk Scoring Domain
//!
//! Pure domain logic for the Veris risk scoring service. This crate has no
//! I/O: it defines the scope and framework vocabulary, validates raw
//! aggregated metrics, converts them into factor scores and a composite
//! risk score, and classifies the trend between consecutive snapshots.
//!
//! ## Scoring Model
//!
//! A calculation for scope `(user, framework?)` proceeds:
//!
//! ```text
//! ScopeMetrics → CalculationFactors → overall_risk_score (0–100, lower is better)
//! ```
//!
//! Three base factors are normalized percentages (task completion, risk
//! mitigation, timely completion). `overall_health` is their weighted
//! average (default weights 0.4 / 0.4 / 0.2) and the risk score is
//! `100 − overall_health`. The weighting is chosen so that increasing the
//! count of unmitigated high-severity risks can never lower the risk score.
//!
//! Every calculation is recorded as an immutable [`RiskScoreSnapshot`];
//! the [`trend`] module derives the direction of change between the two
//! most recent snapshots of a scope at read time.

pub mod framework;
pub mod metrics;
pub mod scope;
pub mod score;
pub mod snapshot;
pub mod trend;

// Re-export primary types.
pub use framework::Framework;
pub use metrics::{InvalidMetricsError, ScopeMetrics};
pub use scope::{Scope, ScopeError, UserId};
pub use score::{calculate, round1, CalculationFactors, ScoreBreakdown, ScoreWeights, WeightError};
pub use snapshot::{RiskScoreSnapshot, ScoreTrigger};
pub use trend::{classify, ScoreDelta, Trend, DEFAULT_TREND_THRESHOLD};
