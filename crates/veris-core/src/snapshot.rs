//! Immutable risk score snapshots.
//!
//! A snapshot records one complete calculation for a scope. Snapshots are
//! never updated in place — the history of a scope is a strictly
//! append-only sequence, and "latest" is always the snapshot with the
//! maximum `(created_at, id)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::framework::Framework;
use crate::metrics::ScopeMetrics;
use crate::scope::{Scope, UserId};
use crate::score::{CalculationFactors, ScoreBreakdown};

/// What caused a score calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTrigger {
    /// A task in the scope was marked complete.
    TaskCompletion,
    /// An explicit refresh request from a user or client.
    ManualRefresh,
    /// Requested by the AI assistant on the user's behalf.
    AiCalculation,
    /// The background recompute sweep.
    Scheduled,
}

impl ScoreTrigger {
    /// Return the string representation of this trigger.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskCompletion => "task_completion",
            Self::ManualRefresh => "manual_refresh",
            Self::AiCalculation => "ai_calculation",
            Self::Scheduled => "scheduled",
        }
    }
}

impl std::fmt::Display for ScoreTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable, timestamped risk-score calculation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScoreSnapshot {
    /// Unique snapshot identifier.
    pub id: Uuid,
    /// Owner scope.
    pub user_id: UserId,
    /// Framework narrowing; `None` means all frameworks aggregated.
    pub framework_id: Option<Framework>,
    /// Composite risk score, 0–100, lower is better. Full precision.
    pub overall_risk_score: f64,
    /// Unmitigated high-severity risks at calculation time.
    pub high_risks: u64,
    /// Unmitigated medium-severity risks at calculation time.
    pub medium_risks: u64,
    /// Unmitigated low-severity risks at calculation time.
    pub low_risks: u64,
    /// Mitigated risks at calculation time.
    pub mitigated_risks: u64,
    /// Total tasks in scope at calculation time.
    pub total_tasks: u64,
    /// Completed tasks at calculation time.
    pub completed_tasks: u64,
    /// The four factor sub-scores. Full precision.
    pub calculation_factors: CalculationFactors,
    /// What caused this calculation.
    pub triggered_by: ScoreTrigger,
    /// When the calculation happened.
    pub created_at: DateTime<Utc>,
}

impl RiskScoreSnapshot {
    /// Assemble a snapshot from a calculation result.
    ///
    /// Generates a fresh id and stamps the current time; the metrics are
    /// copied so the snapshot stands alone once the mirrors move on.
    pub fn from_breakdown(
        scope: &Scope,
        metrics: &ScopeMetrics,
        breakdown: &ScoreBreakdown,
        triggered_by: ScoreTrigger,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: scope.user_id.clone(),
            framework_id: scope.framework,
            overall_risk_score: breakdown.overall_risk_score,
            high_risks: metrics.high_risks,
            medium_risks: metrics.medium_risks,
            low_risks: metrics.low_risks,
            mitigated_risks: metrics.mitigated_risks,
            total_tasks: metrics.total_tasks,
            completed_tasks: metrics.completed_tasks,
            calculation_factors: breakdown.factors,
            triggered_by,
            created_at: Utc::now(),
        }
    }

    /// The scope this snapshot belongs to.
    pub fn scope(&self) -> Scope {
        Scope::new(self.user_id.clone(), self.framework_id)
    }
}
