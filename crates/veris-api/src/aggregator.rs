//! # Metrics Aggregation and Scoring Pipeline
//!
//! Collects task and risk counts for a scope and runs the full
//! calculate-and-record pipeline used by the score routes, the
//! task-completion webhook, and the background recompute sweep.
//!
//! ## Data sources
//!
//! Aggregation reads from exactly one source per request:
//!
//! - **Upstream mode**: when a compliance data client is configured, the
//!   counts come from the upstream service. Upstream failures surface as
//!   502 and nothing is recorded.
//! - **Local mode**: otherwise counts are derived from the in-memory
//!   task/risk mirrors fed through the sync endpoints.
//!
//! ## Consistency
//!
//! When a database pool is present the snapshot row is inserted first and
//! the in-memory append happens only after the insert succeeds, so readers
//! can never observe a snapshot that was not durably recorded.

use veris_core::{
    calculate, RiskScoreSnapshot, Scope, ScopeMetrics, ScoreTrigger,
};

use crate::error::AppError;
use crate::state::{AppState, RiskSeverity, RiskStatus, TaskStatus};

/// Collect current task and risk counts for a scope.
///
/// Counts every record the scope contains; a scope without a framework
/// aggregates across all frameworks for the user.
pub async fn aggregate(state: &AppState, scope: &Scope) -> Result<ScopeMetrics, AppError> {
    if let Some(client) = &state.upstream {
        let metrics = client.scope_metrics(scope).await?;
        return Ok(metrics);
    }

    let mut metrics = ScopeMetrics::default();

    for task in state.tasks.list() {
        if !scope.contains(&task.user_id, task.framework_id) {
            continue;
        }
        metrics.total_tasks += 1;
        if task.status == TaskStatus::Completed {
            metrics.completed_tasks += 1;
            if task.is_on_time() {
                metrics.tasks_on_time += 1;
            }
        }
    }

    for risk in state.risks.list() {
        if !scope.contains(&risk.user_id, risk.framework_id) {
            continue;
        }
        match risk.status {
            RiskStatus::Mitigated => metrics.mitigated_risks += 1,
            RiskStatus::Open => match risk.severity {
                RiskSeverity::High => metrics.high_risks += 1,
                RiskSeverity::Medium => metrics.medium_risks += 1,
                RiskSeverity::Low => metrics.low_risks += 1,
            },
        }
    }

    Ok(metrics)
}

/// Run the full pipeline: aggregate, score, persist, append.
///
/// Returns the recorded snapshot. Any failure leaves the history
/// unchanged — a snapshot that failed to persist is discarded rather
/// than appended in-memory.
pub async fn calculate_and_record(
    state: &AppState,
    scope: &Scope,
    trigger: ScoreTrigger,
) -> Result<RiskScoreSnapshot, AppError> {
    let metrics = aggregate(state, scope).await?;
    let breakdown = calculate(&metrics, &state.config.weights)?;
    let snapshot = RiskScoreSnapshot::from_breakdown(scope, &metrics, &breakdown, trigger);

    if let Some(pool) = &state.db_pool {
        crate::db::snapshots::insert(pool, &snapshot).await?;
    }

    state.snapshots.append(snapshot.clone());

    tracing::info!(
        scope = %scope,
        score = snapshot.overall_risk_score,
        trigger = %trigger,
        "recorded risk score snapshot"
    );

    Ok(snapshot)
}
