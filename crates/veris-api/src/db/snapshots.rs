//! Snapshot persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `risk_score_snapshots`
//! table. Snapshots are immutable once created — there are no update or
//! delete operations. The table is write-through only: serving reads (latest,
//! history, trend) come from the in-memory log, which `load_all` rebuilds at
//! startup.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use veris_core::{CalculationFactors, Framework, RiskScoreSnapshot, ScoreTrigger, UserId};

const SELECT_COLUMNS: &str = "id, user_id, framework_id, overall_risk_score,
     high_risks, medium_risks, low_risks, mitigated_risks,
     total_tasks, completed_tasks,
     factor_task_completion, factor_risk_mitigation,
     factor_timely_completion, factor_overall_health,
     triggered_by, created_at";

/// Insert a new snapshot row.
///
/// Called before the in-memory append, so a failed insert leaves no trace
/// of the calculation anywhere.
pub async fn insert(pool: &PgPool, snap: &RiskScoreSnapshot) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO risk_score_snapshots (id, user_id, framework_id,
         overall_risk_score, high_risks, medium_risks, low_risks,
         mitigated_risks, total_tasks, completed_tasks,
         factor_task_completion, factor_risk_mitigation,
         factor_timely_completion, factor_overall_health,
         triggered_by, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
    )
    .bind(snap.id)
    .bind(snap.user_id.as_str())
    .bind(snap.framework_id.map(|f| f.as_str()))
    .bind(snap.overall_risk_score)
    .bind(to_db_count(snap.high_risks, "high_risks"))
    .bind(to_db_count(snap.medium_risks, "medium_risks"))
    .bind(to_db_count(snap.low_risks, "low_risks"))
    .bind(to_db_count(snap.mitigated_risks, "mitigated_risks"))
    .bind(to_db_count(snap.total_tasks, "total_tasks"))
    .bind(to_db_count(snap.completed_tasks, "completed_tasks"))
    .bind(snap.calculation_factors.task_completion)
    .bind(snap.calculation_factors.risk_mitigation)
    .bind(snap.calculation_factors.timely_completion)
    .bind(snap.calculation_factors.overall_health)
    .bind(snap.triggered_by.as_str())
    .bind(snap.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load all snapshots from the database into the in-memory log on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<RiskScoreSnapshot>, sqlx::Error> {
    let query = format!(
        "SELECT {SELECT_COLUMNS} FROM risk_score_snapshots ORDER BY created_at, id"
    );

    let rows = sqlx::query_as::<_, SnapshotRow>(&query)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().filter_map(SnapshotRow::into_snapshot).collect())
}

/// Clamp a count for BIGINT storage. Counts come from `u64` aggregation
/// and in practice never approach `i64::MAX`.
fn to_db_count(value: u64, field: &'static str) -> i64 {
    i64::try_from(value).unwrap_or_else(|_| {
        tracing::warn!(field, value, "count exceeds i64::MAX — clamping for DB storage");
        i64::MAX
    })
}

fn from_db_count(value: i64, field: &'static str) -> u64 {
    u64::try_from(value).unwrap_or_else(|_| {
        tracing::warn!(field, value, "count is negative in database — defaulting to 0");
        0
    })
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct SnapshotRow {
    id: Uuid,
    user_id: String,
    framework_id: Option<String>,
    overall_risk_score: f64,
    high_risks: i64,
    medium_risks: i64,
    low_risks: i64,
    mitigated_risks: i64,
    total_tasks: i64,
    completed_tasks: i64,
    factor_task_completion: f64,
    factor_risk_mitigation: f64,
    factor_timely_completion: f64,
    factor_overall_health: f64,
    triggered_by: String,
    created_at: DateTime<Utc>,
}

impl SnapshotRow {
    /// Convert a database row back to the domain type.
    ///
    /// Rows that fail domain validation (written by an older or newer
    /// service version) are logged and skipped rather than failing the
    /// whole query.
    fn into_snapshot(self) -> Option<RiskScoreSnapshot> {
        let user_id = match UserId::new(self.user_id) {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(snapshot_id = %self.id, error = %err, "skipping snapshot with invalid user_id");
                return None;
            }
        };

        let framework_id = match &self.framework_id {
            None => None,
            Some(raw) => match Framework::parse(raw) {
                Some(f) => Some(f),
                None => {
                    tracing::warn!(snapshot_id = %self.id, framework = %raw, "skipping snapshot with unknown framework");
                    return None;
                }
            },
        };

        let triggered_by = match self.triggered_by.as_str() {
            "task_completion" => ScoreTrigger::TaskCompletion,
            "manual_refresh" => ScoreTrigger::ManualRefresh,
            "ai_calculation" => ScoreTrigger::AiCalculation,
            "scheduled" => ScoreTrigger::Scheduled,
            other => {
                tracing::warn!(snapshot_id = %self.id, trigger = %other, "unknown trigger in database — treating as manual_refresh");
                ScoreTrigger::ManualRefresh
            }
        };

        Some(RiskScoreSnapshot {
            id: self.id,
            user_id,
            framework_id,
            overall_risk_score: self.overall_risk_score,
            high_risks: from_db_count(self.high_risks, "high_risks"),
            medium_risks: from_db_count(self.medium_risks, "medium_risks"),
            low_risks: from_db_count(self.low_risks, "low_risks"),
            mitigated_risks: from_db_count(self.mitigated_risks, "mitigated_risks"),
            total_tasks: from_db_count(self.total_tasks, "total_tasks"),
            completed_tasks: from_db_count(self.completed_tasks, "completed_tasks"),
            calculation_factors: CalculationFactors {
                task_completion: self.factor_task_completion,
                risk_mitigation: self.factor_risk_mitigation,
                timely_completion: self.factor_timely_completion,
                overall_health: self.factor_overall_health,
            },
            triggered_by,
            created_at: self.created_at,
        })
    }
}
