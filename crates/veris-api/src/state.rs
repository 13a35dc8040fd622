//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! ## Architecture
//!
//! `AppState` holds the scoring service's own data and its view of the
//! upstream world:
//!
//! - **Task/risk mirrors** — in-memory read-models of the task and risk
//!   subsystems, populated through the sync endpoints. Used by the
//!   aggregator when no upstream client is configured.
//! - **Snapshot log** — the append-only history of score calculations,
//!   the only data this service owns durably. Optionally persisted to
//!   Postgres and hydrated back on startup.
//! - **Upstream client** — typed client for the compliance data API; when
//!   present, aggregation queries it instead of the mirrors.
//!
//! All locks are `parking_lot` and are never held across `.await` points.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use veris_core::{
    Framework, RiskScoreSnapshot, Scope, ScoreWeights, UserId, DEFAULT_TREND_THRESHOLD,
};

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not
/// `tokio::sync`) because the lock is never held across `.await` points.
/// `parking_lot::RwLock` is non-poisonable — a panicking writer does not
/// permanently corrupt the store.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Retrieve a record by ID.
    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// List all records.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Update a record in place. Returns the updated record, or `None` if
    /// not found.
    pub fn update(&self, id: &Uuid, f: impl FnOnce(&mut T)) -> Option<T> {
        let mut guard = self.data.write();
        if let Some(entry) = guard.get_mut(id) {
            f(entry);
            Some(entry.clone())
        } else {
            None
        }
    }

    /// Keep only the records matching the predicate, under one write lock.
    pub fn retain(&self, f: impl FnMut(&Uuid, &mut T) -> bool) {
        self.data.write().retain(f);
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Mirrored Record Types ----------------------------------------------------
//
// Read-models of data owned by the task and risk subsystems. The scoring
// service never creates or deletes these on its own; they arrive through
// the sync endpoints and the task-completed webhook.

/// Completion status of a mirrored task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not yet completed.
    Open,
    /// Marked complete by the task subsystem.
    Completed,
}

/// Mirrored remediation task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: Uuid,
    #[schema(value_type = String)]
    pub user_id: UserId,
    #[schema(value_type = Option<String>)]
    pub framework_id: Option<Framework>,
    pub status: TaskStatus,
    /// Due date, if the task has one.
    pub due_at: Option<DateTime<Utc>>,
    /// When the task was completed. `None` while open.
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskRecord {
    /// Whether this task counts as completed on time.
    ///
    /// A completed task with no due date is on time. A completed task with
    /// a due date but no recorded completion time cannot be shown to be on
    /// time and is counted late.
    pub fn is_on_time(&self) -> bool {
        if self.status != TaskStatus::Completed {
            return false;
        }
        match (self.due_at, self.completed_at) {
            (None, _) => true,
            (Some(due), Some(done)) => done <= due,
            (Some(_), None) => false,
        }
    }
}

/// Severity of a mirrored risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RiskSeverity {
    High,
    Medium,
    Low,
}

impl RiskSeverity {
    /// Return the string representation of this severity.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Mitigation status of a mirrored risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RiskStatus {
    /// Identified and not yet mitigated.
    Open,
    /// Mitigated.
    Mitigated,
}

/// Mirrored risk record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskRecord {
    pub id: Uuid,
    #[schema(value_type = String)]
    pub user_id: UserId,
    #[schema(value_type = Option<String>)]
    pub framework_id: Option<Framework>,
    pub severity: RiskSeverity,
    pub status: RiskStatus,
}

// -- Snapshot Log -------------------------------------------------------------

/// Append-only in-memory log of risk score snapshots.
///
/// The authoritative copy lives in Postgres when a pool is configured; the
/// log is hydrated from it on startup and appended to only after a durable
/// insert succeeds. Reads never block writers beyond the short critical
/// section.
#[derive(Debug, Clone, Default)]
pub struct SnapshotLog {
    entries: Arc<RwLock<Vec<RiskScoreSnapshot>>>,
}

/// Ordering key for "most recent": `created_at`, then `id` as a
/// deterministic tie-break for near-simultaneous appends.
fn recency_key(s: &RiskScoreSnapshot) -> (DateTime<Utc>, Uuid) {
    (s.created_at, s.id)
}

impl SnapshotLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snapshot. Never overwrites an existing entry.
    pub fn append(&self, snapshot: RiskScoreSnapshot) {
        self.entries.write().push(snapshot);
    }

    /// Most recent snapshot for a scope, or `None` for a fresh scope.
    pub fn latest(&self, scope: &Scope) -> Option<RiskScoreSnapshot> {
        self.entries
            .read()
            .iter()
            .filter(|s| s.user_id == scope.user_id && s.framework_id == scope.framework)
            .max_by_key(|s| recency_key(s))
            .cloned()
    }

    /// The two most recent snapshots for a scope, newest first.
    pub fn latest_two(&self, scope: &Scope) -> Vec<RiskScoreSnapshot> {
        self.history(scope, 2, 0)
    }

    /// Snapshots for a scope ordered descending by recency, paginated.
    pub fn history(&self, scope: &Scope, limit: usize, offset: usize) -> Vec<RiskScoreSnapshot> {
        let mut matching: Vec<RiskScoreSnapshot> = self
            .entries
            .read()
            .iter()
            .filter(|s| s.user_id == scope.user_id && s.framework_id == scope.framework)
            .cloned()
            .collect();
        matching.sort_by_key(|s| std::cmp::Reverse(recency_key(s)));
        matching.into_iter().skip(offset).take(limit).collect()
    }

    /// Every distinct scope with at least one snapshot. Used by the
    /// scheduled recompute sweep.
    pub fn scopes(&self) -> Vec<Scope> {
        let mut scopes: Vec<Scope> = Vec::new();
        for s in self.entries.read().iter() {
            let scope = s.scope();
            if !scopes.contains(&scope) {
                scopes.push(scope);
            }
        }
        scopes
    }

    /// Total number of snapshots across all scopes.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// -- Application State --------------------------------------------------------

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Absolute score change below which a trend counts as stable.
    pub trend_threshold: f64,
    /// Factor weights used by every calculation.
    pub weights: ScoreWeights,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            trend_threshold: DEFAULT_TREND_THRESHOLD,
            weights: ScoreWeights::default(),
        }
    }
}

/// Shared application state accessible to all route handlers.
///
/// Clone-friendly via `Arc` internals in each store.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Mirrored tasks (local aggregation mode).
    pub tasks: Store<TaskRecord>,
    /// Mirrored risks (local aggregation mode).
    pub risks: Store<RiskRecord>,
    /// Append-only score history.
    pub snapshots: SnapshotLog,
    /// PostgreSQL pool for durable snapshot persistence. `None` means
    /// in-memory-only mode.
    pub db_pool: Option<PgPool>,
    /// Client for the upstream compliance data API. When present, the
    /// aggregator queries it instead of the local mirrors.
    pub upstream: Option<veris_client::ComplianceClient>,
    /// Configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Create a new application state with default configuration, no
    /// database, and no upstream client.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None, None)
    }

    /// Create a new application state with the given configuration,
    /// optional upstream client, and optional database pool.
    pub fn with_config(
        config: AppConfig,
        upstream: Option<veris_client::ComplianceClient>,
        db_pool: Option<PgPool>,
    ) -> Self {
        Self {
            tasks: Store::new(),
            risks: Store::new(),
            snapshots: SnapshotLog::new(),
            db_pool,
            upstream,
            config,
        }
    }

    /// Hydrate the snapshot log from the database.
    ///
    /// Called once on startup when a pool is available, so reads stay
    /// synchronous after boot.
    pub async fn hydrate_from_db(&self) -> Result<(), String> {
        let pool = match &self.db_pool {
            Some(pool) => pool,
            None => return Ok(()),
        };

        let snapshots = crate::db::snapshots::load_all(pool)
            .await
            .map_err(|e| format!("failed to load snapshots: {e}"))?;
        let count = snapshots.len();
        for snapshot in snapshots {
            self.snapshots.append(snapshot);
        }

        tracing::info!(snapshots = count, "Hydrated snapshot log from database");
        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
