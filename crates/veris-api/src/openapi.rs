//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec.
//! Serves at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
///
/// Registers all utoipa-documented routes, schemas, and tags. Serves as
/// the single source of truth for integrators.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Veris Risk Scoring Service",
        version = "0.3.2",
        description = "Computes composite compliance risk scores per user scope.\n\nProvides:\n- **Score calculation** from aggregated task and risk metrics (weighted factors: task completion 40%, risk mitigation 40%, timely completion 20%)\n- **Append-only score history** with pagination, persisted to PostgreSQL when configured\n- **Trend classification** (IMPROVING / DECLINING / STABLE / UNKNOWN) between consecutive snapshots\n- **Task-completion webhook** triggering asynchronous recalculation\n- **Mirror sync endpoints** for local-mode aggregation without an upstream data service\n\nScores range 0-100, lower is better. Health probes (`/health/*`) and `/metrics` are always available.",
        license(name = "Apache-2.0"),
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    paths(
        // ── Risk scores ──────────────────────────────────────────────
        crate::routes::scores::calculate_score,
        crate::routes::scores::latest_score,
        crate::routes::scores::score_history,
        crate::routes::scores::score_trend,
        // ── Task events ──────────────────────────────────────────────
        crate::routes::events::task_completed,
        // ── Mirror sync ──────────────────────────────────────────────
        crate::routes::sync::sync_tasks,
        crate::routes::sync::sync_risks,
    ),
    components(
        schemas(
            // ── State record types ───────────────────────────────────
            crate::state::TaskRecord,
            crate::state::TaskStatus,
            crate::state::RiskRecord,
            crate::state::RiskSeverity,
            crate::state::RiskStatus,
            // ── Error types ──────────────────────────────────────────
            crate::error::ErrorBody,
            crate::error::ErrorDetail,
            // ── Score DTOs ───────────────────────────────────────────
            crate::routes::scores::CalculateScoreRequest,
            crate::routes::scores::SnapshotView,
            crate::routes::scores::FactorsView,
            crate::routes::scores::DeltaView,
            crate::routes::scores::LatestScoreResponse,
            crate::routes::scores::TrendResponse,
            crate::routes::scores::ScoreHistoryResponse,
            // ── Event DTOs ───────────────────────────────────────────
            crate::routes::events::TaskCompletedEvent,
            crate::routes::events::EventAccepted,
            // ── Sync DTOs ────────────────────────────────────────────
            crate::routes::sync::SyncTasksRequest,
            crate::routes::sync::TaskSyncItem,
            crate::routes::sync::SyncRisksRequest,
            crate::routes::sync::RiskSyncItem,
            crate::routes::sync::SyncResponse,
        ),
    ),
    tags(
        (name = "risks", description = "Risk score calculation, latest score, history, and trend"),
        (name = "events", description = "Webhooks from the task subsystem"),
        (name = "sync", description = "Bulk read-model pushes for local-mode aggregation"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
///
/// Serves the OpenAPI JSON spec at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
