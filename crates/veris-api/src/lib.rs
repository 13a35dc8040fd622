//! # veris-api — Risk Scoring Service
//!
//! Axum HTTP service that computes composite compliance risk scores per
//! user scope, keeps an append-only score history, and classifies the
//! trend between consecutive snapshots.
//!
//! ## API Surface
//!
//! | Route                           | Module              | Purpose                      |
//! |---------------------------------|---------------------|------------------------------|
//! | `POST /api/risks/calculate-score` | [`routes::scores`] | Run the scoring pipeline     |
//! | `GET /api/risks/latest-score`   | [`routes::scores`]  | Latest snapshot with trend   |
//! | `GET /api/risks/score-history`  | [`routes::scores`]  | Paginated history            |
//! | `GET /api/risks/score-trend`    | [`routes::scores`]  | Trend classification         |
//! | `POST /api/events/task-completed` | [`routes::events`] | Async recompute webhook     |
//! | `PUT /api/sync/tasks`           | [`routes::sync`]    | Replace task mirror          |
//! | `PUT /api/sync/risks`           | [`routes::sync`]    | Replace risk mirror          |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → Handler
//! ```
//!
//! ## OpenAPI
//!
//! Auto-generated OpenAPI spec via utoipa derive macros at `/openapi.json`.

pub mod aggregator;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod scheduler;
pub mod state;

use std::collections::HashMap;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

use crate::middleware::metrics::{ApiMetrics, DomainSample};
use crate::state::{AppState, RiskStatus, TaskStatus};

/// Check if metrics are enabled via the `VERIS_METRICS_ENABLED` env var.
/// Defaults to `true` when the variable is absent or set to anything other than `"false"`.
fn metrics_enabled() -> bool {
    std::env::var("VERIS_METRICS_ENABLED")
        .map(|v| v.to_lowercase() != "false")
        .unwrap_or(true)
}

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) and `/metrics` are mounted outside the
/// request-metrics middleware so probe traffic does not pollute the
/// per-endpoint counters.
pub fn app(state: AppState) -> Router {
    let metrics = ApiMetrics::new();
    let metrics_on = metrics_enabled();

    // Body size limit: 2 MiB. Sync pushes are the largest payloads and
    // stay well under this with the item cap in place.
    let mut api = Router::new()
        .merge(routes::scores::router())
        .merge(routes::events::router())
        .merge(routes::sync::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024));

    // Only register the metrics middleware when metrics are enabled.
    if metrics_on {
        api = api
            .layer(from_fn(middleware::metrics::metrics_middleware))
            .layer(axum::Extension(metrics.clone()));
    }

    let api = api.layer(TraceLayer::new_for_http()).with_state(state.clone());

    let mut probes = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    if metrics_on {
        probes = probes
            .route("/metrics", axum::routing::get(prometheus_metrics))
            .layer(axum::Extension(metrics));
    }

    let probes = probes.with_state(state);

    Router::new().merge(probes).merge(api)
}

/// GET /metrics — Prometheus metrics scrape endpoint.
///
/// Updates domain gauges from current `AppState` on each scrape (pull
/// model), then gathers and encodes all metrics in Prometheus text
/// exposition format.
async fn prometheus_metrics(
    State(state): State<AppState>,
    Extension(metrics): Extension<ApiMetrics>,
) -> impl IntoResponse {
    let mut sample = DomainSample {
        snapshots: state.snapshots.len(),
        scored_scopes: state.snapshots.scopes().len(),
        ..Default::default()
    };

    for task in &state.tasks.list() {
        match task.status {
            TaskStatus::Open => sample.open_tasks += 1,
            TaskStatus::Completed => sample.completed_tasks += 1,
        }
    }

    let mut open_by_severity: HashMap<&'static str, usize> = HashMap::new();
    for risk in &state.risks.list() {
        match risk.status {
            RiskStatus::Open => {
                sample.open_risks += 1;
                *open_by_severity.entry(risk.severity.as_str()).or_default() += 1;
            }
            RiskStatus::Mitigated => sample.mitigated_risks += 1,
        }
    }
    sample.open_by_severity = open_by_severity.into_iter().collect();

    metrics.observe_domain(&sample);

    match metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode Prometheus metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — verifies the application is ready to serve traffic.
///
/// Checks:
/// - In-memory stores are accessible.
/// - Database connection is healthy (when configured).
/// - Upstream compliance data service connectivity (when configured).
///
/// Returns 200 "ready" or 503 with a diagnostic message.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    // Verify stores are accessible (read lock acquirable).
    let _ = state.tasks.len();
    let _ = state.risks.len();
    let _ = state.snapshots.len();

    // Verify database connection (when configured).
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!("Database health check failed: {e}");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }

    // Verify upstream connectivity (when configured). Local mode runs
    // without an upstream, so its absence does not fail readiness.
    if let Some(client) = &state.upstream {
        if let Err(e) = client.health_check().await {
            tracing::warn!("Upstream health check failed: {e}");
            return (StatusCode::SERVICE_UNAVAILABLE, "upstream unreachable").into_response();
        }
    }

    (StatusCode::OK, "ready").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn liveness_returns_ok() {
        let app = app(AppState::new());
        let req = Request::builder()
            .uri("/health/liveness")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn readiness_without_db_or_upstream_is_ready() {
        let app = app(AppState::new());
        let req = Request::builder()
            .uri("/health/readiness")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_endpoint_reports_domain_gauges() {
        let state = AppState::new();
        let scope = veris_core::Scope::new(
            veris_core::UserId::new("u1").unwrap(),
            None,
        );
        crate::aggregator::calculate_and_record(
            &state,
            &scope,
            veris_core::ScoreTrigger::ManualRefresh,
        )
        .await
        .unwrap();

        let app = app(state);
        let req = Request::builder()
            .uri("/metrics")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("veris_snapshots_total 1"));
        assert!(text.contains("veris_scored_scopes_total 1"));
    }

    #[tokio::test]
    async fn openapi_json_is_served() {
        let app = app(AppState::new());
        let req = Request::builder()
            .uri("/openapi.json")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let app = app(AppState::new());
        let req = Request::builder()
            .uri("/api/risks/nonexistent")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
