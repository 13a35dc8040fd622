//! # Risk Score API
//!
//! Handles score calculation, latest-score retrieval, paginated history,
//! and trend classification for a scope.
//!
//! Scores are stored at full precision; every response renders them
//! rounded to one decimal place.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use veris_core::{
    classify, round1, RiskScoreSnapshot, ScoreDelta, ScoreTrigger, Trend,
};

use crate::aggregator::calculate_and_record;
use crate::error::AppError;
use crate::extractors::{check_user_id, extract_validated_json, Validate};
use crate::routes::{resolve_scope, ScopeQuery};
use crate::state::AppState;

const DEFAULT_HISTORY_LIMIT: u32 = 30;
const MAX_HISTORY_LIMIT: u32 = 100;

/// Request to calculate and record a new score.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalculateScoreRequest {
    pub user_id: String,
    #[serde(default)]
    pub framework_id: Option<String>,
    /// Defaults to `manual_refresh` when omitted.
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "manual_refresh")]
    pub trigger: Option<ScoreTrigger>,
}

impl Validate for CalculateScoreRequest {
    fn validate(&self) -> Result<(), String> {
        check_user_id(&self.user_id)
    }
}

/// Factor sub-scores, rounded for display.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FactorsView {
    pub task_completion: f64,
    pub risk_mitigation: f64,
    pub timely_completion: f64,
    pub overall_health: f64,
}

/// A snapshot as rendered in API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotView {
    pub id: Uuid,
    pub user_id: String,
    pub framework_id: Option<String>,
    /// 0–100, lower is better, one decimal place.
    pub overall_risk_score: f64,
    pub high_risks: u64,
    pub medium_risks: u64,
    pub low_risks: u64,
    pub mitigated_risks: u64,
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub calculation_factors: FactorsView,
    #[schema(value_type = String, example = "manual_refresh")]
    pub triggered_by: ScoreTrigger,
    pub created_at: DateTime<Utc>,
}

impl From<RiskScoreSnapshot> for SnapshotView {
    fn from(snap: RiskScoreSnapshot) -> Self {
        let factors = snap.calculation_factors.rounded();
        Self {
            id: snap.id,
            user_id: snap.user_id.as_str().to_string(),
            framework_id: snap.framework_id.map(|f| f.as_str().to_string()),
            overall_risk_score: round1(snap.overall_risk_score),
            high_risks: snap.high_risks,
            medium_risks: snap.medium_risks,
            low_risks: snap.low_risks,
            mitigated_risks: snap.mitigated_risks,
            total_tasks: snap.total_tasks,
            completed_tasks: snap.completed_tasks,
            calculation_factors: FactorsView {
                task_completion: factors.task_completion,
                risk_mitigation: factors.risk_mitigation,
                timely_completion: factors.timely_completion,
                overall_health: factors.overall_health,
            },
            triggered_by: snap.triggered_by,
            created_at: snap.created_at,
        }
    }
}

/// Delta between the two most recent snapshots, rounded for display.
///
/// `change` is recomputed from the rounded endpoints, so the rendered
/// values always satisfy `change = after - before`. Trend classification
/// still happens at full precision before rounding.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeltaView {
    pub before: f64,
    pub after: f64,
    pub change: f64,
    pub trigger: String,
}

impl From<ScoreDelta> for DeltaView {
    fn from(delta: ScoreDelta) -> Self {
        let before = round1(delta.before);
        let after = round1(delta.after);
        Self {
            before,
            after,
            change: round1(after - before),
            trigger: delta.trigger,
        }
    }
}

/// Latest snapshot with its trend.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LatestScoreResponse {
    pub snapshot: SnapshotView,
    #[schema(value_type = String, example = "IMPROVING")]
    pub trend: Trend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<DeltaView>,
}

/// Trend classification for a scope.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrendResponse {
    #[schema(value_type = String, example = "IMPROVING")]
    pub trend: Trend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<DeltaView>,
}

/// Paginated score history, newest first.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreHistoryResponse {
    pub user_id: String,
    pub framework_id: Option<String>,
    pub limit: u32,
    pub offset: u32,
    /// Number of snapshots in this page.
    pub count: usize,
    pub history: Vec<SnapshotView>,
}

/// Query parameters for the history endpoint.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub user_id: String,
    #[serde(default)]
    pub framework_id: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

/// Build the risk score router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/risks/calculate-score", post(calculate_score))
        .route("/api/risks/latest-score", get(latest_score))
        .route("/api/risks/score-history", get(score_history))
        .route("/api/risks/score-trend", get(score_trend))
}

/// Fetch the latest snapshot of a scope together with its trend.
///
/// Reads the snapshot log once, so the returned snapshot and the delta
/// always agree even when another calculation lands concurrently.
fn latest_with_trend(
    state: &AppState,
    scope: &veris_core::Scope,
) -> Option<(RiskScoreSnapshot, Trend, Option<DeltaView>)> {
    let mut recent = state.snapshots.latest_two(scope).into_iter();
    let latest = recent.next()?;
    let previous = recent.next();
    let (trend, delta) = classify(&latest, previous.as_ref(), state.config.trend_threshold);
    Some((latest, trend, delta.map(DeltaView::from)))
}

/// Classify the trend from the two newest in-memory snapshots of a scope.
fn scope_trend(state: &AppState, scope: &veris_core::Scope) -> (Trend, Option<DeltaView>) {
    match latest_with_trend(state, scope) {
        Some((_, trend, delta)) => (trend, delta),
        None => (Trend::Unknown, None),
    }
}

/// POST /api/risks/calculate-score — Run the scoring pipeline now.
#[utoipa::path(
    post,
    path = "/api/risks/calculate-score",
    request_body = CalculateScoreRequest,
    responses(
        (status = 201, description = "Snapshot recorded", body = SnapshotView),
        (status = 404, description = "Unknown framework", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid request", body = crate::error::ErrorBody),
        (status = 502, description = "Upstream data unavailable", body = crate::error::ErrorBody),
    ),
    tag = "risks"
)]
async fn calculate_score(
    State(state): State<AppState>,
    body: Result<Json<CalculateScoreRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SnapshotView>), AppError> {
    let req = extract_validated_json(body)?;
    let scope = resolve_scope(&req.user_id, req.framework_id.as_deref())?;
    let trigger = req.trigger.unwrap_or(ScoreTrigger::ManualRefresh);

    let snapshot = calculate_and_record(&state, &scope, trigger).await?;

    Ok((StatusCode::CREATED, Json(SnapshotView::from(snapshot))))
}

/// GET /api/risks/latest-score — Latest snapshot with trend.
///
/// Returns a JSON `null` body when the scope has no history, so callers
/// can distinguish "never scored" from an error.
#[utoipa::path(
    get,
    path = "/api/risks/latest-score",
    params(ScopeQuery),
    responses(
        (status = 200, description = "Latest snapshot, or null when no history exists",
         body = Option<LatestScoreResponse>),
        (status = 404, description = "Unknown framework", body = crate::error::ErrorBody),
    ),
    tag = "risks"
)]
async fn latest_score(
    State(state): State<AppState>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<Option<LatestScoreResponse>>, AppError> {
    let scope = query.resolve()?;

    let Some((latest, trend, delta)) = latest_with_trend(&state, &scope) else {
        return Ok(Json(None));
    };

    Ok(Json(Some(LatestScoreResponse {
        snapshot: SnapshotView::from(latest),
        trend,
        delta,
    })))
}

/// GET /api/risks/score-history — Paginated history, newest first.
#[utoipa::path(
    get,
    path = "/api/risks/score-history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Score history page", body = ScoreHistoryResponse),
        (status = 404, description = "Unknown framework", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid request", body = crate::error::ErrorBody),
    ),
    tag = "risks"
)]
async fn score_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ScoreHistoryResponse>, AppError> {
    let scope = resolve_scope(&query.user_id, query.framework_id.as_deref())?;

    let limit = match query.limit {
        None => DEFAULT_HISTORY_LIMIT,
        Some(0) => {
            return Err(AppError::Validation("limit must be at least 1".to_string()));
        }
        Some(n) => n.min(MAX_HISTORY_LIMIT),
    };
    let offset = query.offset.unwrap_or(0);

    let history: Vec<SnapshotView> = state
        .snapshots
        .history(&scope, limit as usize, offset as usize)
        .into_iter()
        .map(SnapshotView::from)
        .collect();

    Ok(Json(ScoreHistoryResponse {
        user_id: scope.user_id.as_str().to_string(),
        framework_id: scope.framework.map(|f| f.as_str().to_string()),
        limit,
        offset,
        count: history.len(),
        history,
    }))
}

/// GET /api/risks/score-trend — Trend classification for a scope.
#[utoipa::path(
    get,
    path = "/api/risks/score-trend",
    params(ScopeQuery),
    responses(
        (status = 200, description = "Trend for the scope", body = TrendResponse),
        (status = 404, description = "Unknown framework", body = crate::error::ErrorBody),
    ),
    tag = "risks"
)]
async fn score_trend(
    State(state): State<AppState>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<TrendResponse>, AppError> {
    let scope = query.resolve()?;
    let (trend, delta) = scope_trend(&state, &scope);
    Ok(Json(TrendResponse { trend, delta }))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── CalculateScoreRequest validation ──────────────────────────

    #[test]
    fn test_calculate_request_valid() {
        let req = CalculateScoreRequest {
            user_id: "u1".to_string(),
            framework_id: Some("soc2".to_string()),
            trigger: None,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_calculate_request_empty_user() {
        let req = CalculateScoreRequest {
            user_id: "".to_string(),
            framework_id: None,
            trigger: None,
        };
        let err = req.validate().unwrap_err();
        assert!(err.contains("userId"), "error should mention userId: {err}");
    }

    #[test]
    fn test_calculate_request_whitespace_user() {
        let req = CalculateScoreRequest {
            user_id: "   ".to_string(),
            framework_id: None,
            trigger: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_calculate_request_oversized_user() {
        let req = CalculateScoreRequest {
            user_id: "x".repeat(256),
            framework_id: None,
            trigger: None,
        };
        assert!(req.validate().is_err());
    }

    // ── DeltaView rendering ───────────────────────────────────────

    #[test]
    fn test_delta_view_change_matches_rounded_endpoints() {
        // Independent rounding would render before 50.0, after 49.9,
        // change -0.2 (from the full-precision -0.18).
        let view = DeltaView::from(ScoreDelta {
            before: 50.04,
            after: 49.86,
            change: 49.86 - 50.04,
            trigger: "manual_refresh".to_string(),
        });
        assert_eq!(view.before, 50.0);
        assert_eq!(view.after, 49.9);
        assert_eq!(view.change, -0.1);
        assert_eq!(round1(view.after - view.before), view.change);
    }

    // ── Router construction ───────────────────────────────────────

    #[test]
    fn test_router_builds_successfully() {
        let _router = router();
    }

    // ── Handler integration tests ─────────────────────────────────

    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_app(state: AppState) -> Router<()> {
        router().with_state(state)
    }

    async fn body_json<T: serde::de::DeserializeOwned>(resp: axum::response::Response) -> T {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn calculate_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/risks/calculate-score")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn handler_calculate_empty_scope_returns_floor_score() {
        let app = test_app(AppState::new());
        let resp = app
            .oneshot(calculate_request(r#"{"userId":"u1","frameworkId":"soc2"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let view: SnapshotView = body_json(resp).await;
        assert_eq!(view.user_id, "u1");
        assert_eq!(view.framework_id.as_deref(), Some("soc2"));
        assert_eq!(view.overall_risk_score, 80.0);
        assert_eq!(view.calculation_factors.timely_completion, 100.0);
        assert_eq!(view.triggered_by, ScoreTrigger::ManualRefresh);
    }

    #[tokio::test]
    async fn handler_calculate_honors_explicit_trigger() {
        let app = test_app(AppState::new());
        let resp = app
            .oneshot(calculate_request(
                r#"{"userId":"u1","trigger":"ai_calculation"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let view: SnapshotView = body_json(resp).await;
        assert_eq!(view.triggered_by, ScoreTrigger::AiCalculation);
    }

    #[tokio::test]
    async fn handler_calculate_unknown_framework_returns_404() {
        let app = test_app(AppState::new());
        let resp = app
            .oneshot(calculate_request(r#"{"userId":"u1","frameworkId":"fedramp"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn handler_calculate_empty_user_returns_422() {
        let app = test_app(AppState::new());
        let resp = app
            .oneshot(calculate_request(r#"{"userId":""}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn handler_calculate_bad_json_returns_422() {
        let app = test_app(AppState::new());
        let resp = app.oneshot(calculate_request("not json")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn handler_latest_score_empty_history_returns_null() {
        let app = test_app(AppState::new());
        let req = Request::builder()
            .method("GET")
            .uri("/api/risks/latest-score?userId=u1")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"null");
    }

    #[tokio::test]
    async fn handler_latest_score_after_calculate() {
        let state = AppState::new();
        let app = test_app(state.clone());

        let resp = app
            .clone()
            .oneshot(calculate_request(r#"{"userId":"u1","frameworkId":"gdpr"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: SnapshotView = body_json(resp).await;

        let req = Request::builder()
            .method("GET")
            .uri("/api/risks/latest-score?userId=u1&frameworkId=gdpr")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let latest: LatestScoreResponse = body_json(resp).await;
        assert_eq!(latest.snapshot.id, created.id);
        // A single snapshot has no comparison point.
        assert_eq!(latest.trend, Trend::Unknown);
        assert!(latest.delta.is_none());
    }

    #[tokio::test]
    async fn handler_latest_score_delta_agrees_with_embedded_snapshot() {
        let state = AppState::new();
        let app = test_app(state.clone());

        // First calculation: empty scope, score 80; then mitigate a risk
        // and recalculate so the scope has a real delta.
        let resp = app
            .clone()
            .oneshot(calculate_request(r#"{"userId":"u1"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let record = crate::state::RiskRecord {
            id: uuid::Uuid::new_v4(),
            user_id: veris_core::UserId::new("u1").unwrap(),
            framework_id: None,
            severity: crate::state::RiskSeverity::High,
            status: crate::state::RiskStatus::Mitigated,
        };
        state.risks.insert(record.id, record);
        let resp = app
            .clone()
            .oneshot(calculate_request(r#"{"userId":"u1"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = Request::builder()
            .method("GET")
            .uri("/api/risks/latest-score?userId=u1")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let latest: LatestScoreResponse = body_json(resp).await;

        // Snapshot and delta come from a single log read, so the delta's
        // endpoint is the embedded snapshot's score.
        assert_eq!(latest.trend, Trend::Improving);
        let delta = latest.delta.unwrap();
        assert_eq!(delta.after, latest.snapshot.overall_risk_score);
        assert_eq!(delta.before, 80.0);
        assert_eq!(delta.change, -40.0);
    }

    #[tokio::test]
    async fn handler_latest_score_is_scope_isolated() {
        let state = AppState::new();
        let app = test_app(state.clone());

        let resp = app
            .clone()
            .oneshot(calculate_request(r#"{"userId":"u1","frameworkId":"soc2"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        // Same user, all-frameworks scope: separate history.
        let req = Request::builder()
            .method("GET")
            .uri("/api/risks/latest-score?userId=u1")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"null");
    }

    #[tokio::test]
    async fn handler_history_paginates_newest_first() {
        let state = AppState::new();
        let app = test_app(state.clone());

        for _ in 0..5 {
            let resp = app
                .clone()
                .oneshot(calculate_request(r#"{"userId":"u1"}"#))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let req = Request::builder()
            .method("GET")
            .uri("/api/risks/score-history?userId=u1&limit=2&offset=1")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let page: ScoreHistoryResponse = body_json(resp).await;
        assert_eq!(page.limit, 2);
        assert_eq!(page.offset, 1);
        assert_eq!(page.count, 2);
        assert_eq!(page.history.len(), 2);
        // Newest first within the page.
        assert!(page.history[0].created_at >= page.history[1].created_at);

        let all = state.snapshots.history(&resolve_scope("u1", None).unwrap(), 10, 0);
        assert_eq!(page.history[0].id, all[1].id);
        assert_eq!(page.history[1].id, all[2].id);
    }

    #[tokio::test]
    async fn handler_history_caps_limit() {
        let app = test_app(AppState::new());
        let req = Request::builder()
            .method("GET")
            .uri("/api/risks/score-history?userId=u1&limit=5000")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let page: ScoreHistoryResponse = body_json(resp).await;
        assert_eq!(page.limit, MAX_HISTORY_LIMIT);
        assert_eq!(page.count, 0);
    }

    #[tokio::test]
    async fn handler_history_zero_limit_returns_422() {
        let app = test_app(AppState::new());
        let req = Request::builder()
            .method("GET")
            .uri("/api/risks/score-history?userId=u1&limit=0")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn handler_trend_unknown_without_history() {
        let app = test_app(AppState::new());
        let req = Request::builder()
            .method("GET")
            .uri("/api/risks/score-trend?userId=u1")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let trend: TrendResponse = body_json(resp).await;
        assert_eq!(trend.trend, Trend::Unknown);
        assert!(trend.delta.is_none());
    }

    #[tokio::test]
    async fn handler_trend_reflects_score_movement() {
        let state = AppState::new();
        let app = test_app(state.clone());

        // First calculation: empty scope, score 80.
        let resp = app
            .clone()
            .oneshot(calculate_request(r#"{"userId":"u1"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        // Mitigate a risk to improve the score, then recalculate.
        let record = crate::state::RiskRecord {
            id: uuid::Uuid::new_v4(),
            user_id: veris_core::UserId::new("u1").unwrap(),
            framework_id: None,
            severity: crate::state::RiskSeverity::High,
            status: crate::state::RiskStatus::Mitigated,
        };
        state.risks.insert(record.id, record);
        let resp = app
            .clone()
            .oneshot(calculate_request(r#"{"userId":"u1"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = Request::builder()
            .method("GET")
            .uri("/api/risks/score-trend?userId=u1")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let trend: TrendResponse = body_json(resp).await;
        assert_eq!(trend.trend, Trend::Improving);
        let delta = trend.delta.unwrap();
        assert_eq!(delta.before, 80.0);
        assert_eq!(delta.after, 40.0);
        assert_eq!(delta.change, -40.0);
        assert_eq!(delta.trigger, "manual_refresh");
    }

    #[tokio::test]
    async fn snapshot_view_rounds_for_display() {
        let state = AppState::new();

        // 1 of 3 tasks complete: completion 33.333…, rendered 33.3.
        for _ in 0..3 {
            let record = crate::state::TaskRecord {
                id: uuid::Uuid::new_v4(),
                user_id: veris_core::UserId::new("u1").unwrap(),
                framework_id: None,
                status: crate::state::TaskStatus::Open,
                due_at: None,
                completed_at: None,
            };
            state.tasks.insert(record.id, record);
        }
        let done = crate::state::TaskRecord {
            id: uuid::Uuid::new_v4(),
            user_id: veris_core::UserId::new("u1").unwrap(),
            framework_id: None,
            status: crate::state::TaskStatus::Completed,
            due_at: None,
            completed_at: Some(Utc::now()),
        };
        state.tasks.insert(done.id, done);

        let app = test_app(state);
        let resp = app
            .oneshot(calculate_request(r#"{"userId":"u1"}"#))
            .await
            .unwrap();
        let view: SnapshotView = body_json(resp).await;
        assert_eq!(view.calculation_factors.task_completion, 25.0);
        // Scores carry at most one decimal place after rounding.
        let scaled = view.overall_risk_score * 10.0;
        assert!((scaled - scaled.round()).abs() < 1e-9);
    }
}
