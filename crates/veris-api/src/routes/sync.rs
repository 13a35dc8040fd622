//! # Mirror Sync API
//!
//! Bulk read-model pushes from the task and risk subsystems. Each call
//! replaces the mirrored records for one scope; records outside the
//! scope are untouched. Only used in local aggregation mode — when an
//! upstream client is configured the mirrors are ignored by scoring.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::put;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use veris_core::{Framework, Scope};

use crate::error::AppError;
use crate::extractors::{check_user_id, extract_validated_json, Validate};
use crate::routes::resolve_scope;
use crate::state::{AppState, RiskRecord, RiskSeverity, RiskStatus, TaskRecord, TaskStatus};

const MAX_SYNC_ITEMS: usize = 10_000;

/// One mirrored task in a sync push.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskSyncItem {
    /// Stable id from the task subsystem; generated when absent.
    #[serde(default)]
    pub id: Option<Uuid>,
    /// Framework override; defaults to the push's frameworkId.
    #[serde(default)]
    pub framework_id: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Replace the task mirror for a scope.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncTasksRequest {
    pub user_id: String,
    #[serde(default)]
    pub framework_id: Option<String>,
    pub tasks: Vec<TaskSyncItem>,
}

impl Validate for SyncTasksRequest {
    fn validate(&self) -> Result<(), String> {
        validate_sync_scope(&self.user_id, self.tasks.len())
    }
}

/// One mirrored risk in a sync push.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskSyncItem {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub framework_id: Option<String>,
    pub severity: RiskSeverity,
    pub status: RiskStatus,
}

/// Replace the risk mirror for a scope.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncRisksRequest {
    pub user_id: String,
    #[serde(default)]
    pub framework_id: Option<String>,
    pub risks: Vec<RiskSyncItem>,
}

impl Validate for SyncRisksRequest {
    fn validate(&self) -> Result<(), String> {
        validate_sync_scope(&self.user_id, self.risks.len())
    }
}

fn validate_sync_scope(user_id: &str, items: usize) -> Result<(), String> {
    check_user_id(user_id)?;
    if items > MAX_SYNC_ITEMS {
        return Err(format!("sync payload must not exceed {MAX_SYNC_ITEMS} items"));
    }
    Ok(())
}

/// Sync acknowledgement.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    /// Records now mirrored for the scope.
    pub count: usize,
}

/// Build the sync router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/sync/tasks", put(sync_tasks))
        .route("/api/sync/risks", put(sync_risks))
}

/// Resolve an item's framework against the push scope.
///
/// Items inherit the push's framework; an explicit item framework must
/// fall inside the push scope.
fn item_framework(
    scope: &Scope,
    raw: Option<&str>,
) -> Result<Option<Framework>, AppError> {
    let framework = match raw {
        None => return Ok(scope.framework),
        Some(raw) => Framework::parse(raw)
            .ok_or_else(|| AppError::ScopeNotFound(format!("unknown framework: {raw}")))?,
    };
    match scope.framework {
        Some(scoped) if scoped != framework => Err(AppError::Validation(format!(
            "item framework {framework} does not match push scope {scoped}",
        ))),
        _ => Ok(Some(framework)),
    }
}

/// PUT /api/sync/tasks — Replace the task mirror for a scope.
#[utoipa::path(
    put,
    path = "/api/sync/tasks",
    request_body = SyncTasksRequest,
    responses(
        (status = 200, description = "Mirror replaced", body = SyncResponse),
        (status = 404, description = "Unknown framework", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid request", body = crate::error::ErrorBody),
    ),
    tag = "sync"
)]
async fn sync_tasks(
    State(state): State<AppState>,
    body: Result<Json<SyncTasksRequest>, JsonRejection>,
) -> Result<Json<SyncResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let scope = resolve_scope(&req.user_id, req.framework_id.as_deref())?;

    // Resolve every item before mutating so a bad item rejects the
    // whole push instead of leaving a half-replaced mirror.
    let mut records = Vec::with_capacity(req.tasks.len());
    for item in &req.tasks {
        let framework_id = item_framework(&scope, item.framework_id.as_deref())?;
        records.push(TaskRecord {
            id: item.id.unwrap_or_else(Uuid::new_v4),
            user_id: scope.user_id.clone(),
            framework_id,
            status: item.status,
            due_at: item.due_at,
            completed_at: item.completed_at,
        });
    }

    state
        .tasks
        .retain(|_, task| !scope.contains(&task.user_id, task.framework_id));
    let count = records.len();
    for record in records {
        state.tasks.insert(record.id, record);
    }

    tracing::info!(scope = %scope, count, "task mirror replaced");
    Ok(Json(SyncResponse { count }))
}

/// PUT /api/sync/risks — Replace the risk mirror for a scope.
#[utoipa::path(
    put,
    path = "/api/sync/risks",
    request_body = SyncRisksRequest,
    responses(
        (status = 200, description = "Mirror replaced", body = SyncResponse),
        (status = 404, description = "Unknown framework", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid request", body = crate::error::ErrorBody),
    ),
    tag = "sync"
)]
async fn sync_risks(
    State(state): State<AppState>,
    body: Result<Json<SyncRisksRequest>, JsonRejection>,
) -> Result<Json<SyncResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let scope = resolve_scope(&req.user_id, req.framework_id.as_deref())?;

    let mut records = Vec::with_capacity(req.risks.len());
    for item in &req.risks {
        let framework_id = item_framework(&scope, item.framework_id.as_deref())?;
        records.push(RiskRecord {
            id: item.id.unwrap_or_else(Uuid::new_v4),
            user_id: scope.user_id.clone(),
            framework_id,
            severity: item.severity,
            status: item.status,
        });
    }

    state
        .risks
        .retain(|_, risk| !scope.contains(&risk.user_id, risk.framework_id));
    let count = records.len();
    for record in records {
        state.risks.insert(record.id, record);
    }

    tracing::info!(scope = %scope, count, "risk mirror replaced");
    Ok(Json(SyncResponse { count }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use veris_core::UserId;

    #[test]
    fn test_sync_request_valid() {
        let req = SyncTasksRequest {
            user_id: "u1".to_string(),
            framework_id: None,
            tasks: vec![],
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_sync_request_empty_user() {
        let req = SyncRisksRequest {
            user_id: "".to_string(),
            framework_id: None,
            risks: vec![],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_item_framework_inherits_scope() {
        let scope = resolve_scope("u1", Some("soc2")).unwrap();
        assert_eq!(item_framework(&scope, None).unwrap(), Some(Framework::Soc2));
    }

    #[test]
    fn test_item_framework_conflict_rejected() {
        let scope = resolve_scope("u1", Some("soc2")).unwrap();
        let err = item_framework(&scope, Some("gdpr")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_item_framework_explicit_in_open_scope() {
        let scope = resolve_scope("u1", None).unwrap();
        assert_eq!(
            item_framework(&scope, Some("hipaa")).unwrap(),
            Some(Framework::Hipaa)
        );
    }

    #[test]
    fn test_router_builds_successfully() {
        let _router = router();
    }

    // ── Handler integration tests ─────────────────────────────────

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_app(state: AppState) -> Router<()> {
        router().with_state(state)
    }

    fn put_request(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("PUT")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(resp: axum::response::Response) -> T {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn handler_sync_tasks_replaces_scope() {
        let state = AppState::new();
        // Pre-existing task in the scope that should be replaced.
        let stale = TaskRecord {
            id: Uuid::new_v4(),
            user_id: UserId::new("u1").unwrap(),
            framework_id: Some(Framework::Soc2),
            status: TaskStatus::Open,
            due_at: None,
            completed_at: None,
        };
        state.tasks.insert(stale.id, stale.clone());
        // Task in another scope that must survive.
        let other = TaskRecord {
            id: Uuid::new_v4(),
            user_id: UserId::new("u2").unwrap(),
            framework_id: Some(Framework::Soc2),
            status: TaskStatus::Open,
            due_at: None,
            completed_at: None,
        };
        state.tasks.insert(other.id, other.clone());

        let app = test_app(state.clone());
        let resp = app
            .oneshot(put_request(
                "/api/sync/tasks",
                r#"{"userId":"u1","frameworkId":"soc2","tasks":[
                    {"status":"completed","completedAt":"2026-08-01T00:00:00Z"},
                    {"status":"open"}
                ]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let ack: SyncResponse = body_json(resp).await;
        assert_eq!(ack.count, 2);

        assert!(state.tasks.get(&stale.id).is_none());
        assert!(state.tasks.get(&other.id).is_some());
        assert_eq!(state.tasks.len(), 3);
    }

    #[tokio::test]
    async fn handler_sync_tasks_empty_list_clears_scope() {
        let state = AppState::new();
        let task = TaskRecord {
            id: Uuid::new_v4(),
            user_id: UserId::new("u1").unwrap(),
            framework_id: None,
            status: TaskStatus::Open,
            due_at: None,
            completed_at: None,
        };
        state.tasks.insert(task.id, task);

        let app = test_app(state.clone());
        let resp = app
            .oneshot(put_request(
                "/api/sync/tasks",
                r#"{"userId":"u1","tasks":[]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(state.tasks.is_empty());
    }

    #[tokio::test]
    async fn handler_sync_risks_round_trip() {
        let state = AppState::new();
        let app = test_app(state.clone());
        let resp = app
            .oneshot(put_request(
                "/api/sync/risks",
                r#"{"userId":"u1","frameworkId":"gdpr","risks":[
                    {"severity":"high","status":"open"},
                    {"severity":"low","status":"mitigated"}
                ]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let ack: SyncResponse = body_json(resp).await;
        assert_eq!(ack.count, 2);
        assert_eq!(state.risks.len(), 2);
        for risk in state.risks.list() {
            assert_eq!(risk.framework_id, Some(Framework::Gdpr));
        }
    }

    #[tokio::test]
    async fn handler_sync_conflicting_item_framework_returns_422() {
        let state = AppState::new();
        let app = test_app(state.clone());
        let resp = app
            .oneshot(put_request(
                "/api/sync/risks",
                r#"{"userId":"u1","frameworkId":"soc2","risks":[
                    {"frameworkId":"gdpr","severity":"high","status":"open"}
                ]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        // Rejected pushes must not mutate the mirror.
        assert!(state.risks.is_empty());
    }

    #[tokio::test]
    async fn handler_sync_unknown_framework_returns_404() {
        let app = test_app(AppState::new());
        let resp = app
            .oneshot(put_request(
                "/api/sync/tasks",
                r#"{"userId":"u1","frameworkId":"nist","tasks":[]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
