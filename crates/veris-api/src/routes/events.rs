//! # Task Event Webhook
//!
//! Receives task-completion notifications from the task subsystem and
//! triggers an asynchronous score recalculation for the affected scope.
//! The webhook acknowledges immediately; recompute failures are logged,
//! never returned to the notifying system.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use veris_core::ScoreTrigger;

use crate::aggregator::calculate_and_record;
use crate::error::AppError;
use crate::extractors::{check_user_id, extract_validated_json, Validate};
use crate::routes::resolve_scope;
use crate::state::{AppState, TaskStatus};

/// Task-completed notification payload.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskCompletedEvent {
    pub user_id: String,
    #[serde(default)]
    pub framework_id: Option<String>,
    /// Mirrored task to mark complete, when the notifier knows it.
    #[serde(default)]
    pub task_id: Option<Uuid>,
}

impl Validate for TaskCompletedEvent {
    fn validate(&self) -> Result<(), String> {
        check_user_id(&self.user_id)
    }
}

/// Webhook acknowledgement.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventAccepted {
    pub accepted: bool,
}

/// Build the events router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/events/task-completed", post(task_completed))
}

/// POST /api/events/task-completed — Acknowledge and recompute async.
#[utoipa::path(
    post,
    path = "/api/events/task-completed",
    request_body = TaskCompletedEvent,
    responses(
        (status = 202, description = "Recalculation scheduled", body = EventAccepted),
        (status = 404, description = "Unknown framework", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid request", body = crate::error::ErrorBody),
    ),
    tag = "events"
)]
async fn task_completed(
    State(state): State<AppState>,
    body: Result<Json<TaskCompletedEvent>, JsonRejection>,
) -> Result<(StatusCode, Json<EventAccepted>), AppError> {
    let event = extract_validated_json(body)?;
    let scope = resolve_scope(&event.user_id, event.framework_id.as_deref())?;

    // Keep the mirror current so the recompute sees the completion even
    // if the next sync push has not arrived yet.
    if let Some(task_id) = event.task_id {
        let updated = state.tasks.update(&task_id, |task| {
            task.status = TaskStatus::Completed;
            if task.completed_at.is_none() {
                task.completed_at = Some(Utc::now());
            }
        });
        if updated.is_none() {
            tracing::debug!(%task_id, "task-completed event for task not in mirror");
        }
    }

    tokio::spawn(async move {
        if let Err(err) =
            calculate_and_record(&state, &scope, ScoreTrigger::TaskCompletion).await
        {
            tracing::error!(scope = %scope, error = %err, "event-triggered recalculation failed");
        }
    });

    Ok((StatusCode::ACCEPTED, Json(EventAccepted { accepted: true })))
}
