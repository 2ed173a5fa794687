//! # Tasks API
//!
//! Task creation and the approval lifecycle. Every mutation republishes the
//! completion summary.
//!
//! ## Endpoints
//!
//! - `POST /v1/tasks` — create a task or subtask
//! - `GET /v1/tasks` — list tasks, optionally filtered by status or parent
//! - `GET /v1/tasks/{id}` — get a task
//! - `POST /v1/tasks/{id}/transition` — start, submit, approve, reject, rework

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use cpm_core::{Money, TaskId, Timestamp};
use cpm_ledger::{apply_task_action, rollup_status, subtasks_of, validate_new_task, LedgerError};
use cpm_state::{Task, TaskAction, TaskStatus, TaskTransitionEvidence, TaskTransitionRecord};

use crate::error::AppError;
use crate::extractors::{extract_validated_json, parse_amount, parse_id, Validate};
use crate::state::AppState;

// ── Request/Response DTOs ───────────────────────────────────────────

/// Request to create a task.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    pub title: String,
    /// Budgeted value, e.g. `"12,500.00"`.
    pub budget: String,
    /// Parent task, making this a subtask.
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl Validate for CreateTaskRequest {
    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        if parse_amount("budget", &self.budget)?.is_negative() {
            return Err("budget must not be negative".to_string());
        }
        Ok(())
    }
}

/// Request to move a task through its lifecycle.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TransitionTaskRequest {
    #[schema(value_type = String, example = "approve")]
    pub action: TaskAction,
    /// Approved value; only meaningful with `approve`. Defaults to the budget.
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub actor: Option<String>,
}

impl Validate for TransitionTaskRequest {
    fn validate(&self) -> Result<(), String> {
        let Some(raw) = self.value.as_deref() else {
            return Ok(());
        };
        if self.action != TaskAction::Approve {
            return Err("value is only accepted with the approve action".to_string());
        }
        if parse_amount("value", raw)?.is_negative() {
            return Err("value must not be negative".to_string());
        }
        Ok(())
    }
}

/// Query filters for `GET /v1/tasks`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListTasksQuery {
    /// Only tasks whose own status matches.
    #[param(value_type = Option<String>)]
    pub status: Option<TaskStatus>,
    /// Only direct subtasks of this task.
    pub parent_id: Option<String>,
}

/// A task with its derived values.
#[derive(Debug, Serialize, ToSchema)]
pub struct TaskView {
    #[schema(value_type = String)]
    pub id: TaskId,
    #[schema(value_type = Option<String>)]
    pub parent_id: Option<TaskId>,
    pub title: String,
    pub budget: String,
    pub approved_value: Option<String>,
    /// Amount counted toward completed work right now.
    pub credited_value: String,
    #[schema(value_type = String)]
    pub status: TaskStatus,
    /// Status rolled up from subtasks.
    #[schema(value_type = String)]
    pub effective_status: TaskStatus,
    pub subtask_count: usize,
    #[schema(value_type = String)]
    pub created_at: Timestamp,
    #[schema(value_type = Vec<Object>)]
    pub transitions: Vec<TaskTransitionRecord>,
}

impl TaskView {
    fn build(task: &Task, tasks: &[Task]) -> Self {
        Self {
            id: task.id,
            parent_id: task.parent_id,
            title: task.title.clone(),
            budget: task.budget.to_plain_string(),
            approved_value: task.approved_value.map(Money::to_plain_string),
            credited_value: task.credited_value().to_plain_string(),
            status: task.status,
            effective_status: rollup_status(task, tasks),
            subtask_count: subtasks_of(task.id, tasks).count(),
            created_at: task.created_at,
            transitions: task.transitions.clone(),
        }
    }
}

// ── Router ──────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/tasks", get(list_tasks).post(create_task))
        .route("/v1/tasks/{id}", get(get_task))
        .route("/v1/tasks/{id}/transition", post(transition_task))
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/tasks — Create a task.
#[utoipa::path(
    post,
    path = "/v1/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = TaskView),
        (status = 400, description = "Malformed body", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "tasks"
)]
pub(crate) async fn create_task(
    State(state): State<AppState>,
    body: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskView>), AppError> {
    let req = extract_validated_json(body)?;
    let budget = Money::parse(&req.budget)?;
    let mut task =
        Task::new(state.project().project_id, req.title, budget).map_err(LedgerError::from)?;
    if let Some(raw) = req.parent_id.as_deref() {
        let parent: TaskId = raw
            .parse()
            .map_err(|e| AppError::Validation(format!("parent_id: {e}")))?;
        task = task.with_parent(parent);
    }

    let view = state.update_tasks(|tasks| {
        validate_new_task(&task, tasks).map_err(|e| match e {
            LedgerError::TaskNotFound(parent) => {
                AppError::Validation(format!("parent task {parent} not found"))
            }
            other => other.into(),
        })?;
        tasks.push(task);
        let idx = tasks.len() - 1;
        Ok::<_, AppError>(TaskView::build(&tasks[idx], tasks.as_slice()))
    })?;

    tracing::info!(task_id = %view.id, budget = %view.budget, "task created");
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /v1/tasks — List tasks in creation order.
#[utoipa::path(
    get,
    path = "/v1/tasks",
    params(ListTasksQuery),
    responses(
        (status = 200, description = "Tasks", body = Vec<TaskView>),
        (status = 400, description = "Bad filter", body = crate::error::ErrorBody),
    ),
    tag = "tasks"
)]
pub(crate) async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<Vec<TaskView>>, AppError> {
    let parent: Option<TaskId> = query.parent_id.as_deref().map(parse_id).transpose()?;
    let views = state.tasks.read(|tasks| {
        tasks
            .iter()
            .filter(|t| query.status.map_or(true, |s| t.status == s))
            .filter(|t| parent.map_or(true, |p| t.parent_id == Some(p)))
            .map(|t| TaskView::build(t, tasks))
            .collect()
    });
    Ok(Json(views))
}

/// GET /v1/tasks/{id} — Get a task.
#[utoipa::path(
    get,
    path = "/v1/tasks/{id}",
    params(("id" = String, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task found", body = TaskView),
        (status = 404, description = "Task not found", body = crate::error::ErrorBody),
    ),
    tag = "tasks"
)]
pub(crate) async fn get_task(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<TaskView>, AppError> {
    let id: TaskId = parse_id(&raw)?;
    state
        .tasks
        .read(|tasks| {
            tasks
                .iter()
                .find(|t| t.id == id)
                .map(|t| TaskView::build(t, tasks))
        })
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("task {id} not found")))
}

/// POST /v1/tasks/{id}/transition — Apply a lifecycle action.
#[utoipa::path(
    post,
    path = "/v1/tasks/{id}/transition",
    params(("id" = String, Path, description = "Task ID")),
    request_body = TransitionTaskRequest,
    responses(
        (status = 200, description = "Task transitioned", body = TaskView),
        (status = 404, description = "Task not found", body = crate::error::ErrorBody),
        (status = 409, description = "Transition not allowed from the current state", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "tasks"
)]
pub(crate) async fn transition_task(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    body: Result<Json<TransitionTaskRequest>, JsonRejection>,
) -> Result<Json<TaskView>, AppError> {
    let id: TaskId = parse_id(&raw)?;
    let req = extract_validated_json(body)?;
    let value = req.value.as_deref().map(Money::parse).transpose()?;
    let mut evidence = TaskTransitionEvidence::new(req.reason.unwrap_or_default());
    if let Some(actor) = req.actor {
        evidence = evidence.by(actor);
    }

    let view = state.update_tasks(|tasks| {
        let task = apply_task_action(tasks, id, req.action, evidence, value)?.clone();
        Ok::<_, LedgerError>(TaskView::build(&task, tasks.as_slice()))
    })?;

    tracing::info!(
        task_id = %id,
        action = ?req.action,
        status = %view.status,
        "task transitioned"
    );
    Ok(Json(view))
}
