//! # Draws API
//!
//! The draw register. Scheduling recomputes completed work from the live
//! task set on the server; whatever a client displayed is never trusted.
//!
//! ## Endpoints
//!
//! - `POST /v1/draws` — open a pending draw
//! - `GET /v1/draws` — list draws by number
//! - `GET /v1/draws/{id}` — get a draw
//! - `POST /v1/draws/{id}/schedule` — run the gate, return the request notice
//! - `POST /v1/draws/{id}/disburse` — confirm payout
//! - `PUT /v1/draws/{id}/status` — set the status directly (same rules)
//! - `DELETE /v1/draws/{id}` — remove a draw that has not been disbursed

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use cpm_core::{DrawId, Money, Timestamp};
use cpm_ledger::DrawRequestNotice;
use cpm_state::{Draw, DrawStatus, DrawTransitionRecord};

use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, parse_amount, parse_id, Validate};
use crate::state::AppState;

// ── Request/Response DTOs ───────────────────────────────────────────

/// Request to open a draw.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDrawRequest {
    /// Amount requested, e.g. `"25,000.00"`.
    pub amount: String,
}

impl Validate for CreateDrawRequest {
    fn validate(&self) -> Result<(), String> {
        if !parse_amount("amount", &self.amount)?.is_positive() {
            return Err("amount must be positive".to_string());
        }
        Ok(())
    }
}

/// Request to set a draw's status directly.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDrawStatusRequest {
    #[schema(value_type = String, example = "scheduled")]
    pub status: DrawStatus,
}

/// A draw as served to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct DrawView {
    #[schema(value_type = String)]
    pub id: DrawId,
    pub draw_number: u32,
    pub amount: String,
    #[schema(value_type = String)]
    pub status: DrawStatus,
    #[schema(value_type = String)]
    pub created_at: Timestamp,
    #[schema(value_type = Option<String>)]
    pub scheduled_at: Option<Timestamp>,
    #[schema(value_type = Option<String>)]
    pub disbursed_at: Option<Timestamp>,
    #[schema(value_type = Vec<Object>)]
    pub transitions: Vec<DrawTransitionRecord>,
}

impl From<&Draw> for DrawView {
    fn from(d: &Draw) -> Self {
        Self {
            id: d.id,
            draw_number: d.draw_number.0,
            amount: d.amount.to_plain_string(),
            status: d.status,
            created_at: d.created_at,
            scheduled_at: d.scheduled_at,
            disbursed_at: d.disbursed_at,
            transitions: d.transitions.clone(),
        }
    }
}

/// Draw request notice for the lender.
#[derive(Debug, Serialize, ToSchema)]
pub struct NoticeView {
    pub subject: String,
    pub body: String,
    /// Subject and body as one message.
    pub text: String,
}

impl From<DrawRequestNotice> for NoticeView {
    fn from(n: DrawRequestNotice) -> Self {
        let text = n.to_text();
        Self {
            subject: n.subject,
            body: n.body,
            text,
        }
    }
}

/// Result of a successful scheduling request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScheduledDrawResponse {
    pub draw: DrawView,
    pub notice: NoticeView,
}

/// Result of a direct status update.
#[derive(Debug, Serialize, ToSchema)]
pub struct DrawStatusResponse {
    pub draw: DrawView,
    /// Present when the update scheduled the draw.
    pub notice: Option<NoticeView>,
}

// ── Router ──────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/draws", get(list_draws).post(create_draw))
        .route("/v1/draws/{id}", get(get_draw).delete(delete_draw))
        .route("/v1/draws/{id}/schedule", post(schedule_draw))
        .route("/v1/draws/{id}/disburse", post(disburse_draw))
        .route("/v1/draws/{id}/status", put(update_draw_status))
}

fn current_view(state: &AppState, id: DrawId) -> Result<DrawView, AppError> {
    state
        .draws
        .lock()
        .get(id)
        .map(DrawView::from)
        .ok_or_else(|| AppError::NotFound(format!("draw {id} not found")))
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/draws — Open a pending draw.
#[utoipa::path(
    post,
    path = "/v1/draws",
    request_body = CreateDrawRequest,
    responses(
        (status = 201, description = "Draw created", body = DrawView),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "draws"
)]
pub(crate) async fn create_draw(
    State(state): State<AppState>,
    body: Result<Json<CreateDrawRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DrawView>), AppError> {
    let req = extract_validated_json(body)?;
    let amount = Money::parse(&req.amount)?;
    let view = DrawView::from(state.draws.lock().create(amount)?);
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /v1/draws — List draws ordered by draw number.
#[utoipa::path(
    get,
    path = "/v1/draws",
    responses((status = 200, description = "Draws", body = Vec<DrawView>)),
    tag = "draws"
)]
pub(crate) async fn list_draws(State(state): State<AppState>) -> Json<Vec<DrawView>> {
    Json(state.draws.lock().list().iter().map(DrawView::from).collect())
}

/// GET /v1/draws/{id} — Get a draw.
#[utoipa::path(
    get,
    path = "/v1/draws/{id}",
    params(("id" = String, Path, description = "Draw ID")),
    responses(
        (status = 200, description = "Draw found", body = DrawView),
        (status = 404, description = "Draw not found", body = crate::error::ErrorBody),
    ),
    tag = "draws"
)]
pub(crate) async fn get_draw(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<DrawView>, AppError> {
    let id: DrawId = parse_id(&raw)?;
    current_view(&state, id).map(Json)
}

/// POST /v1/draws/{id}/schedule — Schedule a draw if the milestone is met.
#[utoipa::path(
    post,
    path = "/v1/draws/{id}/schedule",
    params(("id" = String, Path, description = "Draw ID")),
    responses(
        (status = 200, description = "Draw scheduled", body = ScheduledDrawResponse),
        (status = 404, description = "Draw not found", body = crate::error::ErrorBody),
        (status = 409, description = "Milestone not reached or draw not pending", body = crate::error::ErrorBody),
    ),
    tag = "draws"
)]
pub(crate) async fn schedule_draw(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<ScheduledDrawResponse>, AppError> {
    let id: DrawId = parse_id(&raw)?;
    let tasks = state.tasks.list();
    let (draw, notice) = {
        let mut register = state.draws.lock();
        let notice = register.schedule(id, &tasks, state.project())?;
        let draw = register
            .get(id)
            .map(DrawView::from)
            .ok_or_else(|| AppError::Internal(format!("draw {id} vanished while scheduling")))?;
        (draw, notice)
    };
    tracing::info!(
        draw_id = %id,
        draw_number = draw.draw_number,
        subject = %notice.subject,
        "draw request notice composed"
    );
    Ok(Json(ScheduledDrawResponse {
        draw,
        notice: notice.into(),
    }))
}

/// POST /v1/draws/{id}/disburse — Confirm a scheduled draw was paid.
#[utoipa::path(
    post,
    path = "/v1/draws/{id}/disburse",
    params(("id" = String, Path, description = "Draw ID")),
    responses(
        (status = 200, description = "Draw disbursed", body = DrawView),
        (status = 404, description = "Draw not found", body = crate::error::ErrorBody),
        (status = 409, description = "Draw not scheduled", body = crate::error::ErrorBody),
    ),
    tag = "draws"
)]
pub(crate) async fn disburse_draw(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<DrawView>, AppError> {
    let id: DrawId = parse_id(&raw)?;
    let view = DrawView::from(state.draws.lock().disburse(id)?);
    Ok(Json(view))
}

/// PUT /v1/draws/{id}/status — Set the status directly.
#[utoipa::path(
    put,
    path = "/v1/draws/{id}/status",
    params(("id" = String, Path, description = "Draw ID")),
    request_body = UpdateDrawStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = DrawStatusResponse),
        (status = 404, description = "Draw not found", body = crate::error::ErrorBody),
        (status = 409, description = "Not the next state, or milestone not reached", body = crate::error::ErrorBody),
    ),
    tag = "draws"
)]
pub(crate) async fn update_draw_status(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    body: Result<Json<UpdateDrawStatusRequest>, JsonRejection>,
) -> Result<Json<DrawStatusResponse>, AppError> {
    let id: DrawId = parse_id(&raw)?;
    let req = extract_json(body)?;
    let tasks = state.tasks.list();
    let (draw, notice) = {
        let mut register = state.draws.lock();
        let notice = register.request_status(id, req.status, &tasks, state.project())?;
        let draw = register
            .get(id)
            .map(DrawView::from)
            .ok_or_else(|| AppError::Internal(format!("draw {id} vanished during update")))?;
        (draw, notice)
    };
    Ok(Json(DrawStatusResponse {
        draw,
        notice: notice.map(NoticeView::from),
    }))
}

/// DELETE /v1/draws/{id} — Remove a draw that has not been disbursed.
#[utoipa::path(
    delete,
    path = "/v1/draws/{id}",
    params(("id" = String, Path, description = "Draw ID")),
    responses(
        (status = 204, description = "Draw deleted"),
        (status = 404, description = "Draw not found", body = crate::error::ErrorBody),
        (status = 409, description = "Draw already disbursed", body = crate::error::ErrorBody),
    ),
    tag = "draws"
)]
pub(crate) async fn delete_draw(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: DrawId = parse_id(&raw)?;
    state.draws.lock().delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}
