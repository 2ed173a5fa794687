//! # Completion API
//!
//! - `GET /v1/completion`: CWP recomputed from the live task set.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use cpm_core::Percentage;
use cpm_ledger::CompletionSummary;

use crate::state::AppState;

/// Completed-work percentage and the draw gate verdict.
#[derive(Debug, Serialize, ToSchema)]
pub struct CompletionView {
    pub approved_value: String,
    pub total_project_value: String,
    #[schema(value_type = String, example = "70.00")]
    pub cwp: Percentage,
    #[schema(value_type = String, example = "70.00")]
    pub threshold: Percentage,
    pub can_schedule_draw: bool,
    /// Approved value exceeds the total project value.
    pub over_full: bool,
    pub approved_task_count: usize,
    pub task_count: usize,
}

impl From<CompletionSummary> for CompletionView {
    fn from(s: CompletionSummary) -> Self {
        Self {
            approved_value: s.approved_value.to_plain_string(),
            total_project_value: s.total_project_value.to_plain_string(),
            cwp: s.cwp,
            threshold: s.threshold,
            can_schedule_draw: s.can_schedule_draw,
            over_full: s.cwp.exceeds_full(),
            approved_task_count: s.approved_task_count,
            task_count: s.task_count,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/completion", get(get_completion))
}

/// GET /v1/completion — Current completed-work percentage.
#[utoipa::path(
    get,
    path = "/v1/completion",
    responses((status = 200, description = "Completion summary", body = CompletionView)),
    tag = "completion"
)]
pub(crate) async fn get_completion(State(state): State<AppState>) -> Json<CompletionView> {
    Json(state.completion_now().into())
}
