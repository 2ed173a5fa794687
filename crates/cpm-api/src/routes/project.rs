//! # Project API
//!
//! - `GET /v1/project`: configuration and draw totals.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use cpm_core::{Percentage, ProjectId};
use cpm_state::DrawStatus;

use crate::state::AppState;

/// Project configuration as served to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectView {
    #[schema(value_type = String)]
    pub project_id: ProjectId,
    pub name: String,
    /// Denominator of the completed-work percentage.
    pub total_project_value: String,
    #[schema(value_type = String, example = "70.00")]
    pub milestone_threshold: Percentage,
    pub pending_draws_total: String,
    pub scheduled_draws_total: String,
    pub disbursed_draws_total: String,
    pub next_draw_number: u32,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/project", get(get_project))
}

/// GET /v1/project — Project configuration and draw totals.
#[utoipa::path(
    get,
    path = "/v1/project",
    responses((status = 200, description = "Project configuration", body = ProjectView)),
    tag = "project"
)]
pub(crate) async fn get_project(State(state): State<AppState>) -> Json<ProjectView> {
    let project = state.project();
    let draws = state.draws.lock();
    Json(ProjectView {
        project_id: project.project_id,
        name: project.name.clone(),
        total_project_value: project.total_project_value.to_plain_string(),
        milestone_threshold: project.milestone_threshold,
        pending_draws_total: draws.total_in(DrawStatus::Pending).to_plain_string(),
        scheduled_draws_total: draws.scheduled_total().to_plain_string(),
        disbursed_draws_total: draws.disbursed_total().to_plain_string(),
        next_draw_number: draws.next_number().0,
    })
}
