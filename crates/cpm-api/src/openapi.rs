//! # OpenAPI Specification
//!
//! Assembles the utoipa-documented routes into one OpenAPI document served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "CPM API - Construction Project Draw Ledger",
        version = "0.1.0",
        description = "Task approvals, completed-work percentage, and milestone-gated fund draws for a construction project.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        // Project
        crate::routes::project::get_project,
        // Tasks
        crate::routes::tasks::create_task,
        crate::routes::tasks::list_tasks,
        crate::routes::tasks::get_task,
        crate::routes::tasks::transition_task,
        // Completion
        crate::routes::completion::get_completion,
        // Draws
        crate::routes::draws::create_draw,
        crate::routes::draws::list_draws,
        crate::routes::draws::get_draw,
        crate::routes::draws::schedule_draw,
        crate::routes::draws::disburse_draw,
        crate::routes::draws::update_draw_status,
        crate::routes::draws::delete_draw,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::middleware::metrics::MetricsSnapshot,
        crate::routes::project::ProjectView,
        crate::routes::tasks::CreateTaskRequest,
        crate::routes::tasks::TransitionTaskRequest,
        crate::routes::tasks::TaskView,
        crate::routes::completion::CompletionView,
        crate::routes::draws::CreateDrawRequest,
        crate::routes::draws::UpdateDrawStatusRequest,
        crate::routes::draws::DrawView,
        crate::routes::draws::NoticeView,
        crate::routes::draws::ScheduledDrawResponse,
        crate::routes::draws::DrawStatusResponse,
    )),
    tags(
        (name = "project", description = "Project configuration"),
        (name = "tasks", description = "Task approval lifecycle"),
        (name = "completion", description = "Completed-work percentage"),
        (name = "draws", description = "Milestone-gated fund draws"),
    )
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for expected in [
            "/v1/project",
            "/v1/tasks",
            "/v1/tasks/{id}",
            "/v1/tasks/{id}/transition",
            "/v1/completion",
            "/v1/draws",
            "/v1/draws/{id}",
            "/v1/draws/{id}/schedule",
            "/v1/draws/{id}/disburse",
            "/v1/draws/{id}/status",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }
    }
}
