//! # cpm-api — HTTP Service for the Construction Project Ledger
//!
//! Serves task approvals, the live completed-work percentage, and the draw
//! register over JSON. The draw gate runs here on the server against the
//! current task set, so a stale or tampered client cannot schedule a draw
//! the milestone does not support.
//!
//! ## API Surface
//!
//! | Prefix             | Module                   |
//! |--------------------|--------------------------|
//! | `/v1/project`      | [`routes::project`]      |
//! | `/v1/tasks/*`      | [`routes::tasks`]        |
//! | `/v1/completion`   | [`routes::completion`]   |
//! | `/v1/draws/*`      | [`routes::draws`]        |
//! | `/health/*`        | probes and counters      |
//! | `/openapi.json`    | [`openapi`]              |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → Handler
//! ```

pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::middleware::from_fn;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use crate::middleware::metrics::MetricsSnapshot;
use crate::state::AppState;

/// Assemble the application router.
///
/// Health probes are mounted outside the metrics layer so polling them does
/// not skew the counters.
pub fn app(state: AppState) -> Router {
    let metrics = state.metrics.clone();

    let api = Router::new()
        .merge(routes::project::router())
        .merge(routes::tasks::router())
        .merge(routes::completion::router())
        .merge(routes::draws::router())
        .merge(openapi::router())
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(metrics));

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/health/metrics", get(metrics_snapshot));

    Router::new().merge(health).merge(api).with_state(state)
}

/// Liveness probe.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. The service holds no external connections, so it is
/// ready as soon as it is live.
async fn readiness() -> &'static str {
    "ready"
}

async fn metrics_snapshot(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
