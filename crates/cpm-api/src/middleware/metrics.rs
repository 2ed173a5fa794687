//! # Request Metrics
//!
//! In-process atomic counters. Rejected state changes (409) are counted
//! separately from other client errors since a burst of them usually means
//! a client is retrying a draw the gate keeps refusing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use serde::Serialize;

/// Shared metrics state.
#[derive(Debug, Clone, Default)]
pub struct ApiMetrics {
    request_count: Arc<AtomicU64>,
    error_count: Arc<AtomicU64>,
    conflict_count: Arc<AtomicU64>,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub errors: u64,
    pub conflicts: u64,
}

impl ApiMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// 4xx and 5xx responses, conflicts included.
    pub fn errors(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    pub fn conflicts(&self) -> u64 {
        self.conflict_count.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests(),
            errors: self.errors(),
            conflicts: self.conflicts(),
        }
    }

    fn record(&self, status: StatusCode) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        if status.is_client_error() || status.is_server_error() {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
        if status == StatusCode::CONFLICT {
            self.conflict_count.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Middleware that updates the [`ApiMetrics`] found in request extensions.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        m.record(response.status());
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_status_class() {
        let m = ApiMetrics::new();
        m.record(StatusCode::OK);
        m.record(StatusCode::CREATED);
        m.record(StatusCode::CONFLICT);
        m.record(StatusCode::NOT_FOUND);
        m.record(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            m.snapshot(),
            MetricsSnapshot {
                requests: 5,
                errors: 3,
                conflicts: 1,
            }
        );
    }

    #[test]
    fn clones_share_counters() {
        let m = ApiMetrics::new();
        let other = m.clone();
        other.record(StatusCode::OK);
        assert_eq!(m.requests(), 1);
    }
}
