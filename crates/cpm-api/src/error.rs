//! # API Error Types
//!
//! Ledger and lifecycle errors become HTTP responses here. Rejected state
//! changes are 409, bad values 422, unparseable input 400, unknown ids 404.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use cpm_core::Percentage;
use cpm_ledger::LedgerError;
use cpm_state::DrawError;

/// Error envelope returned for every non-2xx response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Stable code such as `NOT_FOUND` or `DRAW_NOT_ELIGIBLE`.
    pub code: String,
    pub message: String,
    /// Gate figures for `DRAW_NOT_ELIGIBLE`; absent otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Handler error, rendered as an [`ErrorBody`].
#[derive(Error, Debug)]
pub enum AppError {
    /// 404.
    #[error("not found: {0}")]
    NotFound(String),

    /// 422: well-formed JSON with unacceptable values.
    #[error("validation error: {0}")]
    Validation(String),

    /// 400: unparseable body or path.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// 409: the lifecycle forbids the change.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The draw gate is closed (409). Carries the numbers behind the verdict.
    #[error("{message}")]
    NotEligible {
        message: String,
        cwp: Percentage,
        threshold: Percentage,
    },

    /// 500. The detail is logged, clients see a fixed message.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::NotEligible { .. } => (StatusCode::CONFLICT, "DRAW_NOT_ELIGIBLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::NotEligible { cwp, threshold, .. } => Some(serde_json::json!({
                "cwp": cwp,
                "threshold": threshold,
            })),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = if let Self::Internal(detail) = &self {
            tracing::error!(%detail, "request failed with an internal error");
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };
        let details = self.details();
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<cpm_core::ValidationError> for AppError {
    fn from(err: cpm_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::TaskNotFound(_) | LedgerError::DrawNotFound(_) => Self::NotFound(message),
            LedgerError::Draw(DrawError::NotEligible { cwp, threshold, .. }) => Self::NotEligible {
                message,
                cwp,
                threshold,
            },
            LedgerError::InvalidConfig { .. }
            | LedgerError::ConfigIo { .. }
            | LedgerError::ConfigParse { .. } => Self::Internal(message),
            other if other.is_conflict() => Self::Conflict(message),
            _ => Self::Validation(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpm_core::{DrawNumber, Money, TaskId};
    use cpm_state::{DrawStatus, TaskError, TaskStatus};
    use http_body_util::BodyExt;

    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[test]
    fn status_codes() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (
                AppError::Validation("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
            ),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT, "CONFLICT"),
            (
                AppError::Internal("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status_and_code(), (status, code));
        }
    }

    #[test]
    fn task_transition_errors_are_conflicts() {
        let err = AppError::from(LedgerError::Task(TaskError::InvalidTransition {
            from: TaskStatus::NotStarted,
            to: TaskStatus::Approved,
        }));
        assert_eq!(err.status_and_code().0, StatusCode::CONFLICT);

        let err = AppError::from(LedgerError::OpenSubtasks {
            parent: TaskId::new(),
            open: 2,
        });
        assert_eq!(err.status_and_code().0, StatusCode::CONFLICT);
    }

    #[test]
    fn disbursed_draw_errors_are_conflicts() {
        let err = AppError::from(LedgerError::Draw(DrawError::InvalidTransition {
            number: DrawNumber(1),
            from: DrawStatus::Disbursed,
            to: DrawStatus::Pending,
        }));
        assert_eq!(err.status_and_code().0, StatusCode::CONFLICT);
        let err = AppError::from(LedgerError::DrawNotDeletable(DrawNumber(1)));
        assert_eq!(err.status_and_code().0, StatusCode::CONFLICT);
    }

    #[test]
    fn bad_input_is_validation() {
        let err = AppError::from(LedgerError::Draw(DrawError::NonPositiveAmount(Money::ZERO)));
        assert_eq!(err.status_and_code().0, StatusCode::UNPROCESSABLE_ENTITY);
        let err = AppError::from(LedgerError::Task(TaskError::EmptyTitle));
        assert_eq!(err.status_and_code().0, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn missing_records_are_not_found() {
        let err = AppError::from(LedgerError::TaskNotFound(TaskId::new()));
        assert_eq!(err.status_and_code().0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn not_eligible_carries_details() {
        let err = AppError::from(LedgerError::Draw(DrawError::NotEligible {
            number: DrawNumber(2),
            cwp: Percentage::from_basis_points(4_000),
            threshold: Percentage::from_basis_points(7_000),
        }));
        let (status, body) = response_parts(err).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.error.code, "DRAW_NOT_ELIGIBLE");
        let details = body.error.details.unwrap();
        assert_eq!(details["cwp"], "40.00");
        assert_eq!(details["threshold"], "70.00");
    }

    #[tokio::test]
    async fn internal_hides_details() {
        let (status, body) = response_parts(AppError::Internal("disk on fire".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.message, "An internal error occurred");
        assert!(body.error.details.is_none());
    }

    #[tokio::test]
    async fn client_errors_keep_message() {
        let (status, body) = response_parts(AppError::NotFound("draw 9".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.error.message.contains("draw 9"));
    }
}
