use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::services::dashboard::DashboardError;
use crate::services::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{message}")]
    Conflict { code: &'static str, message: String },

    #[error("reservation service error: {0}")]
    Upstream(String),
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "unauthorized",
            AppError::NotFound(_) => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::Conflict { code, .. } => *code,
            AppError::Upstream(_) => "upstream",
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unauthorized => AppError::Unauthorized,
            StoreError::NotFound(id) => AppError::NotFound(format!("reservation {id}")),
            StoreError::AlreadyTerminal => AppError::Conflict {
                code: "already_terminal",
                message: e.to_string(),
            },
            StoreError::WindowClosed => AppError::Conflict {
                code: "window_closed",
                message: e.to_string(),
            },
            StoreError::Rejected { .. } | StoreError::Transport(_) => {
                AppError::Upstream(e.to_string())
            }
        }
    }
}

impl From<DashboardError> for AppError {
    fn from(e: DashboardError) -> Self {
        match e {
            DashboardError::NotEligible(_) => AppError::Conflict {
                code: "not_eligible",
                message: e.to_string(),
            },
            DashboardError::Busy(_) => AppError::Conflict {
                code: "busy",
                message: e.to_string(),
            },
            DashboardError::ConfirmationRequired => AppError::BadRequest(e.to_string()),
            DashboardError::NotFound(id) => AppError::NotFound(format!("reservation {id}")),
            DashboardError::Store(inner) => inner.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({ "error": self.to_string(), "code": self.code() });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_errors_map_to_statuses() {
        let cases = [
            (DashboardError::NotEligible("1".into()), StatusCode::CONFLICT),
            (DashboardError::Busy("1".into()), StatusCode::CONFLICT),
            (DashboardError::ConfirmationRequired, StatusCode::BAD_REQUEST),
            (DashboardError::NotFound("1".into()), StatusCode::NOT_FOUND),
            (
                DashboardError::Store(StoreError::Unauthorized),
                StatusCode::UNAUTHORIZED,
            ),
            (
                DashboardError::Store(StoreError::WindowClosed),
                StatusCode::CONFLICT,
            ),
            (
                DashboardError::Store(StoreError::Rejected {
                    status: 500,
                    message: "boom".into(),
                }),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, expected) in cases {
            let res = AppError::from(err).into_response();
            assert_eq!(res.status(), expected);
        }
    }

    #[test]
    fn test_conflict_code() {
        let err = AppError::from(StoreError::AlreadyTerminal);
        assert_eq!(err.code(), "already_terminal");
    }
}
