//! HTTP错误映射

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use triage_core::TriageError;

/// 接口错误，包装核心错误并映射为HTTP状态码
#[derive(Debug)]
pub struct ApiError(pub TriageError);

impl From<TriageError> for ApiError {
    fn from(err: TriageError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            TriageError::NotFound { .. } => StatusCode::NOT_FOUND,
            TriageError::Validation(_) => StatusCode::BAD_REQUEST,
            TriageError::InvalidState(_)
            | TriageError::InvalidTransition { .. }
            | TriageError::DoctorUnavailable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            TriageError::ConcurrencyConflict(_) => StatusCode::CONFLICT,
            TriageError::Config(_)
            | TriageError::Database(_)
            | TriageError::Serialization(_)
            | TriageError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::debug!("Request rejected: {}", self.0);
        }

        let body = Json(json!({
            "error": true,
            "message": self.0.to_string(),
            "status": status.as_u16(),
            "retryable": self.0.is_retryable(),
        }));

        (status, body).into_response()
    }
}

/// 处理器统一结果类型
pub type ApiResult<T> = std::result::Result<T, ApiError>;
