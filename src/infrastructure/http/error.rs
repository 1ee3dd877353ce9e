//! HTTP Error Handling
//!
//! 业务错误一律返回 HTTP 200，错误码放在 `errno` 中

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::ApplicationError;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errno: i32,
    pub error: String,
    pub data: Option<()>,
}

impl ErrorResponse {
    pub fn new(errno: i32, error: impl Into<String>) -> Self {
        Self {
            errno,
            error: error.into(),
            data: None,
        }
    }
}

/// 错误码定义
pub mod errno {
    pub const BAD_REQUEST: i32 = 400;
    pub const NOT_FOUND: i32 = 404;
    pub const CONFLICT: i32 = 409;
    pub const INTERNAL_ERROR: i32 = 500;
    pub const SERVICE_UNAVAILABLE: i32 = 503;
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Internal(String),
    ServiceUnavailable(String),
}

impl ApiError {
    fn errno(&self) -> i32 {
        match self {
            ApiError::NotFound(_) => errno::NOT_FOUND,
            ApiError::BadRequest(_) => errno::BAD_REQUEST,
            ApiError::Conflict(_) => errno::CONFLICT,
            ApiError::Internal(_) => errno::INTERNAL_ERROR,
            ApiError::ServiceUnavailable(_) => errno::SERVICE_UNAVAILABLE,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::Internal(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let errno = self.errno();
        let msg = self.message();

        match &self {
            ApiError::Internal(_) | ApiError::ServiceUnavailable(_) => {
                tracing::error!(errno, error = %msg, "Request failed");
            }
            _ => tracing::warn!(errno, error = %msg, "Request rejected"),
        }

        (StatusCode::OK, Json(ErrorResponse::new(errno, msg))).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        match e {
            ApplicationError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            ApplicationError::ValidationError(msg) => ApiError::BadRequest(msg),
            ApplicationError::InvalidState(msg) => ApiError::Conflict(msg),
            ApplicationError::QueueUnavailable(msg) => ApiError::ServiceUnavailable(msg),
            ApplicationError::RepositoryError(msg)
            | ApplicationError::PipelineError(msg)
            | ApplicationError::InternalError(msg) => ApiError::Internal(msg),
        }
    }
}
