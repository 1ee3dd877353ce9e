//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::pipeline::{OrchestratorError, PipelineError};
use crate::application::ports::{JobControlError, RepositoryError};
use crate::domain::job::JobError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 状态无效
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 任务队列不可用
    #[error("Queue unavailable: {0}")]
    QueueUnavailable(String),

    /// 仓储错误
    #[error("Repository error: {0}")]
    RepositoryError(String),

    /// 流水线错误
    #[error("Pipeline error: {0}")]
    PipelineError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            id: id.into(),
        }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建状态无效错误
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => Self::not_found("Job", id),
            RepositoryError::InvalidTransition(msg) => Self::InvalidState(msg),
            other => Self::RepositoryError(other.to_string()),
        }
    }
}

impl From<JobError> for ApplicationError {
    fn from(err: JobError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<JobControlError> for ApplicationError {
    fn from(err: JobControlError) -> Self {
        match err {
            JobControlError::AlreadyClaimed(id) => {
                Self::InvalidState(format!("job is running: {}", id))
            }
            other => Self::QueueUnavailable(other.to_string()),
        }
    }
}

impl From<PipelineError> for ApplicationError {
    fn from(err: PipelineError) -> Self {
        Self::PipelineError(err.to_string())
    }
}

impl From<OrchestratorError> for ApplicationError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::UrlNotFound(url) => Self::not_found("Job url", url),
            OrchestratorError::Repository(e) => e.into(),
        }
    }
}
