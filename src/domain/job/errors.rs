//! Job Context - Errors

use thiserror::Error;

use super::JobStatus;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobError {
    #[error("无效的任务 ID: {0}")]
    InvalidId(String),

    #[error("未知的任务状态码: {0}")]
    UnknownStatus(i64),

    #[error("非法的状态转换: {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },
}
