//! Job Control Ports - 任务调度与占用
//!
//! - JobQueuePort: 向后台 worker 提交流水线命令
//! - JobClaimPort: 记录正在运行的条目，防止同一条目被并发处理

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::domain::job::JobId;

/// 调度错误
#[derive(Debug, Error)]
pub enum JobControlError {
    #[error("Job already running: {0}")]
    AlreadyClaimed(String),

    #[error("Job queue is full")]
    QueueFull,

    #[error("Job queue is closed")]
    QueueClosed,
}

/// 后台流水线命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobCommand {
    /// 处理全部未处理条目
    ProcessUnmade,
    /// 重试全部失败条目
    RetryFailed,
    /// 按来源 URL 处理单个条目
    GenerateSingle { url: String },
}

impl JobCommand {
    pub fn name(&self) -> &'static str {
        match self {
            JobCommand::ProcessUnmade => "process_unmade",
            JobCommand::RetryFailed => "retry_failed",
            JobCommand::GenerateSingle { .. } => "generate_single",
        }
    }
}

/// 正在运行的条目
#[derive(Debug, Clone, Serialize)]
pub struct ActiveJob {
    pub item_id: String,
    pub run_id: String,
    pub started_at: DateTime<Utc>,
}

/// Job Queue Port
pub trait JobQueuePort: Send + Sync {
    /// 提交命令（不等待执行）
    fn submit(&self, command: JobCommand) -> Result<(), JobControlError>;
}

/// Job Claim Port
///
/// 所有状态存储在内存中，进程重启后自然清空。
pub trait JobClaimPort: Send + Sync {
    /// 占用条目，已被占用时返回 AlreadyClaimed
    fn try_claim(&self, item_id: &JobId, run_id: &str) -> Result<(), JobControlError>;

    /// 释放条目
    fn release(&self, item_id: &JobId);

    /// 条目是否正在运行
    fn is_claimed(&self, item_id: &JobId) -> bool;

    /// 当前运行中的条目
    fn active(&self) -> Vec<ActiveJob>;
}
