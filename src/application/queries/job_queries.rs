//! Job Queries

use crate::domain::job::JobStatus;

/// 列出条目（可按状态过滤）
#[derive(Debug, Clone, Default)]
pub struct ListJobs {
    pub status: Option<JobStatus>,
}

/// 获取条目详情
#[derive(Debug, Clone)]
pub struct GetJob {
    pub id: String,
}

/// 获取条目的成品视频
#[derive(Debug, Clone)]
pub struct GetJobVideo {
    pub id: String,
}

/// 列出正在运行的条目
#[derive(Debug, Clone)]
pub struct ListActiveJobs;
