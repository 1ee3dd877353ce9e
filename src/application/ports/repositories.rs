//! Repository Ports - 出站端口
//!
//! 定义数据持久化的抽象接口
//! 具体实现在 infrastructure 层（如 SQLite）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::job::{ContentItem, JobId, JobStatus};

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),
}

// ============================================================================
// Job Repository
// ============================================================================

/// 待登记的内容条目（由外部发现流程提供）
#[derive(Debug, Clone)]
pub struct NewJob {
    pub id: JobId,
    pub source: String,
    pub title: String,
    pub content: String,
    pub score: i64,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub source_url: String,
}

/// 视频任务实体（用于持久化）
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub id: JobId,
    pub source: String,
    pub title: String,
    pub content: String,
    pub score: i64,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub source_url: String,
    pub status: JobStatus,
    pub last_error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    /// 转换为流水线输入
    pub fn content_item(&self) -> ContentItem {
        ContentItem::new(
            self.id.clone(),
            self.title.clone(),
            self.content.clone(),
            self.source_url.clone(),
        )
    }
}

/// 登记结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// 新条目，状态为未处理
    Created,
    /// 已存在，仅刷新内容
    Refreshed,
}

/// Job Repository Port
#[async_trait]
pub trait JobRepositoryPort: Send + Sync {
    /// 登记条目（新条目为未处理；已存在的条目只刷新内容，不改变状态）
    async fn register(&self, job: &NewJob) -> Result<RegisterOutcome, RepositoryError>;

    /// 根据 ID 查找
    async fn find_by_id(&self, id: &JobId) -> Result<Option<JobRecord>, RepositoryError>;

    /// 根据来源 URL 查找
    async fn find_by_url(&self, url: &str) -> Result<Option<JobRecord>, RepositoryError>;

    /// 列出任务（可按状态过滤，按创建时间排序）
    async fn list(&self, status: Option<JobStatus>) -> Result<Vec<JobRecord>, RepositoryError>;

    /// 标记为完成
    async fn mark_done(&self, id: &JobId) -> Result<(), RepositoryError>;

    /// 标记为失败（状态和错误信息在同一条语句中更新）
    async fn mark_failed(&self, id: &JobId, error: &str) -> Result<(), RepositoryError>;

    /// 删除单个任务
    async fn delete(&self, id: &JobId) -> Result<bool, RepositoryError>;

    /// 删除全部任务
    async fn delete_all(&self) -> Result<u64, RepositoryError>;
}

// ============================================================================
// Filter Word Repository
// ============================================================================

/// 过滤词仓储
#[async_trait]
pub trait FilterWordRepositoryPort: Send + Sync {
    /// 获取全部过滤词
    async fn list(&self) -> Result<Vec<String>, RepositoryError>;

    /// 添加过滤词，返回是否新增
    async fn add(&self, word: &str) -> Result<bool, RepositoryError>;

    /// 删除过滤词，返回是否存在
    async fn remove(&self, word: &str) -> Result<bool, RepositoryError>;

    /// 首次启动时写入默认过滤词，返回写入数量
    ///
    /// 只执行一次；之后即使过滤词被全部删除也不再写入。
    async fn seed(&self, words: &[String]) -> Result<u64, RepositoryError>;
}
