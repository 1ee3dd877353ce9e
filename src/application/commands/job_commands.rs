//! Job Commands

use chrono::{DateTime, Utc};

/// 登记内容条目命令（由外部发现流程调用）
#[derive(Debug, Clone)]
pub struct RegisterJob {
    pub id: String,
    pub source: String,
    pub title: String,
    pub content: String,
    pub score: i64,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub source_url: String,
}

/// 处理全部未处理条目
#[derive(Debug, Clone)]
pub struct ProcessUnmade;

/// 重试全部失败条目
#[derive(Debug, Clone)]
pub struct RetryFailed;

/// 按来源 URL 生成单个条目
#[derive(Debug, Clone)]
pub struct GenerateSingle {
    pub url: String,
}

/// 清除单个条目状态
#[derive(Debug, Clone)]
pub struct ClearJob {
    pub id: String,
}

/// 清除全部条目状态
#[derive(Debug, Clone)]
pub struct ClearAllJobs;
