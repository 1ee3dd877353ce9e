//! Data Transfer Objects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Job DTOs
// ============================================================================

/// 登记请求（外部发现流程提交）
#[derive(Debug, Deserialize)]
pub struct RegisterJobRequest {
    pub id: String,
    #[serde(default)]
    pub source: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub author: String,
    /// 缺省时取登记时间
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub source_url: String,
}

#[derive(Debug, Deserialize)]
pub struct ListJobsParams {
    /// unprocessed / done / failed 或状态码
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JobIdRequest {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub url: String,
}

// ============================================================================
// Filter DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct FilterWordRequest {
    pub word: String,
}

#[derive(Debug, Serialize)]
pub struct FilterWordsResponse {
    pub total: usize,
    pub words: Vec<String>,
}
