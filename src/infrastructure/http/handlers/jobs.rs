//! Job HTTP Handlers

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::application::ports::ActiveJob;
use crate::application::{
    ClearAllJobs, ClearJob, ClearResponse, GenerateSingle, GetJob, JobDetail, JobSummary,
    ListActiveJobs, ListJobs, ProcessUnmade, RegisterJob, RegisterJobResponse, RetryFailed,
    TriggerResponse,
};
use crate::domain::job::JobStatus;
use crate::infrastructure::http::dto::{
    ApiResponse, GenerateRequest, JobIdRequest, ListJobsParams, RegisterJobRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 登记条目
pub async fn register_job(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterJobRequest>,
) -> Result<Json<ApiResponse<RegisterJobResponse>>, ApiError> {
    let cmd = RegisterJob {
        id: req.id,
        source: req.source,
        title: req.title,
        content: req.content,
        score: req.score,
        author: req.author,
        created_at: req.created_at.unwrap_or_else(Utc::now),
        source_url: req.source_url,
    };

    let response = state.register_job_handler.handle(cmd).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// 列出条目
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListJobsParams>,
) -> Result<Json<ApiResponse<Vec<JobSummary>>>, ApiError> {
    let status = params
        .status
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<JobStatus>())
        .transpose()
        .map_err(ApiError::BadRequest)?;

    let jobs = state.list_jobs_handler.handle(ListJobs { status }).await?;
    Ok(Json(ApiResponse::success(jobs)))
}

/// 获取条目详情
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Json(req): Json<JobIdRequest>,
) -> Result<Json<ApiResponse<JobDetail>>, ApiError> {
    let detail = state.get_job_handler.handle(GetJob { id: req.id }).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// 处理全部未处理条目（入队后立即返回）
pub async fn process_unmade(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<TriggerResponse>>, ApiError> {
    let response = state.trigger_handler.process_unmade(ProcessUnmade)?;
    Ok(Json(ApiResponse::success(response)))
}

/// 重试全部失败条目（入队后立即返回）
pub async fn retry_failed(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<TriggerResponse>>, ApiError> {
    let response = state.trigger_handler.retry_failed(RetryFailed)?;
    Ok(Json(ApiResponse::success(response)))
}

/// 按来源 URL 生成单个条目
pub async fn generate_single(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<ApiResponse<TriggerResponse>>, ApiError> {
    let response = state
        .trigger_handler
        .generate_single(GenerateSingle { url: req.url })
        .await?;
    Ok(Json(ApiResponse::success(response)))
}

/// 清除单个条目状态
pub async fn clear_job(
    State(state): State<Arc<AppState>>,
    Json(req): Json<JobIdRequest>,
) -> Result<Json<ApiResponse<ClearResponse>>, ApiError> {
    let response = state.clear_jobs_handler.clear(ClearJob { id: req.id }).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// 清除全部条目状态
pub async fn clear_all_jobs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ClearResponse>>, ApiError> {
    let response = state.clear_jobs_handler.clear_all(ClearAllJobs).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// 正在运行的条目
pub async fn active_jobs(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Vec<ActiveJob>>> {
    Json(ApiResponse::success(
        state.list_active_jobs_handler.handle(ListActiveJobs),
    ))
}
