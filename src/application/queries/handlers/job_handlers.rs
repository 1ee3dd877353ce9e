//! Job Query Handlers

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{
    ActiveJob, ArtifactStoragePort, JobClaimPort, JobRecord, JobRepositoryPort,
};
use crate::application::queries::{GetJob, GetJobVideo, ListActiveJobs, ListJobs};
use crate::domain::job::{JobId, JobStatus};

// ============================================================================
// Response DTOs
// ============================================================================

/// 条目摘要（列表用，不含正文）
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub id: String,
    pub source: String,
    pub title: String,
    pub score: i64,
    pub author: String,
    pub source_url: String,
    pub status: &'static str,
    pub status_code: i64,
    pub last_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<JobRecord> for JobSummary {
    fn from(record: JobRecord) -> Self {
        Self {
            id: record.id.to_string(),
            source: record.source,
            title: record.title,
            score: record.score,
            author: record.author,
            source_url: record.source_url,
            status: record.status.as_str(),
            status_code: record.status.code(),
            last_error: record.last_error,
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
        }
    }
}

/// 条目详情
#[derive(Debug, Clone, Serialize)]
pub struct JobDetail {
    #[serde(flatten)]
    pub summary: JobSummary,
    pub content: String,
    /// 正在被某次运行处理
    pub running: bool,
    /// 成品视频是否存在
    pub video_ready: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// ListJobs Handler
pub struct ListJobsHandler {
    job_repo: Arc<dyn JobRepositoryPort>,
}

impl ListJobsHandler {
    pub fn new(job_repo: Arc<dyn JobRepositoryPort>) -> Self {
        Self { job_repo }
    }

    pub async fn handle(&self, query: ListJobs) -> Result<Vec<JobSummary>, ApplicationError> {
        let jobs = self.job_repo.list(query.status).await?;
        Ok(jobs.into_iter().map(JobSummary::from).collect())
    }
}

/// GetJob / GetJobVideo Handler
pub struct GetJobHandler {
    job_repo: Arc<dyn JobRepositoryPort>,
    claims: Arc<dyn JobClaimPort>,
    storage: Arc<dyn ArtifactStoragePort>,
}

impl GetJobHandler {
    pub fn new(
        job_repo: Arc<dyn JobRepositoryPort>,
        claims: Arc<dyn JobClaimPort>,
        storage: Arc<dyn ArtifactStoragePort>,
    ) -> Self {
        Self {
            job_repo,
            claims,
            storage,
        }
    }

    pub async fn handle(&self, query: GetJob) -> Result<JobDetail, ApplicationError> {
        let record = self.find(&query.id).await?;
        let running = self.claims.is_claimed(&record.id);
        let video_ready = record.status == JobStatus::Done
            && self
                .storage
                .exists(&self.storage.output_paths(&record.id).video)
                .await;
        let content = record.content.clone();

        Ok(JobDetail {
            summary: JobSummary::from(record),
            content,
            running,
            video_ready,
        })
    }

    /// 返回成品视频路径，只有完成且文件存在的条目才有视频
    pub async fn video(&self, query: GetJobVideo) -> Result<PathBuf, ApplicationError> {
        let record = self.find(&query.id).await?;
        if record.status != JobStatus::Done {
            return Err(ApplicationError::invalid_state(format!(
                "job {} is {}",
                record.id, record.status
            )));
        }

        let video = self.storage.output_paths(&record.id).video;
        if !self.storage.exists(&video).await {
            return Err(ApplicationError::not_found("Video", record.id.as_str()));
        }
        Ok(video)
    }

    async fn find(&self, id: &str) -> Result<JobRecord, ApplicationError> {
        let id = JobId::new(id)?;
        self.job_repo
            .find_by_id(&id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Job", id.as_str()))
    }
}

/// ListActiveJobs Handler
pub struct ListActiveJobsHandler {
    claims: Arc<dyn JobClaimPort>,
}

impl ListActiveJobsHandler {
    pub fn new(claims: Arc<dyn JobClaimPort>) -> Self {
        Self { claims }
    }

    pub fn handle(&self, _query: ListActiveJobs) -> Vec<ActiveJob> {
        self.claims.active()
    }
}
