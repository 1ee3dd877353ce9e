//! Job Command Handlers

use serde::Serialize;
use std::sync::Arc;

use crate::application::commands::{
    ClearAllJobs, ClearJob, GenerateSingle, ProcessUnmade, RegisterJob, RetryFailed,
};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    JobClaimPort, JobCommand, JobQueuePort, JobRepositoryPort, NewJob, RegisterOutcome,
};
use crate::domain::job::JobId;

// ============================================================================
// RegisterJob
// ============================================================================

/// 登记响应
#[derive(Debug, Clone, Serialize)]
pub struct RegisterJobResponse {
    pub id: String,
    /// 是否为新条目
    pub created: bool,
}

/// RegisterJob Handler
pub struct RegisterJobHandler {
    job_repo: Arc<dyn JobRepositoryPort>,
}

impl RegisterJobHandler {
    pub fn new(job_repo: Arc<dyn JobRepositoryPort>) -> Self {
        Self { job_repo }
    }

    pub async fn handle(&self, cmd: RegisterJob) -> Result<RegisterJobResponse, ApplicationError> {
        let id = JobId::new(cmd.id)?;

        if cmd.title.trim().is_empty() {
            return Err(ApplicationError::validation("Title cannot be empty"));
        }
        if cmd.source_url.trim().is_empty() {
            return Err(ApplicationError::validation("Source url cannot be empty"));
        }

        let job = NewJob {
            id: id.clone(),
            source: cmd.source,
            title: cmd.title,
            content: cmd.content,
            score: cmd.score,
            author: cmd.author,
            created_at: cmd.created_at,
            source_url: cmd.source_url,
        };

        let outcome = self.job_repo.register(&job).await?;
        let created = outcome == RegisterOutcome::Created;

        tracing::info!(item_id = %id, created, "Job registered");

        Ok(RegisterJobResponse {
            id: id.to_string(),
            created,
        })
    }
}

// ============================================================================
// Pipeline triggers
// ============================================================================

/// 触发响应（命令已入队）
#[derive(Debug, Clone, Serialize)]
pub struct TriggerResponse {
    pub command: &'static str,
    pub queued: bool,
}

/// 流水线触发 Handler
///
/// 只负责入队，实际执行由后台 worker 完成。
pub struct TriggerPipelineHandler {
    job_repo: Arc<dyn JobRepositoryPort>,
    queue: Arc<dyn JobQueuePort>,
}

impl TriggerPipelineHandler {
    pub fn new(job_repo: Arc<dyn JobRepositoryPort>, queue: Arc<dyn JobQueuePort>) -> Self {
        Self { job_repo, queue }
    }

    pub fn process_unmade(&self, _cmd: ProcessUnmade) -> Result<TriggerResponse, ApplicationError> {
        self.submit(JobCommand::ProcessUnmade)
    }

    pub fn retry_failed(&self, _cmd: RetryFailed) -> Result<TriggerResponse, ApplicationError> {
        self.submit(JobCommand::RetryFailed)
    }

    /// 入队前确认 URL 已登记，便于调用方立即得到反馈
    pub async fn generate_single(
        &self,
        cmd: GenerateSingle,
    ) -> Result<TriggerResponse, ApplicationError> {
        let url = cmd.url.trim().to_string();
        if url.is_empty() {
            return Err(ApplicationError::validation("Url cannot be empty"));
        }

        if self.job_repo.find_by_url(&url).await?.is_none() {
            return Err(ApplicationError::not_found("Job url", url));
        }

        self.submit(JobCommand::GenerateSingle { url })
    }

    fn submit(&self, command: JobCommand) -> Result<TriggerResponse, ApplicationError> {
        let name = command.name();
        self.queue.submit(command)?;
        tracing::info!(command = name, "Pipeline command queued");
        Ok(TriggerResponse {
            command: name,
            queued: true,
        })
    }
}

// ============================================================================
// ClearJob / ClearAllJobs
// ============================================================================

/// 清除响应
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub deleted: u64,
}

/// 清除状态 Handler
///
/// 正在运行的条目不能被清除。
pub struct ClearJobsHandler {
    job_repo: Arc<dyn JobRepositoryPort>,
    claims: Arc<dyn JobClaimPort>,
}

impl ClearJobsHandler {
    pub fn new(job_repo: Arc<dyn JobRepositoryPort>, claims: Arc<dyn JobClaimPort>) -> Self {
        Self { job_repo, claims }
    }

    pub async fn clear(&self, cmd: ClearJob) -> Result<ClearResponse, ApplicationError> {
        let id = JobId::new(cmd.id)?;

        if self.claims.is_claimed(&id) {
            return Err(ApplicationError::invalid_state(format!("job is running: {}", id)));
        }

        if !self.job_repo.delete(&id).await? {
            return Err(ApplicationError::not_found("Job", id.as_str()));
        }

        tracing::info!(item_id = %id, "Job state cleared");
        Ok(ClearResponse { deleted: 1 })
    }

    pub async fn clear_all(&self, _cmd: ClearAllJobs) -> Result<ClearResponse, ApplicationError> {
        let active = self.claims.active();
        if !active.is_empty() {
            return Err(ApplicationError::invalid_state(format!(
                "{} job(s) running",
                active.len()
            )));
        }

        let deleted = self.job_repo.delete_all().await?;
        tracing::info!(deleted, "All job state cleared");
        Ok(ClearResponse { deleted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::JobStatus as Status;
    use crate::infrastructure::memory::{InMemoryJobClaims, InMemoryJobQueue};
    use crate::infrastructure::persistence::sqlite::{
        create_pool, run_migrations, DatabaseConfig, SqliteJobRepository,
    };
    use chrono::Utc;

    async fn repo() -> Arc<SqliteJobRepository> {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        Arc::new(SqliteJobRepository::new(pool))
    }

    fn register_cmd(id: &str) -> RegisterJob {
        RegisterJob {
            id: id.to_string(),
            source: "AmItheAsshole".to_string(),
            title: "AITA for this".to_string(),
            content: "Some story.".to_string(),
            score: 1200,
            author: "someone".to_string(),
            created_at: Utc::now(),
            source_url: format!("https://example.com/{}", id),
        }
    }

    #[tokio::test]
    async fn test_register_then_refresh() {
        let repo = repo().await;
        let handler = RegisterJobHandler::new(repo.clone());

        let first = handler.handle(register_cmd("abc")).await.unwrap();
        assert!(first.created);

        let second = handler.handle(register_cmd("abc")).await.unwrap();
        assert!(!second.created);

        let id = JobId::new("abc").unwrap();
        let job = repo.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(job.status, Status::Unprocessed);
    }

    #[tokio::test]
    async fn test_register_rejects_empty_title() {
        let handler = RegisterJobHandler::new(repo().await);
        let mut cmd = register_cmd("abc");
        cmd.title = "  ".to_string();
        let err = handler.handle(cmd).await.unwrap_err();
        assert!(matches!(err, ApplicationError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_generate_single_requires_known_url() {
        let repo = repo().await;
        RegisterJobHandler::new(repo.clone())
            .handle(register_cmd("abc"))
            .await
            .unwrap();

        let (queue, mut rx) = InMemoryJobQueue::channel(4);
        let handler = TriggerPipelineHandler::new(repo, Arc::new(queue));

        let err = handler
            .generate_single(GenerateSingle {
                url: "https://example.com/missing".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound { .. }));

        handler
            .generate_single(GenerateSingle {
                url: "https://example.com/abc".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(
            rx.recv().await,
            Some(JobCommand::GenerateSingle {
                url: "https://example.com/abc".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_clear_refuses_running_job() {
        let repo = repo().await;
        RegisterJobHandler::new(repo.clone())
            .handle(register_cmd("abc"))
            .await
            .unwrap();

        let claims = Arc::new(InMemoryJobClaims::new());
        let handler = ClearJobsHandler::new(repo.clone(), claims.clone());
        let id = JobId::new("abc").unwrap();

        claims.try_claim(&id, "run-1").unwrap();
        let err = handler.clear(ClearJob { id: "abc".to_string() }).await.unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidState(_)));

        claims.release(&id);
        let cleared = handler.clear(ClearJob { id: "abc".to_string() }).await.unwrap();
        assert_eq!(cleared.deleted, 1);
        assert!(repo.find_by_id(&id).await.unwrap().is_none());

        let err = handler.clear(ClearJob { id: "abc".to_string() }).await.unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound { .. }));
    }
}
