//! SQLite Job Repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::DbPool;
use crate::application::ports::{
    JobRecord, JobRepositoryPort, NewJob, RegisterOutcome, RepositoryError,
};
use crate::domain::job::{JobId, JobStatus};

const SELECT_COLUMNS: &str = "SELECT id, source, title, content, score, author, created_at, \
     source_url, status, last_error, updated_at FROM jobs";

/// SQLite Job Repository
pub struct SqliteJobRepository {
    pool: DbPool,
}

impl SqliteJobRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// 校验并写入状态转换（读取与更新在同一事务内）
    async fn transition(
        &self,
        id: &JobId,
        to: JobStatus,
        last_error: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        let code: Option<i64> = sqlx::query_scalar("SELECT status FROM jobs WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        let code = code.ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        let from = JobStatus::from_code(code)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        from.transition(to)
            .map_err(|e| RepositoryError::InvalidTransition(e.to_string()))?;

        sqlx::query("UPDATE jobs SET status = ?, last_error = ?, updated_at = ? WHERE id = ?")
            .bind(to.code())
            .bind(last_error)
            .bind(Utc::now().to_rfc3339())
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        tracing::debug!(item_id = %id, from = %from, to = %to, "Job status updated");
        Ok(())
    }
}

#[derive(FromRow)]
struct JobRow {
    id: String,
    source: String,
    title: String,
    content: String,
    score: i64,
    author: String,
    created_at: String,
    source_url: String,
    status: i64,
    last_error: Option<String>,
    updated_at: String,
}

fn parse_time(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

impl TryFrom<JobRow> for JobRecord {
    type Error = RepositoryError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        Ok(JobRecord {
            id: JobId::new(row.id).map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            source: row.source,
            title: row.title,
            content: row.content,
            score: row.score,
            author: row.author,
            created_at: parse_time(&row.created_at)?,
            source_url: row.source_url,
            status: JobStatus::from_code(row.status)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            last_error: row.last_error,
            updated_at: parse_time(&row.updated_at)?,
        })
    }
}

#[async_trait]
impl JobRepositoryPort for SqliteJobRepository {
    async fn register(&self, job: &NewJob) -> Result<RegisterOutcome, RepositoryError> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT status FROM jobs WHERE id = ?")
            .bind(job.id.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        let outcome = if exists.is_some() {
            // 只刷新内容，状态保持不变
            sqlx::query(
                r#"
                UPDATE jobs SET
                    source = ?, title = ?, content = ?, score = ?, author = ?,
                    source_url = ?, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(&job.source)
            .bind(&job.title)
            .bind(&job.content)
            .bind(job.score)
            .bind(&job.author)
            .bind(&job.source_url)
            .bind(&now)
            .bind(job.id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;
            RegisterOutcome::Refreshed
        } else {
            sqlx::query(
                r#"
                INSERT INTO jobs (id, source, title, content, score, author, created_at,
                                  source_url, status, last_error, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?)
                "#,
            )
            .bind(job.id.as_str())
            .bind(&job.source)
            .bind(&job.title)
            .bind(&job.content)
            .bind(job.score)
            .bind(&job.author)
            .bind(job.created_at.to_rfc3339())
            .bind(&job.source_url)
            .bind(JobStatus::Unprocessed.code())
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;
            RegisterOutcome::Created
        };

        tx.commit()
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(outcome)
    }

    async fn find_by_id(&self, id: &JobId) -> Result<Option<JobRecord>, RepositoryError> {
        let row: Option<JobRow> = sqlx::query_as(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        row.map(JobRecord::try_from).transpose()
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<JobRecord>, RepositoryError> {
        let row: Option<JobRow> = sqlx::query_as(&format!(
            "{} WHERE source_url = ? ORDER BY created_at ASC, rowid ASC LIMIT 1",
            SELECT_COLUMNS
        ))
        .bind(url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        row.map(JobRecord::try_from).transpose()
    }

    async fn list(&self, status: Option<JobStatus>) -> Result<Vec<JobRecord>, RepositoryError> {
        let rows: Vec<JobRow> = match status {
            Some(status) => sqlx::query_as(&format!(
                "{} WHERE status = ? ORDER BY created_at ASC, rowid ASC",
                SELECT_COLUMNS
            ))
            .bind(status.code())
            .fetch_all(&self.pool)
            .await,
            None => sqlx::query_as(&format!(
                "{} ORDER BY created_at ASC, rowid ASC",
                SELECT_COLUMNS
            ))
            .fetch_all(&self.pool)
            .await,
        }
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(JobRecord::try_from).collect()
    }

    async fn mark_done(&self, id: &JobId) -> Result<(), RepositoryError> {
        self.transition(id, JobStatus::Done, None).await
    }

    async fn mark_failed(&self, id: &JobId, error: &str) -> Result<(), RepositoryError> {
        self.transition(id, JobStatus::Failed, Some(error)).await
    }

    async fn delete(&self, id: &JobId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM jobs")
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
