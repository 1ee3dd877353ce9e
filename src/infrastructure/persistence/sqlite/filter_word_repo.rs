//! SQLite Filter Word Repository

use async_trait::async_trait;
use chrono::Utc;

use super::DbPool;
use crate::application::ports::{FilterWordRepositoryPort, RepositoryError};

/// SQLite Filter Word Repository
///
/// 过滤词区分大小写，只去掉首尾空白
pub struct SqliteFilterWordRepository {
    pool: DbPool,
}

impl SqliteFilterWordRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// `meta` 表中的初始化标记
const SEEDED_KEY: &str = "filter_words_seeded";

fn normalize(word: &str) -> String {
    word.trim().to_string()
}

#[async_trait]
impl FilterWordRepositoryPort for SqliteFilterWordRepository {
    async fn list(&self) -> Result<Vec<String>, RepositoryError> {
        sqlx::query_scalar("SELECT word FROM filter_words ORDER BY word ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))
    }

    async fn add(&self, word: &str) -> Result<bool, RepositoryError> {
        let word = normalize(word);
        if word.is_empty() {
            return Ok(false);
        }

        let result = sqlx::query(
            "INSERT INTO filter_words (word, created_at) VALUES (?, ?) ON CONFLICT(word) DO NOTHING",
        )
        .bind(&word)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, word: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM filter_words WHERE word = ?")
            .bind(normalize(word))
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn seed(&self, words: &[String]) -> Result<u64, RepositoryError> {
        let db_err = |e: sqlx::Error| RepositoryError::DatabaseError(e.to_string());
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let marked = sqlx::query("INSERT INTO meta (key, value) VALUES (?, ?) ON CONFLICT(key) DO NOTHING")
            .bind(SEEDED_KEY)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        if marked.rows_affected() == 0 {
            return Ok(0);
        }

        // 标记前已有过滤词的旧库只补写标记
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM filter_words")
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err)?;

        let mut inserted = 0u64;
        if existing == 0 {
            for word in words.iter().map(|w| normalize(w)).filter(|w| !w.is_empty()) {
                let result = sqlx::query(
                    "INSERT INTO filter_words (word, created_at) VALUES (?, ?) ON CONFLICT(word) DO NOTHING",
                )
                .bind(&word)
                .bind(&now)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
                inserted += result.rows_affected();
            }
        }

        tx.commit().await.map_err(db_err)?;

        tracing::info!(count = inserted, "Filter words seeded");
        Ok(inserted)
    }
}
