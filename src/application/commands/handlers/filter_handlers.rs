//! Filter Word Command Handlers

use serde::Serialize;
use std::sync::Arc;

use crate::application::commands::{AddFilterWord, RemoveFilterWord};
use crate::application::error::ApplicationError;
use crate::application::ports::FilterWordRepositoryPort;

/// 过滤词变更响应
#[derive(Debug, Clone, Serialize)]
pub struct FilterWordResponse {
    pub word: String,
    /// 是否实际发生变更
    pub changed: bool,
}

/// 过滤词管理 Handler
pub struct FilterWordHandler {
    filter_repo: Arc<dyn FilterWordRepositoryPort>,
}

impl FilterWordHandler {
    pub fn new(filter_repo: Arc<dyn FilterWordRepositoryPort>) -> Self {
        Self { filter_repo }
    }

    pub async fn add(&self, cmd: AddFilterWord) -> Result<FilterWordResponse, ApplicationError> {
        let word = validate_word(&cmd.word)?;
        let changed = self.filter_repo.add(&word).await?;
        tracing::info!(word = %word, changed, "Filter word added");
        Ok(FilterWordResponse { word, changed })
    }

    pub async fn remove(&self, cmd: RemoveFilterWord) -> Result<FilterWordResponse, ApplicationError> {
        let word = validate_word(&cmd.word)?;
        let changed = self.filter_repo.remove(&word).await?;
        if !changed {
            return Err(ApplicationError::not_found("Filter word", word));
        }
        tracing::info!(word = %word, "Filter word removed");
        Ok(FilterWordResponse { word, changed })
    }
}

fn validate_word(word: &str) -> Result<String, ApplicationError> {
    let word = word.trim();
    if word.is_empty() {
        return Err(ApplicationError::validation("Filter word cannot be empty"));
    }
    if word.chars().any(char::is_whitespace) {
        return Err(ApplicationError::validation("Filter word must be a single word"));
    }
    Ok(word.to_string())
}
