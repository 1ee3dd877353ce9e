//! Filter Word Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::FilterWordRepositoryPort;
use crate::application::queries::ListFilterWords;

/// ListFilterWords Handler
pub struct ListFilterWordsHandler {
    filter_repo: Arc<dyn FilterWordRepositoryPort>,
}

impl ListFilterWordsHandler {
    pub fn new(filter_repo: Arc<dyn FilterWordRepositoryPort>) -> Self {
        Self { filter_repo }
    }

    pub async fn handle(&self, _query: ListFilterWords) -> Result<Vec<String>, ApplicationError> {
        Ok(self.filter_repo.list().await?)
    }
}
