//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::ports::{
    ArtifactStoragePort, FilterWordRepositoryPort, JobClaimPort, JobQueuePort, JobRepositoryPort,
};
use crate::application::{
    // Command handlers
    ClearJobsHandler, FilterWordHandler, RegisterJobHandler, TriggerPipelineHandler,
    // Query handlers
    GetJobHandler, ListActiveJobsHandler, ListFilterWordsHandler, ListJobsHandler,
};

/// 应用状态
pub struct AppState {
    // ========== Command Handlers ==========
    pub register_job_handler: RegisterJobHandler,
    pub trigger_handler: TriggerPipelineHandler,
    pub clear_jobs_handler: ClearJobsHandler,
    pub filter_word_handler: FilterWordHandler,

    // ========== Query Handlers ==========
    pub list_jobs_handler: ListJobsHandler,
    pub get_job_handler: GetJobHandler,
    pub list_active_jobs_handler: ListActiveJobsHandler,
    pub list_filter_words_handler: ListFilterWordsHandler,
}

impl AppState {
    pub fn new(
        job_repo: Arc<dyn JobRepositoryPort>,
        filter_repo: Arc<dyn FilterWordRepositoryPort>,
        storage: Arc<dyn ArtifactStoragePort>,
        claims: Arc<dyn JobClaimPort>,
        queue: Arc<dyn JobQueuePort>,
    ) -> Self {
        Self {
            // Command handlers
            register_job_handler: RegisterJobHandler::new(job_repo.clone()),
            trigger_handler: TriggerPipelineHandler::new(job_repo.clone(), queue),
            clear_jobs_handler: ClearJobsHandler::new(job_repo.clone(), claims.clone()),
            filter_word_handler: FilterWordHandler::new(filter_repo.clone()),

            // Query handlers
            list_jobs_handler: ListJobsHandler::new(job_repo.clone()),
            get_job_handler: GetJobHandler::new(job_repo, claims.clone(), storage),
            list_active_jobs_handler: ListActiveJobsHandler::new(claims),
            list_filter_words_handler: ListFilterWordsHandler::new(filter_repo),
        }
    }
}
