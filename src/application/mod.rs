//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（TtsEngine、Repository、MediaBackend、JobControl 等）
//! - pipeline: 条目级流水线（合成、合并、渲染、编排）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod pipeline;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    handlers::{
        ClearJobsHandler, ClearResponse, FilterWordHandler, FilterWordResponse,
        RegisterJobHandler, RegisterJobResponse, TriggerPipelineHandler, TriggerResponse,
    },
    AddFilterWord, ClearAllJobs, ClearJob, GenerateSingle, ProcessUnmade, RegisterJob,
    RemoveFilterWord, RetryFailed,
};

pub use error::ApplicationError;

pub use pipeline::{
    BatchReport, ItemOutcome, OrchestratorConfig, OrchestratorError, PipelineError,
    PipelineOrchestrator, SkipReason,
};

pub use queries::{
    handlers::{
        GetJobHandler, JobDetail, JobSummary, ListActiveJobsHandler, ListFilterWordsHandler,
        ListJobsHandler,
    },
    GetJob, GetJobVideo, ListActiveJobs, ListFilterWords, ListJobs,
};
