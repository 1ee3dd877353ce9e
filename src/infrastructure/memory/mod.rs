//! Memory Layer - In-Memory State Management
//!
//! 实现 JobClaimPort 和 JobQueuePort，管理运行中条目和待执行命令

mod job_claims;
mod job_queue;

pub use job_claims::InMemoryJobClaims;
pub use job_queue::InMemoryJobQueue;
