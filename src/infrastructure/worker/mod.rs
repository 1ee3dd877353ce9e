//! Worker Layer - Background Task Processing
//!
//! 实现 JobWorker，串行执行流水线命令

mod job_worker;

pub use job_worker::JobWorker;
