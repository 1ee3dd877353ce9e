//! Job Context - 视频任务限界上下文
//!
//! 职责:
//! - 内容条目（一次流水线运行的输入）
//! - 任务状态机: Unprocessed -> {Done, Failed}, Failed -> {Done, Failed}

mod entities;
mod errors;
mod value_objects;

pub use entities::ContentItem;
pub use errors::JobError;
pub use value_objects::{JobId, JobStatus, RunMode};
