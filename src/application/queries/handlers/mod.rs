//! Query Handlers 实现

mod filter_handlers;
mod job_handlers;

pub use filter_handlers::*;
pub use job_handlers::*;
