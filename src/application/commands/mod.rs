//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：处理所有写操作

mod filter_commands;
mod job_commands;

pub mod handlers;

pub use filter_commands::*;
pub use job_commands::*;
