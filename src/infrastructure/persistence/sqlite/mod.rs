//! SQLite Persistence - SQLite 数据库持久化实现

mod database;
mod filter_word_repo;
mod job_repo;

pub use database::*;
pub use filter_word_repo::*;
pub use job_repo::*;
