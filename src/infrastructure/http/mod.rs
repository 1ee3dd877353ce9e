//! HTTP Layer - 控制 API
//!
//! 供外部发现流程登记条目、触发流水线、管理过滤词

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use routes::create_routes;
pub use server::{HttpServer, ServerConfig};
pub use state::AppState;
