//! Ping Handler

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::application::ListActiveJobs;
use crate::infrastructure::http::state::AppState;

/// Ping 响应
#[derive(Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// 正在处理的条目数
    pub active_jobs: usize,
}

/// Ping endpoint - 健康检查
pub async fn ping(State(state): State<Arc<AppState>>) -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        active_jobs: state.list_active_jobs_handler.handle(ListActiveJobs).len(),
    })
}
