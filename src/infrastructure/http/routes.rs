//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping               GET   健康检查
//! - /api/jobs/register      POST  登记条目
//! - /api/jobs/list          GET   列出条目（?status=）
//! - /api/jobs/get           POST  获取条目详情
//! - /api/jobs/process_unmade POST 处理全部未处理条目
//! - /api/jobs/retry_failed  POST  重试全部失败条目
//! - /api/jobs/generate      POST  按来源 URL 生成单个条目
//! - /api/jobs/clear         POST  清除单个条目状态
//! - /api/jobs/clear_all     POST  清除全部条目状态
//! - /api/jobs/active        GET   正在运行的条目
//! - /api/jobs/video/{id}    GET   下载成品视频
//! - /api/filter/list        GET   列出过滤词
//! - /api/filter/add         POST  添加过滤词
//! - /api/filter/remove      POST  删除过滤词

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/jobs", job_routes())
        .nest("/filter", filter_routes())
}

/// Job 路由
fn job_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(handlers::register_job))
        .route("/list", get(handlers::list_jobs))
        .route("/get", post(handlers::get_job))
        .route("/process_unmade", post(handlers::process_unmade))
        .route("/retry_failed", post(handlers::retry_failed))
        .route("/generate", post(handlers::generate_single))
        .route("/clear", post(handlers::clear_job))
        .route("/clear_all", post(handlers::clear_all_jobs))
        .route("/active", get(handlers::active_jobs))
        .route("/video/:id", get(handlers::download_video))
}

/// Filter 路由
fn filter_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/list", get(handlers::list_filter_words))
        .route("/add", post(handlers::add_filter_word))
        .route("/remove", post(handlers::remove_filter_word))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::pipeline::test_support::{Harness, HarnessOptions};
    use crate::application::ports::JobCommand;
    use crate::domain::job::RunMode;
    use crate::infrastructure::http::server::HttpServer;
    use crate::infrastructure::memory::InMemoryJobQueue;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tokio::sync::mpsc::Receiver;
    use tower::util::ServiceExt;

    fn app(harness: &Harness) -> (Router, Receiver<JobCommand>) {
        let (queue, rx) = InMemoryJobQueue::channel(8);
        let state = AppState::new(
            harness.jobs.clone(),
            harness.filter_repo.clone(),
            harness.storage.clone(),
            harness.claims.clone(),
            Arc::new(queue),
        );
        (HttpServer::build_router(Arc::new(state)), rx)
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_ping() {
        let harness = Harness::new(HarnessOptions::default()).await;
        let (app, _rx) = app(&harness);

        let (status, body) = call(&app, "GET", "/api/ping", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["active_jobs"], 0);
    }

    #[tokio::test]
    async fn test_register_list_and_get() {
        let harness = Harness::new(HarnessOptions::default()).await;
        let (app, _rx) = app(&harness);

        let (_, body) = call(
            &app,
            "POST",
            "/api/jobs/register",
            Some(json!({
                "id": "t3_abc",
                "source": "tifu",
                "title": "TIFU by testing",
                "content": "It went badly.",
                "score": 42,
                "source_url": "https://example.com/t3_abc"
            })),
        )
        .await;
        assert_eq!(body["errno"], 0);
        assert_eq!(body["data"]["created"], true);

        let (_, body) = call(&app, "GET", "/api/jobs/list?status=unprocessed", None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["status_code"], 0);

        let (_, body) = call(&app, "GET", "/api/jobs/list?status=done", None).await;
        assert!(body["data"].as_array().unwrap().is_empty());

        let (_, body) = call(&app, "GET", "/api/jobs/list?status=bogus", None).await;
        assert_eq!(body["errno"], 400);

        let (_, body) = call(&app, "POST", "/api/jobs/get", Some(json!({"id": "t3_abc"}))).await;
        assert_eq!(body["data"]["title"], "TIFU by testing");
        assert_eq!(body["data"]["content"], "It went badly.");
        assert_eq!(body["data"]["video_ready"], false);

        let (status, body) = call(&app, "POST", "/api/jobs/get", Some(json!({"id": "nope"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["errno"], 404);
    }

    #[tokio::test]
    async fn test_triggers_enqueue_commands() {
        let harness = Harness::new(HarnessOptions::default()).await;
        harness.register("one", "Title", "Body.").await;
        let (app, mut rx) = app(&harness);

        let (_, body) = call(&app, "POST", "/api/jobs/process_unmade", None).await;
        assert_eq!(body["data"]["command"], "process_unmade");
        assert_eq!(rx.recv().await, Some(JobCommand::ProcessUnmade));

        call(&app, "POST", "/api/jobs/retry_failed", None).await;
        assert_eq!(rx.recv().await, Some(JobCommand::RetryFailed));

        let (_, body) = call(
            &app,
            "POST",
            "/api/jobs/generate",
            Some(json!({"url": "https://example.com/one"})),
        )
        .await;
        assert_eq!(body["errno"], 0);
        assert_eq!(
            rx.recv().await,
            Some(JobCommand::GenerateSingle {
                url: "https://example.com/one".to_string()
            })
        );

        let (_, body) = call(
            &app,
            "POST",
            "/api/jobs/generate",
            Some(json!({"url": "https://example.com/missing"})),
        )
        .await;
        assert_eq!(body["errno"], 404);
    }

    #[tokio::test]
    async fn test_clear_and_clear_all() {
        let harness = Harness::new(HarnessOptions::default()).await;
        harness.register("one", "Title", "Body.").await;
        harness.register("two", "Title", "Body.").await;
        let (app, _rx) = app(&harness);

        let (_, body) = call(&app, "POST", "/api/jobs/clear", Some(json!({"id": "one"}))).await;
        assert_eq!(body["data"]["deleted"], 1);

        let (_, body) = call(&app, "POST", "/api/jobs/clear_all", None).await;
        assert_eq!(body["data"]["deleted"], 1);

        let (_, body) = call(&app, "GET", "/api/jobs/list", None).await;
        assert!(body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filter_words() {
        let harness = Harness::new(HarnessOptions::default()).await;
        let (app, _rx) = app(&harness);

        let (_, body) = call(&app, "POST", "/api/filter/add", Some(json!({"word": "heck"}))).await;
        assert_eq!(body["data"]["changed"], true);

        let (_, body) = call(&app, "GET", "/api/filter/list", None).await;
        assert_eq!(body["data"]["total"], 1);
        assert_eq!(body["data"]["words"][0], "heck");

        let (_, body) = call(&app, "POST", "/api/filter/remove", Some(json!({"word": "heck"}))).await;
        assert_eq!(body["errno"], 0);

        let (_, body) = call(&app, "POST", "/api/filter/remove", Some(json!({"word": "heck"}))).await;
        assert_eq!(body["errno"], 404);

        let (_, body) = call(&app, "POST", "/api/filter/add", Some(json!({"word": " "}))).await;
        assert_eq!(body["errno"], 400);
    }

    #[tokio::test]
    async fn test_video_download() {
        let harness = Harness::new(HarnessOptions::default()).await;
        let id = harness.register("vid", "Title", "Body text.").await;
        let (app, _rx) = app(&harness);

        let (_, body) = call(&app, "GET", "/api/jobs/video/vid", None).await;
        assert_eq!(body["errno"], 409);

        harness.orchestrator.process_item(&id, RunMode::Fresh).await;

        let request = Request::builder()
            .uri("/api/jobs/video/vid")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "video/mp4");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"mp4");
    }
}
