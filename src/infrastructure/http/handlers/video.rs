//! Video Download Handler

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::application::GetJobVideo;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 流式返回成品视频
pub async fn download_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let video_path = state
        .get_job_handler
        .video(GetJobVideo { id: id.clone() })
        .await?;

    let file = tokio::fs::File::open(&video_path)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to open video file: {}", e)))?;

    let file_size = file
        .metadata()
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to get file metadata: {}", e)))?
        .len();

    let body = Body::from_stream(ReaderStream::new(file));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(header::CONTENT_LENGTH, file_size)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}.mp4\"", id),
        )
        .body(body)
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}
