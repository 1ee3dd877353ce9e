//! Filter Word HTTP Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{AddFilterWord, FilterWordResponse, ListFilterWords, RemoveFilterWord};
use crate::infrastructure::http::dto::{ApiResponse, FilterWordRequest, FilterWordsResponse};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 列出过滤词
pub async fn list_filter_words(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<FilterWordsResponse>>, ApiError> {
    let words = state.list_filter_words_handler.handle(ListFilterWords).await?;
    Ok(Json(ApiResponse::success(FilterWordsResponse {
        total: words.len(),
        words,
    })))
}

/// 添加过滤词
pub async fn add_filter_word(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FilterWordRequest>,
) -> Result<Json<ApiResponse<FilterWordResponse>>, ApiError> {
    let response = state
        .filter_word_handler
        .add(AddFilterWord { word: req.word })
        .await?;
    Ok(Json(ApiResponse::success(response)))
}

/// 删除过滤词
pub async fn remove_filter_word(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FilterWordRequest>,
) -> Result<Json<ApiResponse<FilterWordResponse>>, ApiError> {
    let response = state
        .filter_word_handler
        .remove(RemoveFilterWord { word: req.word })
        .await?;
    Ok(Json(ApiResponse::success(response)))
}
