use crate::{
    AppState,
    db::models::api::ApiResponse,
    db::models::chat_history::{ChatHistoryRequest, ChatHistorySearch},
    error::AppError,
    routes::IncludeQuery,
    services::ChatHistoriesService,
    validation::{JsonBody, ValidatedJson},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

pub async fn get_chat_histories(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IncludeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let items = ChatHistoriesService::get_all(&mut conn, query.include_related_data)?;
    let response = ApiResponse::success(items, "Chat histories retrieved successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn get_chat_history(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<i32>,
    Query(query): Query<IncludeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let item = ChatHistoriesService::get_by_id(&mut conn, chat_id, query.include_related_data)?;
    let response = ApiResponse::success(item, "Chat history retrieved successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn search_chat_histories(
    State(state): State<Arc<AppState>>,
    JsonBody(search): JsonBody<ChatHistorySearch>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let page = ChatHistoriesService::search(&mut conn, &search)?;
    let response = ApiResponse::success(page, "Chat histories retrieved successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn create_chat_history(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<ChatHistoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let item = ChatHistoriesService::create(&mut conn, payload)?;
    let response = ApiResponse::created(item, "Chat history created successfully");
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn update_chat_history(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<ChatHistoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let item = ChatHistoriesService::update(&mut conn, chat_id, payload)?;
    let response = ApiResponse::success(item, "Chat history updated successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn delete_chat_history(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    ChatHistoriesService::delete(&mut conn, chat_id)?;
    let response = ApiResponse::<()>::ok("Chat history deleted successfully");
    Ok((StatusCode::OK, Json(response)))
}
