use crate::{
    AppState,
    db::models::api::ApiResponse,
    db::models::task::{TaskRequest, TaskSearch},
    error::AppError,
    routes::IncludeQuery,
    services::TasksService,
    validation::{JsonBody, ValidatedJson},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

pub async fn get_tasks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IncludeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let tasks = TasksService::get_all(&mut conn, query.include_related_data)?;
    let response = ApiResponse::success(tasks, "Tasks retrieved successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<i32>,
    Query(query): Query<IncludeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let item = TasksService::get_by_id(&mut conn, task_id, query.include_related_data)?;
    let response = ApiResponse::success(item, "Task retrieved successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn search_tasks(
    State(state): State<Arc<AppState>>,
    JsonBody(search): JsonBody<TaskSearch>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let page = TasksService::search(&mut conn, &search)?;
    let response = ApiResponse::success(page, "Tasks retrieved successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn create_task(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<TaskRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let item = TasksService::create(&mut conn, payload)?;
    let response = ApiResponse::created(item, "Task created successfully");
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<TaskRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let item = TasksService::update(&mut conn, task_id, payload)?;
    let response = ApiResponse::success(item, "Task updated successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    TasksService::delete(&mut conn, task_id)?;
    let response = ApiResponse::<()>::ok("Task deleted successfully");
    Ok((StatusCode::OK, Json(response)))
}
