use crate::{
    AppState,
    db::models::api::ApiResponse,
    db::models::user::{UserRequest, UserSearch},
    error::AppError,
    routes::IncludeQuery,
    services::UsersService,
    validation::{JsonBody, ValidatedJson},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

pub async fn get_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IncludeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let items = UsersService::get_all(&mut conn, query.include_related_data)?;
    let response = ApiResponse::success(items, "Users retrieved successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
    Query(query): Query<IncludeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let item = UsersService::get_by_id(&mut conn, user_id, query.include_related_data)?;
    let response = ApiResponse::success(item, "User retrieved successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn search_users(
    State(state): State<Arc<AppState>>,
    JsonBody(search): JsonBody<UserSearch>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let page = UsersService::search(&mut conn, &search)?;
    let response = ApiResponse::success(page, "Users retrieved successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<UserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let item = UsersService::create(&mut conn, payload, state.config.bcrypt_cost)?;
    let response = ApiResponse::created(item, "User created successfully");
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<UserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let item = UsersService::update(&mut conn, user_id, payload, state.config.bcrypt_cost)?;
    let response = ApiResponse::success(item, "User updated successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    UsersService::delete(&mut conn, user_id)?;
    let response = ApiResponse::<()>::ok("User deleted successfully");
    Ok((StatusCode::OK, Json(response)))
}
