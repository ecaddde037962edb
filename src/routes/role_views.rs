use crate::{
    AppState,
    db::models::api::ApiResponse,
    db::models::user::{RoleViewRequest, RoleViewSearch},
    error::AppError,
    services::RoleViewsService,
    validation::{JsonBody, ValidatedJson},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

pub async fn get_role_views(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let roles = RoleViewsService::get_all(&mut conn)?;
    let response = ApiResponse::success(roles, "Role views retrieved successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn get_role_view(
    State(state): State<Arc<AppState>>,
    Path(role_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let item = RoleViewsService::get_by_id(&mut conn, role_id)?;
    let response = ApiResponse::success(item, "Role view retrieved successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn search_role_views(
    State(state): State<Arc<AppState>>,
    JsonBody(search): JsonBody<RoleViewSearch>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let page = RoleViewsService::search(&mut conn, &search)?;
    let response = ApiResponse::success(page, "Role views retrieved successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn create_role_view(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<RoleViewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let item = RoleViewsService::create(&mut conn, payload)?;
    let response = ApiResponse::created(item, "Role view created successfully");
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn update_role_view(
    State(state): State<Arc<AppState>>,
    Path(role_id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<RoleViewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let item = RoleViewsService::update(&mut conn, role_id, payload)?;
    let response = ApiResponse::success(item, "Role view updated successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn delete_role_view(
    State(state): State<Arc<AppState>>,
    Path(role_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    RoleViewsService::delete(&mut conn, role_id)?;
    let response = ApiResponse::<()>::ok("Role view deleted successfully");
    Ok((StatusCode::OK, Json(response)))
}
