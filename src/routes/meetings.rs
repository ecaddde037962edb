use crate::{
    AppState,
    db::models::api::ApiResponse,
    db::models::meeting::{MeetingRequest, MeetingSearch},
    error::AppError,
    routes::IncludeQuery,
    services::MeetingsService,
    validation::{JsonBody, ValidatedJson},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

pub async fn get_meetings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IncludeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let items = MeetingsService::get_all(&mut conn, query.include_related_data)?;
    let response = ApiResponse::success(items, "Meetings retrieved successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn get_meeting(
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<i32>,
    Query(query): Query<IncludeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let item = MeetingsService::get_by_id(&mut conn, meeting_id, query.include_related_data)?;
    let response = ApiResponse::success(item, "Meeting retrieved successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn search_meetings(
    State(state): State<Arc<AppState>>,
    JsonBody(search): JsonBody<MeetingSearch>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let page = MeetingsService::search(&mut conn, &search)?;
    let response = ApiResponse::success(page, "Meetings retrieved successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn create_meeting(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<MeetingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let item = MeetingsService::create(&mut conn, payload)?;
    let response = ApiResponse::created(item, "Meeting created successfully");
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn update_meeting(
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<MeetingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let item = MeetingsService::update(&mut conn, meeting_id, payload)?;
    let response = ApiResponse::success(item, "Meeting updated successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn delete_meeting(
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    MeetingsService::delete(&mut conn, meeting_id)?;
    let response = ApiResponse::<()>::ok("Meeting deleted successfully");
    Ok((StatusCode::OK, Json(response)))
}
