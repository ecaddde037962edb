use crate::{
    AppState,
    db::models::api::ApiResponse,
    db::models::gantt_chart::{GanttChartRequest, GanttChartSearch},
    error::AppError,
    routes::IncludeQuery,
    services::GanttChartsService,
    validation::{JsonBody, ValidatedJson},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

pub async fn get_gantt_charts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IncludeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let items = GanttChartsService::get_all(&mut conn, query.include_related_data)?;
    let response = ApiResponse::success(items, "Gantt charts retrieved successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn get_gantt_chart(
    State(state): State<Arc<AppState>>,
    Path(chart_id): Path<i32>,
    Query(query): Query<IncludeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let item = GanttChartsService::get_by_id(&mut conn, chart_id, query.include_related_data)?;
    let response = ApiResponse::success(item, "Gantt chart retrieved successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn search_gantt_charts(
    State(state): State<Arc<AppState>>,
    JsonBody(search): JsonBody<GanttChartSearch>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let page = GanttChartsService::search(&mut conn, &search)?;
    let response = ApiResponse::success(page, "Gantt charts retrieved successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn create_gantt_chart(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<GanttChartRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let item = GanttChartsService::create(&mut conn, payload)?;
    let response = ApiResponse::created(item, "Gantt chart created successfully");
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn update_gantt_chart(
    State(state): State<Arc<AppState>>,
    Path(chart_id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<GanttChartRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let item = GanttChartsService::update(&mut conn, chart_id, payload)?;
    let response = ApiResponse::success(item, "Gantt chart updated successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn delete_gantt_chart(
    State(state): State<Arc<AppState>>,
    Path(chart_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    GanttChartsService::delete(&mut conn, chart_id)?;
    let response = ApiResponse::<()>::ok("Gantt chart deleted successfully");
    Ok((StatusCode::OK, Json(response)))
}
