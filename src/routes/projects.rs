use crate::{
    AppState,
    db::models::api::ApiResponse,
    db::models::project::{ProjectRequest, ProjectSearch, UpdateCompletionRequest, UpdateStatusRequest},
    error::AppError,
    routes::IncludeQuery,
    services::ProjectsService,
    validation::{JsonBody, ValidatedJson},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

pub async fn get_projects(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IncludeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let projects = ProjectsService::get_all(&mut conn, query.include_related_data)?;
    let response = ApiResponse::success(projects, "Projects retrieved successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<i32>,
    Query(query): Query<IncludeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let project = ProjectsService::get_by_id(&mut conn, project_id, query.include_related_data)?;
    let response = ApiResponse::success(project, "Project retrieved successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn search_projects(
    State(state): State<Arc<AppState>>,
    JsonBody(search): JsonBody<ProjectSearch>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let page = ProjectsService::search(&mut conn, &search)?;
    let response = ApiResponse::success(page, "Projects retrieved successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn create_project(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<ProjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let project = ProjectsService::create(&mut conn, payload)?;
    let response = ApiResponse::created(project, "Project created successfully");
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn update_project(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<ProjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let project = ProjectsService::update(&mut conn, project_id, payload)?;
    let response = ApiResponse::success(project, "Project updated successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn update_project_status(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<i32>,
    JsonBody(payload): JsonBody<UpdateStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let project = ProjectsService::update_status(&mut conn, project_id, payload.status)?;
    let response = ApiResponse::success(project, "Project status updated successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn update_project_completion(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateCompletionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let project =
        ProjectsService::update_completion(&mut conn, project_id, payload.completion_percentage)?;
    let response = ApiResponse::success(project, "Project completion updated successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    ProjectsService::delete(&mut conn, project_id)?;
    let response = ApiResponse::<()>::ok("Project deleted successfully");
    Ok((StatusCode::OK, Json(response)))
}
