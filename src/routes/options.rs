use crate::{db::models::api::ApiResponse, services::OptionsService};
use axum::{Json, http::StatusCode, response::IntoResponse};

pub async fn get_status_options() -> impl IntoResponse {
    let response = ApiResponse::success(OptionsService::work_statuses(), "Status options");
    (StatusCode::OK, Json(response))
}

pub async fn get_priority_options() -> impl IntoResponse {
    let response = ApiResponse::success(OptionsService::priorities(), "Priority options");
    (StatusCode::OK, Json(response))
}

pub async fn get_convert_status_options() -> impl IntoResponse {
    let response = ApiResponse::success(OptionsService::convert_statuses(), "Convert status options");
    (StatusCode::OK, Json(response))
}
