use crate::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: bool,
    pub speech_configured: bool,
    pub chat_configured: bool,
    pub timestamp: String,
}

/// 200 when the database answers, 503 otherwise.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = match state.db.get() {
        Ok(mut conn) => diesel::sql_query("SELECT 1").execute(&mut conn).is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not get a connection");
            false
        }
    };

    let body = HealthStatus {
        status: if database { "healthy" } else { "unhealthy" },
        database,
        speech_configured: state.speech.is_some(),
        chat_configured: state.chat.is_some(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    let code = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(body))
}
