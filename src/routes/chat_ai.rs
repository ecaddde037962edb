use crate::{AppState, db::models::api::ApiResponse, error::AppError};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use std::sync::Arc;

use crate::validation::JsonBody;

/// Accepts either a bare JSON string or `{"prompt": "..."}`.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum ChatPrompt {
    Text(String),
    Object { prompt: String },
}

impl ChatPrompt {
    pub fn into_text(self) -> String {
        match self {
            ChatPrompt::Text(text) | ChatPrompt::Object { prompt: text } => text,
        }
    }
}

pub async fn post_chat_message(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<ChatPrompt>,
) -> Result<impl IntoResponse, AppError> {
    let prompt = payload.into_text();
    if prompt.trim().is_empty() {
        return Err(AppError::validation("Prompt must not be empty"));
    }
    let chat = state.chat.clone().ok_or_else(|| {
        AppError::ServiceUnavailable("Chat completion is not configured".to_string())
    })?;

    tracing::info!(chars = prompt.len(), "Forwarding chat prompt");
    let reply = chat.complete(&prompt).await?;
    let response = ApiResponse::success(reply, "Chat completed successfully");
    Ok((StatusCode::OK, Json(response)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_string_or_object() {
        let p: ChatPrompt = serde_json::from_str(r#""hello""#).unwrap();
        assert_eq!(p.into_text(), "hello");
        let p: ChatPrompt = serde_json::from_str(r#"{"prompt":"hi"}"#).unwrap();
        assert_eq!(p.into_text(), "hi");
        assert!(serde_json::from_str::<ChatPrompt>(r#"{"text":"hi"}"#).is_err());
    }
}
