//! Single-turn chat completion against an Azure OpenAI deployment.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ChatConfig;
use crate::error::AppError;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response contained no choices")]
    EmptyResponse,
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        AppError::Upstream(err.to_string())
    }
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ChatError>;
}

#[derive(Serialize, Debug)]
pub struct ChatRequest<'a> {
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
}

#[derive(Serialize, Debug)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize, Debug)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct AzureOpenAiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    temperature: f32,
}

impl AzureOpenAiClient {
    pub fn new(config: &ChatConfig, client: reqwest::Client) -> Self {
        let endpoint = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            config.endpoint.trim_end_matches('/'),
            config.deployment,
            config.api_version,
        );
        Self {
            client,
            endpoint,
            api_key: config.key.clone(),
            temperature: config.temperature,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatClient for AzureOpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, ChatError> {
        let body = ChatRequest {
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        tracing::debug!(endpoint = %self.endpoint, "Sending chat completion");
        let response = self
            .client
            .post(&self.endpoint)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ChatError::Status { status, body });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ChatError::EmptyResponse)?;
        tracing::info!(chars = content.len(), "Chat completion received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ChatConfig {
        ChatConfig {
            endpoint: "https://pa.openai.azure.com/".to_string(),
            key: "k".to_string(),
            deployment: "gpt-4o".to_string(),
            api_version: "2024-06-01".to_string(),
            temperature: 0.7,
        }
    }

    #[test]
    fn builds_deployment_url() {
        let client = AzureOpenAiClient::new(&config(), reqwest::Client::new());
        assert_eq!(
            client.endpoint(),
            "https://pa.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-06-01"
        );
    }

    #[test]
    fn request_has_single_user_message() {
        let body = ChatRequest {
            messages: vec![ChatMessage {
                role: "user",
                content: "summarise",
            }],
            temperature: 0.7,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "summarise");
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn parses_first_choice() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"hi"}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("hi"));
    }
}
