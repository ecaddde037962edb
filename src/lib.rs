pub mod chat;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod schema;
pub mod services;
pub mod speech;
pub mod validation;

use crate::chat::{AzureOpenAiClient, ChatClient};
use crate::config::Config;
use crate::db::DbPool;
use crate::speech::SpeechPipeline;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
    /// `None` when Azure OpenAI is not configured; `/api/ChatAI` answers 503.
    pub chat: Option<Arc<dyn ChatClient>>,
    /// `None` when storage or speech credentials are missing.
    pub speech: Option<Arc<SpeechPipeline>>,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Self {
        let http = reqwest::Client::new();

        let chat: Option<Arc<dyn ChatClient>> = match config.chat() {
            Some(chat) => Some(Arc::new(AzureOpenAiClient::new(&chat, http.clone()))),
            None => {
                tracing::warn!("Azure OpenAI is not configured; chat endpoint disabled");
                None
            }
        };

        let speech = match (config.speech(), config.storage()) {
            (Some(speech), Some(storage)) => {
                match SpeechPipeline::from_config(&speech, &storage, http) {
                    Ok(pipeline) => Some(Arc::new(pipeline)),
                    Err(e) => {
                        tracing::error!(error = %e, "Speech pipeline disabled");
                        None
                    }
                }
            }
            _ => {
                tracing::warn!("Speech or storage is not configured; transcription disabled");
                None
            }
        };

        Self::with_integrations(db, config, chat, speech)
    }

    pub fn with_integrations(
        db: DbPool,
        config: Config,
        chat: Option<Arc<dyn ChatClient>>,
        speech: Option<Arc<SpeechPipeline>>,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            chat,
            speech,
        }
    }
}

pub fn init_tracing(config: &Config) {
    let logging = config.logging();
    let level_filter = match logging.level.as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    };
    // RUST_LOG 优先
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_filter));

    match logging.format.as_str() {
        "json" => {
            tracing_subscriber::fmt().with_env_filter(filter).json().init();
        }
        _ => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}
