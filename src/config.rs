use crate::error::{AppError, AppResult};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    // transcribe CLI 不需要数据库
    #[serde(default)]
    pub database_url: String,
    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub database_min_connections: u32,
    #[serde(default = "default_connection_timeout")]
    pub database_connection_timeout: u64,

    #[serde(default = "default_host")]
    pub server_host: String,
    #[serde(default = "default_port")]
    pub server_port: u16,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,

    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    #[serde(default = "default_upload_max_bytes")]
    pub upload_max_bytes: usize,
    #[serde(default = "default_transcript_dir")]
    pub transcript_dir: PathBuf,
    #[serde(default = "default_ffmpeg_dir")]
    pub ffmpeg_dir: PathBuf,

    pub azure_storage_connection_string: Option<String>,
    #[serde(default = "default_storage_container")]
    pub azure_storage_container: String,

    pub azure_speech_key: Option<String>,
    pub azure_speech_region: Option<String>,
    pub azure_speech_endpoint: Option<String>,
    #[serde(default = "default_speech_locale")]
    pub speech_locale: String,
    #[serde(default = "default_speech_poll_interval")]
    pub speech_poll_interval_secs: u64,
    #[serde(default = "default_speech_job_timeout")]
    pub speech_job_timeout_secs: u64,

    pub azure_openai_endpoint: Option<String>,
    pub azure_openai_key: Option<String>,
    pub azure_openai_deployment: Option<String>,
    #[serde(default = "default_openai_api_version")]
    pub azure_openai_api_version: String,
    #[serde(default = "default_openai_temperature")]
    pub azure_openai_temperature: f32,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

// 为了向后兼容，创建嵌套结构的访问器
#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_bytes: usize,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub connection_string: String,
    pub container: String,
}

#[derive(Clone, Debug)]
pub struct SpeechConfig {
    pub key: String,
    pub region: String,
    /// Overrides `https://{region}.api.cognitive.microsoft.com`.
    pub endpoint: Option<String>,
    pub locale: String,
    pub poll_interval: Duration,
    /// `None` polls until the service reports a terminal status.
    pub job_timeout: Option<Duration>,
    pub transcript_dir: PathBuf,
    pub ffmpeg_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct ChatConfig {
    pub endpoint: String,
    pub key: String,
    pub deployment: String,
    pub api_version: String,
    pub temperature: f32,
}

// Default value functions
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connection_timeout() -> u64 {
    30
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}
fn default_upload_max_bytes() -> usize {
    500 * 1024 * 1024
}
fn default_transcript_dir() -> PathBuf {
    PathBuf::from("transcripts")
}
fn default_ffmpeg_dir() -> PathBuf {
    PathBuf::from("tools")
}
fn default_storage_container() -> String {
    "audio-files".to_string()
}
fn default_speech_locale() -> String {
    "zh-TW".to_string()
}
fn default_speech_poll_interval() -> u64 {
    60
}
fn default_speech_job_timeout() -> u64 {
    4 * 60 * 60
} // 0 disables the limit
fn default_openai_api_version() -> String {
    "2024-06-01".to_string()
}
fn default_openai_temperature() -> f32 {
    0.7
}
fn default_bcrypt_cost() -> u32 {
    10
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let config = envy::from_env::<Config>()
            .map_err(|e| AppError::Config(format!("Failed to load config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.database_max_connections == 0 {
            return Err(AppError::Config(
                "DATABASE_MAX_CONNECTIONS must be > 0".to_string(),
            ));
        }

        if self.database_min_connections > self.database_max_connections {
            return Err(AppError::Config(
                "DATABASE_MIN_CONNECTIONS cannot be greater than DATABASE_MAX_CONNECTIONS"
                    .to_string(),
            ));
        }

        if self.upload_max_bytes == 0 {
            return Err(AppError::Config("UPLOAD_MAX_BYTES must be > 0".to_string()));
        }

        if self.speech_poll_interval_secs == 0 {
            return Err(AppError::Config(
                "SPEECH_POLL_INTERVAL_SECS must be > 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.azure_openai_temperature) {
            return Err(AppError::Config(
                "AZURE_OPENAI_TEMPERATURE must be between 0 and 2".to_string(),
            ));
        }

        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(AppError::Config(
                "BCRYPT_COST must be between 4 and 31".to_string(),
            ));
        }

        Ok(())
    }

    pub fn require_database(&self) -> AppResult<()> {
        if self.database_url.trim().is_empty() {
            return Err(AppError::Config("DATABASE_URL must be set".to_string()));
        }
        Ok(())
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    // 提供嵌套结构的访问器
    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.database_url.clone(),
            max_connections: self.database_max_connections,
            min_connections: self.database_min_connections,
            connection_timeout: self.database_connection_timeout,
        }
    }

    pub fn server(&self) -> ServerConfig {
        ServerConfig {
            host: self.server_host.clone(),
            port: self.server_port,
            cors_origins: self.cors_origins.clone(),
        }
    }

    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level.clone(),
            format: self.log_format.clone(),
        }
    }

    pub fn uploads(&self) -> UploadConfig {
        UploadConfig {
            dir: self.upload_dir.clone(),
            max_bytes: self.upload_max_bytes,
        }
    }

    // 以下集成在缺少凭据时返回 None, 对应接口返回 503

    pub fn storage(&self) -> Option<StorageConfig> {
        let connection_string = non_empty(&self.azure_storage_connection_string)?;
        Some(StorageConfig {
            connection_string,
            container: self.azure_storage_container.clone(),
        })
    }

    pub fn speech(&self) -> Option<SpeechConfig> {
        let key = non_empty(&self.azure_speech_key)?;
        let region = non_empty(&self.azure_speech_region)?;
        Some(SpeechConfig {
            key,
            region,
            endpoint: non_empty(&self.azure_speech_endpoint),
            locale: self.speech_locale.clone(),
            poll_interval: Duration::from_secs(self.speech_poll_interval_secs),
            job_timeout: match self.speech_job_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            transcript_dir: self.transcript_dir.clone(),
            ffmpeg_dir: self.ffmpeg_dir.clone(),
        })
    }

    pub fn chat(&self) -> Option<ChatConfig> {
        Some(ChatConfig {
            endpoint: non_empty(&self.azure_openai_endpoint)?,
            key: non_empty(&self.azure_openai_key)?,
            deployment: non_empty(&self.azure_openai_deployment)?,
            api_version: self.azure_openai_api_version.clone(),
            temperature: self.azure_openai_temperature,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config, envy::Error> {
        envy::from_iter(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn defaults_apply() {
        let config = from_pairs(&[("DATABASE_URL", "postgres://localhost/pa")]).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.server_address(), "127.0.0.1:8000");
        assert_eq!(config.azure_storage_container, "audio-files");
        assert_eq!(config.speech_locale, "zh-TW");
        assert!(config.storage().is_none());
        assert!(config.speech().is_none());
        assert!(config.chat().is_none());
    }

    #[test]
    fn database_url_is_only_required_by_the_server() {
        let config = from_pairs(&[("AZURE_SPEECH_KEY", "k")]).unwrap();
        assert!(config.validate().is_ok());
        assert!(config.require_database().is_err());
    }

    #[test]
    fn speech_view_requires_key_and_region() {
        let config = from_pairs(&[
            ("DATABASE_URL", "postgres://localhost/pa"),
            ("AZURE_SPEECH_KEY", "k"),
            ("AZURE_SPEECH_REGION", "eastasia"),
            ("SPEECH_JOB_TIMEOUT_SECS", "0"),
        ])
        .unwrap();
        let speech = config.speech().unwrap();
        assert_eq!(speech.region, "eastasia");
        assert_eq!(speech.poll_interval, Duration::from_secs(60));
        assert_eq!(speech.job_timeout, None);
    }

    #[test]
    fn rejects_bad_pool_sizes() {
        let config = from_pairs(&[
            ("DATABASE_URL", "postgres://localhost/pa"),
            ("DATABASE_MAX_CONNECTIONS", "2"),
            ("DATABASE_MIN_CONNECTIONS", "5"),
        ])
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn blank_credentials_count_as_missing() {
        let config = from_pairs(&[
            ("DATABASE_URL", "postgres://localhost/pa"),
            ("AZURE_OPENAI_ENDPOINT", "https://x.openai.azure.com"),
            ("AZURE_OPENAI_KEY", "  "),
            ("AZURE_OPENAI_DEPLOYMENT", "gpt-4o"),
        ])
        .unwrap();
        assert!(config.chat().is_none());
    }
}
