use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use object_store::azure::{MicrosoftAzure, MicrosoftAzureBuilder};
use object_store::path::Path as BlobPath;
use object_store::signer::Signer;
use object_store::{
    Attribute, Attributes, BackoffConfig, ClientOptions, ObjectStore, PutMultipartOpts,
    RetryConfig, WriteMultipart,
};
use tokio::io::AsyncReadExt;
use tracing::{debug, info};
use url::Url;

use super::SpeechError;

pub const BLOCK_SIZE: usize = 4 * 1024 * 1024;
pub const UPLOAD_CONCURRENCY: usize = 4;
pub const RETRY_DELAY: Duration = Duration::from_secs(2);
pub const RETRY_MAX_DELAY: Duration = Duration::from_secs(30);
pub const MAX_RETRIES: usize = 5;
pub const NETWORK_TIMEOUT: Duration = Duration::from_secs(10 * 60);
/// Lifetime of the read URL handed to the speech service.
pub const READ_URL_TTL: Duration = Duration::from_secs(5 * 60 * 60);
const PROGRESS_STEP_PERCENT: f64 = 5.0;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Uploads the file and returns a time-limited read URL for it.
    async fn upload(&self, path: &Path, content_type: &str) -> Result<String, SpeechError>;
}

/// Account name, key and blob endpoint parsed from a storage connection string.
#[derive(Clone)]
pub struct StorageAccount {
    pub name: String,
    key: String,
    pub blob_endpoint: Url,
}

impl std::fmt::Debug for StorageAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageAccount")
            .field("name", &self.name)
            .field("blob_endpoint", &self.blob_endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl StorageAccount {
    pub fn parse(connection_string: &str) -> Result<Self, SpeechError> {
        let mut protocol = "https".to_string();
        let mut name = None;
        let mut key = None;
        let mut suffix = "core.windows.net".to_string();
        let mut endpoint = None;

        for part in connection_string.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (k, v) = part.split_once('=').ok_or_else(|| {
                SpeechError::InvalidConnectionString(format!("malformed segment '{}'", part))
            })?;
            match k {
                "DefaultEndpointsProtocol" => protocol = v.to_string(),
                "AccountName" => name = Some(v.to_string()),
                // base64 key 末尾的 '=' 不能被 split_once 吃掉
                "AccountKey" => key = Some(v.to_string()),
                "EndpointSuffix" => suffix = v.to_string(),
                "BlobEndpoint" => endpoint = Some(v.to_string()),
                _ => {}
            }
        }

        let name = name
            .ok_or_else(|| SpeechError::InvalidConnectionString("missing AccountName".into()))?;
        let key = key
            .ok_or_else(|| SpeechError::InvalidConnectionString("missing AccountKey".into()))?;
        let endpoint =
            endpoint.unwrap_or_else(|| format!("{}://{}.blob.{}", protocol, name, suffix));
        let blob_endpoint = Url::parse(&endpoint)
            .map_err(|e| SpeechError::InvalidConnectionString(format!("bad endpoint: {}", e)))?;

        Ok(Self {
            name,
            key,
            blob_endpoint,
        })
    }
}

/// 2 s initial delay doubling up to 30 s, five retries, ten minute budget.
pub fn retry_config() -> RetryConfig {
    RetryConfig {
        backoff: BackoffConfig {
            init_backoff: RETRY_DELAY,
            max_backoff: RETRY_MAX_DELAY,
            base: 2.0,
        },
        max_retries: MAX_RETRIES,
        retry_timeout: NETWORK_TIMEOUT,
    }
}

/// Blob upload through `object_store`. The container must already exist.
pub struct AzureBlobStore {
    inner: Arc<MicrosoftAzure>,
    container: String,
}

impl AzureBlobStore {
    pub fn new(connection_string: &str, container: impl Into<String>) -> Result<Self, SpeechError> {
        let account = StorageAccount::parse(connection_string)?;
        let container = container.into();
        let store = MicrosoftAzureBuilder::new()
            .with_account(account.name.as_str())
            .with_access_key(account.key.as_str())
            .with_container_name(container.as_str())
            .with_endpoint(account.blob_endpoint.as_str().trim_end_matches('/').to_string())
            .with_allow_http(account.blob_endpoint.scheme() == "http")
            .with_retry(retry_config())
            .with_client_options(ClientOptions::new().with_timeout(NETWORK_TIMEOUT))
            .build()?;

        Ok(Self {
            inner: Arc::new(store),
            container,
        })
    }

    /// Service SAS URL granting read access to one blob.
    pub async fn read_url(&self, blob_name: &str) -> Result<String, SpeechError> {
        let location = BlobPath::from(blob_name);
        let url = self
            .inner
            .signed_url(http::Method::GET, &location, READ_URL_TTL)
            .await?;
        debug!(blob = %blob_name, "Read SAS issued");
        Ok(url.to_string())
    }

    async fn write_file(
        &self,
        path: &Path,
        location: &BlobPath,
        content_type: &str,
    ) -> Result<(), SpeechError> {
        let file_size = tokio::fs::metadata(path).await?.len();
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let opts = PutMultipartOpts {
            attributes,
            ..Default::default()
        };

        let upload = self.inner.put_multipart_opts(location, opts).await?;
        let mut writer = WriteMultipart::new_with_chunk_size(upload, BLOCK_SIZE);
        let mut file = tokio::fs::File::open(path).await?;
        let mut buf = vec![0u8; BLOCK_SIZE];
        let mut progress = Progress::new(file_size);

        loop {
            if let Err(e) = writer.wait_for_capacity(UPLOAD_CONCURRENCY).await {
                writer.abort().await.ok();
                return Err(e.into());
            }
            let n = match file.read(&mut buf).await {
                Ok(n) => n,
                Err(e) => {
                    writer.abort().await.ok();
                    return Err(e.into());
                }
            };
            if n == 0 {
                break;
            }
            writer.write(&buf[..n]);
            if let Some(percent) = progress.advance(n as u64) {
                info!("上传进度: {:.1}% ({}/{} bytes)", percent, progress.uploaded, file_size);
            }
        }

        writer.finish().await?;
        Ok(())
    }
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    async fn upload(&self, path: &Path, content_type: &str) -> Result<String, SpeechError> {
        let blob_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SpeechError::Storage(format!("Invalid file name: {}", path.display())))?
            .to_string();
        let location = BlobPath::from(blob_name.as_str());
        info!(file = %path.display(), container = %self.container, blob = %blob_name, "Uploading to blob storage");

        self.write_file(path, &location, content_type).await?;
        info!(blob = %blob_name, "Upload complete");

        self.read_url(&blob_name).await
    }
}

/// Reports progress each time another 5 % of the file has been written.
#[derive(Debug)]
struct Progress {
    total: u64,
    uploaded: u64,
    last_logged: f64,
}

impl Progress {
    fn new(total: u64) -> Self {
        Self {
            total,
            uploaded: 0,
            last_logged: 0.0,
        }
    }

    fn advance(&mut self, bytes: u64) -> Option<f64> {
        self.uploaded += bytes;
        if self.total == 0 {
            return None;
        }
        let percent = self.uploaded as f64 / self.total as f64 * 100.0;
        if percent - self.last_logged >= PROGRESS_STEP_PERCENT {
            self.last_logged = percent;
            return Some(percent);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONN: &str = "DefaultEndpointsProtocol=https;AccountName=meetings;AccountKey=c2VjcmV0LWtleQ==;EndpointSuffix=core.windows.net";

    #[test]
    fn parses_connection_string() {
        let account = StorageAccount::parse(CONN).unwrap();
        assert_eq!(account.name, "meetings");
        assert_eq!(account.key, "c2VjcmV0LWtleQ==");
        assert_eq!(account.blob_endpoint.as_str(), "https://meetings.blob.core.windows.net/");
    }

    #[test]
    fn explicit_blob_endpoint_wins() {
        let account = StorageAccount::parse(
            "AccountName=dev;AccountKey=a2V5;BlobEndpoint=http://127.0.0.1:10000/dev",
        )
        .unwrap();
        assert_eq!(account.blob_endpoint.scheme(), "http");
        assert_eq!(account.blob_endpoint.as_str(), "http://127.0.0.1:10000/dev");
    }

    #[test]
    fn rejects_incomplete_connection_strings() {
        assert!(StorageAccount::parse("AccountName=x").is_err());
        assert!(StorageAccount::parse("AccountKey=a2V5").is_err());
        assert!(StorageAccount::parse("garbage").is_err());
    }

    #[test]
    fn retry_policy_values() {
        let retry = retry_config();
        assert_eq!(retry.backoff.init_backoff, Duration::from_secs(2));
        assert_eq!(retry.backoff.max_backoff, Duration::from_secs(30));
        assert_eq!(retry.max_retries, 5);
        assert_eq!(retry.retry_timeout, Duration::from_secs(600));
    }

    #[test]
    fn progress_logs_every_five_percent() {
        let mut progress = Progress::new(100);
        assert_eq!(progress.advance(3), None);
        assert_eq!(progress.advance(2), Some(5.0));
        assert_eq!(progress.advance(4), None);
        assert_eq!(progress.advance(91), Some(100.0));
        assert_eq!(Progress::new(0).advance(10), None);
    }

    #[tokio::test]
    async fn read_url_is_scoped_to_the_blob() {
        let store = AzureBlobStore::new(CONN, "audio-files").unwrap();
        let url = store.read_url("standup.wav").await.unwrap();
        assert!(url.starts_with("https://meetings.blob.core.windows.net/audio-files/standup.wav?"));
        assert!(url.contains("sig="));
        assert!(url.contains("sp=r"));
    }
}
