use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use super::transcript::TranscriptionResult;
use super::{AudioFormat, SpeechError};

pub const CANDIDATE_LOCALES: [&str; 3] = ["zh-TW", "zh-CN", "en-US"];
pub const MAX_SPEAKERS: u32 = 10;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    NotStarted,
    Running,
    Succeeded,
    Failed,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct TranscriptionJob {
    #[serde(rename = "self")]
    pub self_url: String,
    pub status: JobStatus,
    #[serde(default)]
    pub links: Option<JobLinks>,
    #[serde(default)]
    pub properties: Option<JobProperties>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct JobLinks {
    pub files: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct JobProperties {
    pub error: Option<JobError>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct JobError {
    pub code: Option<String>,
    pub message: Option<String>,
}

impl TranscriptionJob {
    pub fn failure_reason(&self) -> String {
        self.properties
            .as_ref()
            .and_then(|p| p.error.as_ref())
            .map(|e| {
                format!(
                    "{}: {}",
                    e.code.as_deref().unwrap_or("Unknown"),
                    e.message.as_deref().unwrap_or("no message")
                )
            })
            .unwrap_or_else(|| "speech service reported Failed".to_string())
    }
}

#[derive(Deserialize, Debug)]
struct FileList {
    #[serde(default)]
    values: Vec<ResultFile>,
}

#[derive(Deserialize, Debug)]
struct ResultFile {
    kind: String,
    links: ResultFileLinks,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ResultFileLinks {
    content_url: String,
}

#[async_trait]
pub trait TranscriptionApi: Send + Sync {
    /// Submits a batch job for `content_url` and returns the job's `self` URL.
    async fn create_job(&self, content_url: &str, format: AudioFormat) -> Result<String, SpeechError>;

    async fn job_status(&self, job_url: &str) -> Result<TranscriptionJob, SpeechError>;

    /// Downloads the `Transcription` result file of a succeeded job.
    async fn fetch_result(&self, job: &TranscriptionJob) -> Result<TranscriptionResult, SpeechError>;
}

/// Body of `POST /speechtotext/v3.2/transcriptions`.
pub fn job_request(content_url: &str, locale: &str, format: AudioFormat) -> Value {
    let mut properties = json!({
        "diarizationEnabled": format.diarized(),
        "wordLevelTimestampsEnabled": false,
        "punctuationMode": "DictatedAndAutomatic",
        "maxSpeakerCount": MAX_SPEAKERS,
        "addSentiment": true,
        "profanityFilterMode": "Masked",
        "languageIdentification": {
            "candidateLocales": CANDIDATE_LOCALES,
            "mode": "Continuous"
        },
        "timeToLive": "P1D"
    });
    if format.diarized() {
        properties["speechContext"] = json!({ "phrases": [] });
    }
    json!({
        "contentUrls": [content_url],
        "locale": locale,
        "displayName": "Meeting transcription",
        "description": "Meeting recording with speaker separation",
        "properties": properties
    })
}

pub struct AzureSpeechClient {
    client: reqwest::Client,
    base_url: String,
    key: String,
    locale: String,
}

impl AzureSpeechClient {
    pub fn new(
        client: reqwest::Client,
        region: &str,
        endpoint: Option<&str>,
        key: &str,
        locale: &str,
    ) -> Self {
        let base = endpoint
            .map(|e| e.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("https://{}.api.cognitive.microsoft.com", region));
        Self {
            client,
            base_url: format!("{}/speechtotext/v3.2", base),
            key: key.to_string(),
            locale: locale.to_string(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, SpeechError> {
        let response = self
            .client
            .get(url)
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .send()
            .await?;
        check_status(response).await?.json().await.map_err(Into::into)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SpeechError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    Err(SpeechError::Service(format!("status {}: {}", status, body)))
}

#[async_trait]
impl TranscriptionApi for AzureSpeechClient {
    async fn create_job(&self, content_url: &str, format: AudioFormat) -> Result<String, SpeechError> {
        let url = format!("{}/transcriptions", self.base_url);
        let body = job_request(content_url, &self.locale, format);
        let response = self
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .json(&body)
            .send()
            .await?;
        let job: TranscriptionJob = check_status(response).await?.json().await?;
        info!(job = %job.self_url, "Transcription job created");
        Ok(job.self_url)
    }

    async fn job_status(&self, job_url: &str) -> Result<TranscriptionJob, SpeechError> {
        self.get_json(job_url).await
    }

    async fn fetch_result(&self, job: &TranscriptionJob) -> Result<TranscriptionResult, SpeechError> {
        let files_url = job
            .links
            .as_ref()
            .and_then(|l| l.files.as_deref())
            .ok_or_else(|| SpeechError::Service("Job has no files link".to_string()))?;
        let files: FileList = self.get_json(files_url).await?;
        let content_url = files
            .values
            .into_iter()
            .find(|f| f.kind == "Transcription")
            .map(|f| f.links.content_url)
            .ok_or_else(|| SpeechError::Service("Job produced no Transcription file".to_string()))?;

        debug!("Downloading transcription result");
        // contentUrl 自带 SAS, 不发送订阅密钥
        let response = self.client.get(&content_url).send().await?;
        Ok(check_status(response).await?.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_jobs_enable_diarization() {
        let body = job_request("https://blob/a.wav?sig=x", "zh-TW", AudioFormat::Wav);
        assert_eq!(body["contentUrls"][0], "https://blob/a.wav?sig=x");
        assert_eq!(body["locale"], "zh-TW");
        assert_eq!(body["properties"]["diarizationEnabled"], true);
        assert_eq!(body["properties"]["maxSpeakerCount"], 10);
        assert_eq!(body["properties"]["profanityFilterMode"], "Masked");
        assert_eq!(body["properties"]["timeToLive"], "P1D");
        assert_eq!(
            body["properties"]["languageIdentification"]["candidateLocales"],
            json!(["zh-TW", "zh-CN", "en-US"])
        );
        assert!(body["properties"]["speechContext"].is_object());
    }

    #[test]
    fn mp3_jobs_are_not_diarized() {
        let body = job_request("u", "zh-TW", AudioFormat::Mp3);
        assert_eq!(body["properties"]["diarizationEnabled"], false);
        assert!(body["properties"].get("speechContext").is_none());
    }

    #[test]
    fn parses_job_status() {
        let job: TranscriptionJob = serde_json::from_str(
            r#"{"self":"https://x/transcriptions/1","status":"Failed",
                "properties":{"error":{"code":"InvalidData","message":"bad audio"}}}"#,
        )
        .unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.status.is_terminal());
        assert_eq!(job.failure_reason(), "InvalidData: bad audio");

        let job: TranscriptionJob =
            serde_json::from_str(r#"{"self":"u","status":"Queued"}"#).unwrap();
        assert_eq!(job.status, JobStatus::Unknown);
        assert!(!job.status.is_terminal());
    }

    #[test]
    fn endpoint_override() {
        let client = AzureSpeechClient::new(
            reqwest::Client::new(),
            "eastasia",
            Some("http://localhost:9000/"),
            "k",
            "zh-TW",
        );
        assert_eq!(client.base_url, "http://localhost:9000/speechtotext/v3.2");
        let client = AzureSpeechClient::new(reqwest::Client::new(), "eastasia", None, "k", "zh-TW");
        assert_eq!(
            client.base_url,
            "https://eastasia.api.cognitive.microsoft.com/speechtotext/v3.2"
        );
    }
}
