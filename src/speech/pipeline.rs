use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{error, info, warn};

use super::blob_storage::{AzureBlobStore, BlobStore};
use super::transcoder::{FfmpegTranscoder, Transcoder, output_path};
use super::transcript::{self, render};
use super::transcription::{AzureSpeechClient, JobStatus, TranscriptionApi, TranscriptionJob};
use super::{AudioFormat, SpeechError};
use crate::config::{SpeechConfig, StorageConfig};
use crate::validation::media::is_media_file;

#[derive(Debug, Clone)]
pub struct TranscriptOutput {
    pub source: PathBuf,
    pub raw_path: PathBuf,
    pub prompt_path: PathBuf,
    pub transcript: String,
}

/// A file ready for upload; `temporary` files are intermediates owned by the pipeline.
#[derive(Debug, Clone)]
pub struct PreparedMedia {
    pub path: PathBuf,
    pub temporary: bool,
}

impl PreparedMedia {
    pub async fn cleanup(&self) {
        if !self.temporary {
            return;
        }
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            warn!(file = %self.path.display(), error = %e, "Failed to remove intermediate file");
        }
    }
}

pub struct SpeechPipeline {
    transcoder: Arc<dyn Transcoder>,
    store: Arc<dyn BlobStore>,
    api: Arc<dyn TranscriptionApi>,
    poll_interval: Duration,
    job_timeout: Option<Duration>,
}

impl SpeechPipeline {
    pub fn new(
        transcoder: Arc<dyn Transcoder>,
        store: Arc<dyn BlobStore>,
        api: Arc<dyn TranscriptionApi>,
        poll_interval: Duration,
        job_timeout: Option<Duration>,
    ) -> Self {
        Self {
            transcoder,
            store,
            api,
            poll_interval,
            job_timeout,
        }
    }

    pub fn from_config(
        speech: &SpeechConfig,
        storage: &StorageConfig,
        client: reqwest::Client,
    ) -> Result<Self, SpeechError> {
        let transcoder = FfmpegTranscoder::new(&speech.ffmpeg_dir, client.clone());
        let store = AzureBlobStore::new(&storage.connection_string, storage.container.clone())?;
        let api = AzureSpeechClient::new(
            client,
            &speech.region,
            speech.endpoint.as_deref(),
            &speech.key,
            &speech.locale,
        );
        Ok(Self::new(
            Arc::new(transcoder),
            Arc::new(store),
            Arc::new(api),
            speech.poll_interval,
            speech.job_timeout,
        ))
    }

    /// Converts every accepted media file in `dir` (unless `skip_convert`),
    /// then transcribes each file of `format`, writing RAW/GPT files next to it.
    /// A failure on one file is logged and the rest continue.
    pub async fn run_directory(
        &self,
        dir: &Path,
        format: AudioFormat,
        skip_convert: bool,
    ) -> Result<Vec<TranscriptOutput>, SpeechError> {
        if !skip_convert {
            self.convert_directory(dir, format).await?;
        }

        let targets: Vec<PathBuf> = list_files(dir)
            .await?
            .into_iter()
            .filter(|p| format.matches(p))
            .collect();
        if targets.is_empty() {
            error!(dir = %dir.display(), format = format.extension(), "No audio files found");
            return Err(SpeechError::NoAudioFiles {
                dir: dir.to_path_buf(),
                format: format.extension(),
            });
        }

        let mut outputs = Vec::with_capacity(targets.len());
        for path in targets {
            info!(file = %path.display(), "找到音檔");
            match self.process_file(&path, format, dir).await {
                Ok(output) => {
                    info!(file = %path.display(), "Transcript written");
                    outputs.push(output);
                }
                Err(e) => error!(file = %path.display(), error = %e, "Transcription failed"),
            }
        }
        Ok(outputs)
    }

    /// Re-encodes media files in place, deleting each source once converted.
    pub async fn convert_directory(&self, dir: &Path, format: AudioFormat) -> Result<usize, SpeechError> {
        let mut converted = 0;
        for input in list_files(dir).await? {
            if !is_media_file(&input) || format.matches(&input) {
                continue;
            }
            let output = output_path(&input, format);
            match self.transcoder.convert(&input, &output, format).await {
                Ok(()) => {
                    tokio::fs::remove_file(&input).await?;
                    converted += 1;
                }
                Err(e) => warn!(file = %input.display(), error = %e, "Conversion failed"),
            }
        }
        info!(converted, format = format.extension(), "Conversion finished");
        Ok(converted)
    }

    /// Uploads, transcribes and writes `<stem> RAW.md` / `<stem> GPT.md` into `out_dir`.
    pub async fn process_file(
        &self,
        path: &Path,
        format: AudioFormat,
        out_dir: &Path,
    ) -> Result<TranscriptOutput, SpeechError> {
        let text = self.transcribe_file(path, format).await?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("transcript");
        let (raw_path, prompt_path) = transcript::write_outputs(out_dir, stem, &text).await?;
        Ok(TranscriptOutput {
            source: path.to_path_buf(),
            raw_path,
            prompt_path,
            transcript: text,
        })
    }

    /// Transcodes `source` into `work_dir` unless it is already in `format`.
    /// `source` itself is never modified.
    pub async fn prepare_media(
        &self,
        source: &Path,
        work_dir: &Path,
        format: AudioFormat,
    ) -> Result<PreparedMedia, SpeechError> {
        if !tokio::fs::try_exists(source).await? {
            return Err(SpeechError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", source.display()),
            )));
        }
        if format.matches(source) {
            return Ok(PreparedMedia {
                path: source.to_path_buf(),
                temporary: false,
            });
        }
        tokio::fs::create_dir_all(work_dir).await?;
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("recording");
        let converted = work_dir.join(format!("{}.{}", stem, format.extension()));
        self.transcoder.convert(source, &converted, format).await?;
        Ok(PreparedMedia {
            path: converted,
            temporary: true,
        })
    }

    pub async fn transcribe_file(&self, path: &Path, format: AudioFormat) -> Result<String, SpeechError> {
        let content_url = self.store.upload(path, format.content_type()).await?;
        let job_url = self.api.create_job(&content_url, format).await?;
        let job = self.wait_for_job(&job_url).await?;
        let result = self.api.fetch_result(&job).await?;
        info!("---- 轉錄完成 ----");
        Ok(render(&result, format))
    }

    async fn wait_for_job(&self, job_url: &str) -> Result<TranscriptionJob, SpeechError> {
        let started = Instant::now();
        loop {
            let elapsed = started.elapsed();
            let job = self.api.job_status(job_url).await?;
            info!(
                status = ?job.status,
                elapsed = %format_elapsed(elapsed),
                "Polling transcription job"
            );
            match job.status {
                JobStatus::Succeeded => return Ok(job),
                JobStatus::Failed => {
                    let reason = job.failure_reason();
                    error!(job = %job_url, reason = %reason, "Transcription job failed");
                    return Err(SpeechError::JobFailed(reason));
                }
                JobStatus::NotStarted | JobStatus::Running | JobStatus::Unknown => {}
            }
            if let Some(limit) = self.job_timeout {
                if started.elapsed() + self.poll_interval > limit {
                    return Err(SpeechError::Timeout(limit));
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

async fn list_files(dir: &Path) -> Result<Vec<PathBuf>, SpeechError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::transcript::{NBest, RecognizedPhrase, TranscriptionResult};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CopyTranscoder;

    #[async_trait]
    impl Transcoder for CopyTranscoder {
        async fn convert(&self, input: &Path, output: &Path, _: AudioFormat) -> Result<(), SpeechError> {
            tokio::fs::copy(input, output).await?;
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        uploads: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl BlobStore for RecordingStore {
        async fn upload(&self, path: &Path, _: &str) -> Result<String, SpeechError> {
            self.uploads.lock().unwrap().push(path.to_path_buf());
            Ok(format!("https://blob/{}", path.file_name().unwrap().to_string_lossy()))
        }
    }

    /// Reports `Running` for the first `running_polls` polls, then `final_status`.
    struct ScriptedApi {
        running_polls: usize,
        final_status: JobStatus,
        polls: AtomicUsize,
    }

    impl ScriptedApi {
        fn new(running_polls: usize, final_status: JobStatus) -> Self {
            Self {
                running_polls,
                final_status,
                polls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TranscriptionApi for ScriptedApi {
        async fn create_job(&self, _: &str, _: AudioFormat) -> Result<String, SpeechError> {
            Ok("https://speech/jobs/1".to_string())
        }

        async fn job_status(&self, job_url: &str) -> Result<TranscriptionJob, SpeechError> {
            let n = self.polls.fetch_add(1, Ordering::SeqCst);
            let status = if n < self.running_polls {
                JobStatus::Running
            } else {
                self.final_status
            };
            Ok(TranscriptionJob {
                self_url: job_url.to_string(),
                status,
                links: None,
                properties: None,
            })
        }

        async fn fetch_result(&self, _: &TranscriptionJob) -> Result<TranscriptionResult, SpeechError> {
            Ok(TranscriptionResult {
                recognized_phrases: vec![RecognizedPhrase {
                    speaker: 1,
                    n_best: vec![NBest {
                        confidence: 0.9,
                        display: Some("會議開始".to_string()),
                        sentiment: None,
                    }],
                    ..Default::default()
                }],
                combined_recognized_phrases: vec![],
            })
        }
    }

    fn pipeline(api: ScriptedApi, timeout: Option<Duration>) -> (SpeechPipeline, Arc<RecordingStore>) {
        let store = Arc::new(RecordingStore::default());
        let pipeline = SpeechPipeline::new(
            Arc::new(CopyTranscoder),
            store.clone(),
            Arc::new(api),
            Duration::from_secs(60),
            timeout,
        );
        (pipeline, store)
    }

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pa-pipeline-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test(start_paused = true)]
    async fn polls_until_succeeded() {
        let (pipeline, store) = pipeline(ScriptedApi::new(3, JobStatus::Succeeded), None);
        let started = Instant::now();
        let text = pipeline
            .transcribe_file(Path::new("/tmp/a.wav"), AudioFormat::Wav)
            .await
            .unwrap();
        assert!(text.contains("說話人1 : 會議開始"));
        assert_eq!(started.elapsed(), Duration::from_secs(180));
        assert_eq!(store.uploads.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_job_is_terminal() {
        let (pipeline, _) = pipeline(ScriptedApi::new(1, JobStatus::Failed), None);
        let err = pipeline
            .transcribe_file(Path::new("/tmp/a.mp3"), AudioFormat::Mp3)
            .await
            .unwrap_err();
        assert!(matches!(err, SpeechError::JobFailed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_bounds_polling() {
        let (pipeline, _) = pipeline(
            ScriptedApi::new(usize::MAX, JobStatus::Succeeded),
            Some(Duration::from_secs(300)),
        );
        let err = pipeline
            .transcribe_file(Path::new("/tmp/a.wav"), AudioFormat::Wav)
            .await
            .unwrap_err();
        assert!(matches!(err, SpeechError::Timeout(d) if d == Duration::from_secs(300)));
    }

    #[tokio::test]
    async fn directory_run_converts_then_writes_outputs() {
        let dir = temp_dir();
        std::fs::write(dir.join("standup.mp4"), b"video").unwrap();
        std::fs::write(dir.join("notes.txt"), b"ignore").unwrap();
        let (pipeline, store) = pipeline(ScriptedApi::new(0, JobStatus::Succeeded), None);

        let outputs = pipeline
            .run_directory(&dir, AudioFormat::Wav, false)
            .await
            .unwrap();

        assert_eq!(outputs.len(), 1);
        assert!(!dir.join("standup.mp4").exists());
        assert!(dir.join("standup.wav").exists());
        assert!(dir.join("standup RAW.md").exists());
        assert!(dir.join("standup GPT.md").exists());
        assert!(dir.join("notes.txt").exists());
        assert_eq!(store.uploads.lock().unwrap()[0], dir.join("standup.wav"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn empty_directory_reports_no_audio() {
        let dir = temp_dir();
        let (pipeline, _) = pipeline(ScriptedApi::new(0, JobStatus::Succeeded), None);
        let err = pipeline
            .run_directory(&dir, AudioFormat::Mp3, true)
            .await
            .unwrap_err();
        assert!(matches!(err, SpeechError::NoAudioFiles { .. }));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn prepared_media_leaves_the_source() {
        let dir = temp_dir();
        let source = dir.join("upload.m4a");
        std::fs::write(&source, b"audio").unwrap();
        let work = dir.join("work");
        let (pipeline, _) = pipeline(ScriptedApi::new(0, JobStatus::Succeeded), None);

        let media = pipeline
            .prepare_media(&source, &work, AudioFormat::Wav)
            .await
            .unwrap();
        assert!(media.temporary);
        assert_eq!(media.path, work.join("upload.wav"));
        pipeline
            .transcribe_file(&media.path, AudioFormat::Wav)
            .await
            .unwrap();
        media.cleanup().await;

        assert!(source.exists());
        assert!(!work.join("upload.wav").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn missing_source_is_an_io_error() {
        let (pipeline, _) = pipeline(ScriptedApi::new(0, JobStatus::Succeeded), None);
        let err = pipeline
            .prepare_media(Path::new("/nonexistent/x.mp4"), Path::new("/tmp"), AudioFormat::Wav)
            .await
            .unwrap_err();
        assert!(matches!(err, SpeechError::Io(_)));
    }
}
