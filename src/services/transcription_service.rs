use std::path::PathBuf;
use std::sync::Arc;

use diesel::PgConnection;
use tracing::{error, info};

use crate::{
    AppState,
    db::DbPool,
    db::models::recorded_media_file::RecordedMediaFileDto,
    error::AppError,
    services::recorded_media_files_service::RecordedMediaFilesService,
    speech::{AudioFormat, SpeechError, SpeechPipeline, transcript},
};

/// Uploaded recordings are transcribed as diarized WAV.
pub const MEDIA_FORMAT: AudioFormat = AudioFormat::Wav;

pub struct TranscriptionService;

impl TranscriptionService {
    /// Claims the file (`Converting`) and runs the pipeline on a background task.
    /// The task moves the row to `Transcribing` once transcoding finishes and
    /// ends in `Completed` with the transcript or `Failed` with the reason.
    pub fn start(state: &AppState, file_id: i32) -> Result<RecordedMediaFileDto, AppError> {
        let pipeline = state.speech.clone().ok_or_else(|| {
            AppError::ServiceUnavailable("Speech transcription is not configured".to_string())
        })?;

        let mut conn = state.db.get()?;
        let file = RecordedMediaFilesService::begin_transcription(&mut conn, file_id)?;

        let transcript_dir = state.config.transcript_dir.clone();
        let job = MediaTranscription {
            db: state.db.clone(),
            pipeline,
            file_id,
            source: state.config.upload_dir.join(&file.save_file_name),
            work_dir: transcript_dir.join(".work").join(file_id.to_string()),
            out_dir: transcript_dir,
            stem: PathBuf::from(&file.save_file_name)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("recording")
                .to_string(),
        };
        info!(file_id, source = %job.source.display(), "Transcription queued");
        tokio::spawn(job.run());

        Ok(file.into())
    }
}

struct MediaTranscription {
    db: DbPool,
    pipeline: Arc<SpeechPipeline>,
    file_id: i32,
    source: PathBuf,
    work_dir: PathBuf,
    out_dir: PathBuf,
    stem: String,
}

impl MediaTranscription {
    async fn run(self) {
        let file_id = self.file_id;
        match self.execute().await {
            Ok(text) => {
                self.record(|conn| RecordedMediaFilesService::mark_completed(conn, file_id, text))
            }
            Err(e) => {
                let reason = e.to_string();
                self.record(|conn| RecordedMediaFilesService::mark_failed(conn, file_id, &reason))
            }
        }
        if let Err(e) = tokio::fs::remove_dir_all(&self.work_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                error!(file_id, error = %e, "Failed to clean work directory");
            }
        }
    }

    async fn execute(&self) -> Result<String, SpeechError> {
        let media = self
            .pipeline
            .prepare_media(&self.source, &self.work_dir, MEDIA_FORMAT)
            .await?;
        self.record(|conn| RecordedMediaFilesService::mark_transcribing(conn, self.file_id));

        let result = self.pipeline.transcribe_file(&media.path, MEDIA_FORMAT).await;
        media.cleanup().await;
        let text = result?;

        transcript::write_outputs(&self.out_dir, &self.stem, &text).await?;
        Ok(text)
    }

    fn record(&self, update: impl FnOnce(&mut PgConnection) -> Result<(), AppError>) {
        let outcome = self
            .db
            .get()
            .map_err(AppError::from)
            .and_then(|mut conn| update(&mut *conn));
        if let Err(e) = outcome {
            error!(file_id = self.file_id, error = %e, "Failed to record transcription progress");
        }
    }
}
