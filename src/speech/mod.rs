//! Speech-to-text: transcode, upload to blob storage, run an Azure batch
//! transcription job and render the result as markdown.

pub mod blob_storage;
pub mod pipeline;
pub mod transcoder;
pub mod transcript;
pub mod transcription;

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::error::AppError;

pub use pipeline::{PreparedMedia, SpeechPipeline, TranscriptOutput};

#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid storage connection string: {0}")]
    InvalidConnectionString(String),

    #[error("Transcoder error: {0}")]
    Transcoder(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Blob storage error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("Speech service error: {0}")]
    Service(String),

    #[error("Transcription job failed: {0}")]
    JobFailed(String),

    #[error("Transcription job did not finish within {0:?}")]
    Timeout(Duration),

    #[error("No {format} files found in {dir}")]
    NoAudioFiles { dir: PathBuf, format: &'static str },
}

impl From<SpeechError> for AppError {
    fn from(err: SpeechError) -> Self {
        match err {
            SpeechError::Io(e) => AppError::Io(e),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

/// Target format of the transcoder. WAV output is sent with speaker
/// diarization enabled, MP3 without.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AudioFormat {
    Wav,
    Mp3,
}

impl AudioFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Mp3 => "audio/mpeg",
        }
    }

    pub fn diarized(&self) -> bool {
        matches!(self, AudioFormat::Wav)
    }

    pub fn matches(&self, path: &std::path::Path) -> bool {
        crate::validation::media::media_extension(path).as_deref() == Some(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn format_matches_extension_case_insensitively() {
        assert!(AudioFormat::Wav.matches(Path::new("a/meeting.WAV")));
        assert!(!AudioFormat::Mp3.matches(Path::new("meeting.wav")));
        assert!(AudioFormat::Wav.diarized());
        assert!(!AudioFormat::Mp3.diarized());
    }

    #[test]
    fn io_errors_keep_their_kind() {
        let err: AppError = SpeechError::Io(std::io::Error::other("disk")).into();
        assert!(matches!(err, AppError::Io(_)));
        let err: AppError = SpeechError::JobFailed("bad audio".into()).into();
        assert!(matches!(err, AppError::Upstream(_)));
    }
}
