use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{info, warn};

use super::{AudioFormat, SpeechError};

const LINUX_BUILD: &str = "ffmpeg-master-latest-linux64-gpl";
const WINDOWS_BUILD: &str = "ffmpeg-master-latest-win64-gpl";
const RELEASE_BASE_URL: &str = "https://github.com/BtbN/FFmpeg-Builds/releases/download/latest";

#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Writes `input` re-encoded as `format` to `output`. The input is left in place.
    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        format: AudioFormat,
    ) -> Result<(), SpeechError>;
}

/// Sibling path with the target extension, e.g. `talk.mp4` -> `talk.wav`.
pub fn output_path(input: &Path, format: AudioFormat) -> PathBuf {
    input.with_extension(format.extension())
}

pub fn conversion_args(input: &Path, output: &Path, format: AudioFormat) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), input.into()];
    match format {
        // 16 kHz 单声道 PCM, 说话人分离需要
        AudioFormat::Wav => args.extend(["-c:a", "pcm_s16le", "-ar", "16000"].map(OsString::from)),
        AudioFormat::Mp3 => args.extend(["-c:a", "libmp3lame", "-ar", "44100"].map(OsString::from)),
    }
    args.extend(["-ac", "1", "-vn"].map(OsString::from));
    args.push(output.into());
    args
}

/// Runs a local ffmpeg binary, downloading a static build into `tools_dir`
/// the first time it is needed.
pub struct FfmpegTranscoder {
    tools_dir: PathBuf,
    client: reqwest::Client,
}

impl FfmpegTranscoder {
    pub fn new(tools_dir: impl Into<PathBuf>, client: reqwest::Client) -> Self {
        Self {
            tools_dir: tools_dir.into(),
            client,
        }
    }

    pub fn binary_path(&self) -> PathBuf {
        self.tools_dir.join(binary_name())
    }

    pub async fn ensure_binary(&self) -> Result<PathBuf, SpeechError> {
        let binary = self.binary_path();
        if tokio::fs::try_exists(&binary).await? {
            return Ok(binary);
        }

        let (build, archive_name) = release_archive()?;
        tokio::fs::create_dir_all(&self.tools_dir).await?;
        let extracted_root = self.tools_dir.join(build);
        if tokio::fs::try_exists(&extracted_root).await? {
            tokio::fs::remove_dir_all(&extracted_root).await?;
        }

        let url = format!("{}/{}", RELEASE_BASE_URL, archive_name);
        info!(url = %url, "Downloading ffmpeg");
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        let archive = self.tools_dir.join(archive_name);
        tokio::fs::write(&archive, &bytes).await?;

        // tar 可以同时处理 .tar.xz 和 .zip (bsdtar)
        let status = Command::new("tar")
            .arg("-xf")
            .arg(&archive)
            .arg("-C")
            .arg(&self.tools_dir)
            .status()
            .await?;
        if !status.success() {
            return Err(SpeechError::Transcoder(format!(
                "Failed to extract {}: tar exited with {}",
                archive.display(),
                status
            )));
        }

        tokio::fs::copy(extracted_root.join("bin").join(binary_name()), &binary).await?;
        tokio::fs::remove_file(&archive).await?;
        tokio::fs::remove_dir_all(&extracted_root).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755)).await?;
        }

        info!(path = %binary.display(), "ffmpeg ready");
        Ok(binary)
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        format: AudioFormat,
    ) -> Result<(), SpeechError> {
        let binary = self.ensure_binary().await?;
        info!(input = %input.display(), output = %output.display(), "Converting media");

        let result = Command::new(&binary)
            .args(conversion_args(input, output, format))
            .output()
            .await?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let tail: String = stderr.lines().rev().take(5).collect::<Vec<_>>().join(" | ");
            warn!(input = %input.display(), status = %result.status, "ffmpeg failed");
            return Err(SpeechError::Transcoder(format!(
                "ffmpeg exited with {}: {}",
                result.status, tail
            )));
        }
        Ok(())
    }
}

fn binary_name() -> &'static str {
    if cfg!(windows) { "ffmpeg.exe" } else { "ffmpeg" }
}

fn release_archive() -> Result<(&'static str, String), SpeechError> {
    if cfg!(all(windows, target_arch = "x86_64")) {
        Ok((WINDOWS_BUILD, format!("{}.zip", WINDOWS_BUILD)))
    } else if cfg!(all(target_os = "linux", target_arch = "x86_64")) {
        Ok((LINUX_BUILD, format!("{}.tar.xz", LINUX_BUILD)))
    } else {
        Err(SpeechError::Transcoder(
            "No prebuilt ffmpeg for this platform; place a binary in the tools directory"
                .to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_args_are_mono_16k_pcm() {
        let args = conversion_args(Path::new("in.mp4"), Path::new("in.wav"), AudioFormat::Wav);
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec![
                "-y", "-i", "in.mp4", "-c:a", "pcm_s16le", "-ar", "16000", "-ac", "1", "-vn",
                "in.wav"
            ]
        );
    }

    #[test]
    fn mp3_args_use_44k() {
        let args = conversion_args(Path::new("a.m4a"), Path::new("a.mp3"), AudioFormat::Mp3);
        let joined = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ");
        assert!(joined.contains("-ar 44100"));
        assert!(joined.ends_with("a.mp3"));
    }

    #[test]
    fn output_path_swaps_extension() {
        assert_eq!(
            output_path(Path::new("/data/standup.mkv"), AudioFormat::Mp3),
            PathBuf::from("/data/standup.mp3")
        );
    }

    #[tokio::test]
    async fn existing_binary_skips_download() {
        let dir = std::env::temp_dir().join(format!("pa-ffmpeg-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(binary_name()), b"").unwrap();
        let transcoder = FfmpegTranscoder::new(&dir, reqwest::Client::new());
        assert_eq!(transcoder.ensure_binary().await.unwrap(), dir.join(binary_name()));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
