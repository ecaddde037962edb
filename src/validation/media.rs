use std::path::Path;

use crate::error::AppError;

/// Audio and video containers the transcoder accepts.
pub const MEDIA_EXTENSIONS: &[&str] = &[
    // audio
    "mp3", "aac", "ogg", "wma", "m4a", "flac", "ape", "aiff", "wav",
    // video
    "mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "3gp", "m4v", "ts", "mts", "m2ts",
];

pub fn media_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| MEDIA_EXTENSIONS.contains(&e.as_str()))
}

pub fn is_media_file(path: &Path) -> bool {
    media_extension(path).is_some()
}

/// Checks an uploaded file name and returns its normalized extension.
pub fn validate_upload_file_name(file_name: &str) -> Result<String, AppError> {
    let trimmed = file_name.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("File name is required"));
    }
    // 只保留文件名部分,防止路径穿越
    let base = Path::new(trimmed)
        .file_name()
        .ok_or_else(|| AppError::validation("Invalid file name"))?;
    media_extension(Path::new(base)).ok_or_else(|| {
        AppError::validation(format!(
            "Unsupported file type. Accepted: {}",
            MEDIA_EXTENSIONS.join(", ")
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_are_case_insensitive() {
        assert_eq!(media_extension(Path::new("a/b/Meeting.MP3")).as_deref(), Some("mp3"));
        assert_eq!(media_extension(Path::new("clip.m2ts")).as_deref(), Some("m2ts"));
        assert!(!is_media_file(Path::new("notes.txt")));
        assert!(!is_media_file(Path::new("noextension")));
    }

    #[test]
    fn upload_names() {
        assert_eq!(validate_upload_file_name("standup.wav").unwrap(), "wav");
        assert!(validate_upload_file_name("  ").is_err());
        assert!(validate_upload_file_name("report.pdf").is_err());
        assert_eq!(validate_upload_file_name("../../etc/rec.mp4").unwrap(), "mp4");
    }
}
