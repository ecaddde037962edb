use project_assistant::speech::transcript::{self, TranscriptionResult};
use project_assistant::speech::AudioFormat;
use std::path::Path;

#[test]
fn audio_formats() {
    assert_eq!(AudioFormat::Wav.extension(), "wav");
    assert!(AudioFormat::Wav.diarized());
    assert!(!AudioFormat::Mp3.diarized());
    assert!(AudioFormat::Mp3.matches(Path::new("/rec/Standup.MP3")));
    assert!(!AudioFormat::Mp3.matches(Path::new("/rec/standup.wav")));
}

#[test]
fn output_file_names_follow_the_stem() {
    let dir = Path::new("/out");
    assert_eq!(
        transcript::raw_path(dir, "weekly sync"),
        Path::new("/out/weekly sync RAW.md")
    );
    assert_eq!(
        transcript::prompt_path(dir, "weekly sync"),
        Path::new("/out/weekly sync GPT.md")
    );
}

#[test]
fn empty_result_renders_empty_text() {
    let result = TranscriptionResult::default();
    assert_eq!(transcript::render(&result, AudioFormat::Mp3), "");
}
