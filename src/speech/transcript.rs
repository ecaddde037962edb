use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{AudioFormat, SpeechError};

/// Written to `<stem> GPT.md` as the follow-up prompt for producing meeting minutes.
pub const MEETING_MINUTES_PROMPT: &str = "將這份錄音文稿，整理出一份會議紀錄，說明此次會議的主題、問題處理狀況、討論的重點、代辦事項、決議或者確認事項、潛在問題或疑問、其他補充事項\r\n\r\n";

const TICKS_PER_SECOND: i64 = 10_000_000;

/// The `Transcription` result file of a batch job.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct TranscriptionResult {
    pub recognized_phrases: Vec<RecognizedPhrase>,
    pub combined_recognized_phrases: Vec<CombinedPhrase>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct RecognizedPhrase {
    pub channel: i32,
    pub speaker: i32,
    pub offset_in_ticks: i64,
    pub duration_in_ticks: i64,
    #[serde(rename = "nBest")]
    pub n_best: Vec<NBest>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct NBest {
    pub confidence: f64,
    pub display: Option<String>,
    pub sentiment: Option<Sentiment>,
}

#[derive(Deserialize, Debug, Default, Clone, Copy)]
#[serde(default)]
pub struct Sentiment {
    pub negative: f64,
    pub neutral: f64,
    pub positive: f64,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct CombinedPhrase {
    pub channel: i32,
    pub display: Option<String>,
}

/// Renders a result as text. Diarized (WAV) output is prefixed with a speaker
/// list and carries speaker headers with time ranges; MP3 output is plain text.
/// Falls back to the combined phrases when no recognized phrases exist.
pub fn render(result: &TranscriptionResult, format: AudioFormat) -> String {
    if result.recognized_phrases.is_empty() {
        return result
            .combined_recognized_phrases
            .iter()
            .map(|p| {
                format!(
                    "channel {}:\n{}\n\n",
                    p.channel,
                    p.display.as_deref().unwrap_or("").trim()
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
    }

    let mut speakers: Vec<String> = Vec::new();
    let mut lines: Vec<String> = Vec::new();

    for phrase in &result.recognized_phrases {
        let Some(best) = phrase.n_best.first() else {
            continue;
        };
        let speaker = format!("說話人 {}", phrase.speaker);
        if !speakers.contains(&speaker) {
            tracing::debug!(speaker = phrase.speaker, confidence = best.confidence, "New speaker");
            speakers.push(speaker);
        }

        let text = best.display.as_deref().unwrap_or("").trim();
        if format.diarized() {
            let start = phrase.offset_in_ticks;
            let end = start + phrase.duration_in_ticks;
            lines.push(format!(
                "說話人 {} [{}-{}]:",
                phrase.speaker,
                clock(start),
                clock(end)
            ));
            lines.push(format!("說話人{} : {}", phrase.speaker, text));
        } else {
            lines.push(text.to_string());
        }

        if let Some(s) = best.sentiment {
            lines.push(format!(
                "情感分析: 正面({:.1}%) 中性({:.1}%) 負面({:.1}%)",
                s.positive * 100.0,
                s.neutral * 100.0,
                s.negative * 100.0
            ));
        }
    }

    let body = lines.join("\n");
    if format.diarized() {
        format!("發言者清單\n{}\n\n{}", speakers.join("\n"), body)
    } else {
        body
    }
}

/// `hh:mm:ss` for a tick count (100 ns units).
pub fn clock(ticks: i64) -> String {
    let total = ticks.max(0) / TICKS_PER_SECOND;
    format!("{:02}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
}

pub fn raw_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{} RAW.md", stem))
}

pub fn prompt_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{} GPT.md", stem))
}

/// Writes `<stem> RAW.md` and `<stem> GPT.md` into `dir`.
pub async fn write_outputs(
    dir: &Path,
    stem: &str,
    transcript: &str,
) -> Result<(PathBuf, PathBuf), SpeechError> {
    tokio::fs::create_dir_all(dir).await?;
    let raw = raw_path(dir, stem);
    let prompt = prompt_path(dir, stem);
    tokio::fs::write(&raw, transcript).await?;
    tokio::fs::write(&prompt, MEETING_MINUTES_PROMPT).await?;
    Ok((raw, prompt))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TranscriptionResult {
        serde_json::from_str(
            r#"{
                "recognizedPhrases": [
                    {"channel":0,"speaker":1,"offsetInTicks":0,"durationInTicks":35000000,
                     "nBest":[{"confidence":0.91,"display":" 大家好 ",
                               "sentiment":{"negative":0.1,"neutral":0.2,"positive":0.7}}]},
                    {"channel":0,"speaker":2,"offsetInTicks":36610000000,"durationInTicks":20000000,
                     "nBest":[{"confidence":0.88,"display":"開始吧"}]},
                    {"channel":0,"speaker":1,"offsetInTicks":40000000000,"durationInTicks":0,"nBest":[]}
                ],
                "combinedRecognizedPhrases": [{"channel":0,"display":"大家好 開始吧"}]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn diarized_render_lists_speakers_and_ranges() {
        let text = render(&sample(), AudioFormat::Wav);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "發言者清單");
        assert_eq!(lines[1], "說話人 1");
        assert_eq!(lines[2], "說話人 2");
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "說話人 1 [00:00:00-00:00:03]:");
        assert_eq!(lines[5], "說話人1 : 大家好");
        assert_eq!(lines[6], "情感分析: 正面(70.0%) 中性(20.0%) 負面(10.0%)");
        assert_eq!(lines[7], "說話人 2 [01:01:01-01:01:03]:");
        assert_eq!(lines.len(), 9);
    }

    #[test]
    fn plain_render_has_text_only() {
        let text = render(&sample(), AudioFormat::Mp3);
        assert!(text.starts_with("大家好\n情感分析"));
        assert!(!text.contains("發言者清單"));
        assert!(text.ends_with("開始吧"));
    }

    #[test]
    fn falls_back_to_combined_phrases() {
        let result = TranscriptionResult {
            recognized_phrases: vec![],
            ..sample()
        };
        assert_eq!(render(&result, AudioFormat::Wav), "channel 0:\n大家好 開始吧\n\n");
    }

    #[test]
    fn clock_formats_hours() {
        assert_eq!(clock(0), "00:00:00");
        assert_eq!(clock(TICKS_PER_SECOND * 3725), "01:02:05");
        assert_eq!(clock(-5), "00:00:00");
    }

    #[tokio::test]
    async fn writes_raw_and_prompt_files() {
        let dir = std::env::temp_dir().join(format!("pa-transcript-{}", uuid::Uuid::new_v4()));
        let (raw, prompt) = write_outputs(&dir, "standup", "hello").await.unwrap();
        assert_eq!(raw.file_name().unwrap(), "standup RAW.md");
        assert_eq!(std::fs::read_to_string(&raw).unwrap(), "hello");
        assert_eq!(std::fs::read_to_string(&prompt).unwrap(), MEETING_MINUTES_PROMPT);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
