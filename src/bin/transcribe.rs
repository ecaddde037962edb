use clap::{Arg, ArgAction, Command};
use project_assistant::{
    config::Config,
    init_tracing,
    speech::{AudioFormat, SpeechPipeline},
};
use std::path::PathBuf;
use std::time::Instant;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("transcribe")
        .about("Convert and transcribe every recording in a directory")
        .arg(
            Arg::new("dir")
                .long("dir")
                .short('d')
                .value_name("DIR")
                .value_parser(clap::value_parser!(PathBuf))
                .required(true)
                .help("Directory holding the recordings"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .value_parser(clap::value_parser!(AudioFormat))
                .default_value("wav")
                .help("Target audio format; wav enables speaker diarization"),
        )
        .arg(
            Arg::new("skip-convert")
                .long("skip-convert")
                .action(ArgAction::SetTrue)
                .help("Transcribe files already in the target format without running ffmpeg"),
        )
        .get_matches();

    let dir = matches
        .get_one::<PathBuf>("dir")
        .cloned()
        .ok_or("--dir is required")?;
    let format = matches
        .get_one::<AudioFormat>("format")
        .copied()
        .unwrap_or(AudioFormat::Wav);
    let skip_convert = matches.get_flag("skip-convert");

    let config = Config::from_env()?;
    init_tracing(&config);

    let speech = config
        .speech()
        .ok_or("AZURE_SPEECH_KEY and AZURE_SPEECH_REGION must be set")?;
    let storage = config
        .storage()
        .ok_or("AZURE_STORAGE_CONNECTION_STRING must be set")?;
    let pipeline = SpeechPipeline::from_config(&speech, &storage, reqwest::Client::new())?;

    let started = Instant::now();
    tracing::info!(dir = %dir.display(), format = format.extension(), skip_convert, "Starting");
    let outputs = pipeline.run_directory(&dir, format, skip_convert).await?;
    for output in &outputs {
        println!("{}", output.raw_path.display());
    }
    tracing::info!(
        files = outputs.len(),
        elapsed = %project_assistant::speech::pipeline::format_elapsed(started.elapsed()),
        "Done"
    );
    Ok(())
}
