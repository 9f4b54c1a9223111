use anyhow::{Context, Result};
use clap::{Arg, ArgGroup, Command};
use lecture_transcriber::{LectureRecord, TranscriptionConfig, TranscriptionEngine, TranscriptionPool};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("lecture-transcriber")
        .version("0.1.0")
        .author("TigreRoll")
        .about("Transcribe lecture recordings with a local Whisper model")
        .arg(
            Arg::new("audio")
                .short('a')
                .long("audio")
                .value_name("FILE")
                .help("Audio recording of the lecture")
        )
        .arg(
            Arg::new("video")
                .short('m')
                .long("video")
                .value_name("FILE")
                .help("Video recording of the lecture (audio is extracted with ffmpeg)")
        )
        .arg(
            Arg::new("batch")
                .short('b')
                .long("batch")
                .value_name("FILE")
                .help("JSON file with an array of lecture records")
        )
        .group(
            ArgGroup::new("input")
                .args(["audio", "video", "batch"])
                .required(true)
        )
        .arg(
            Arg::new("id")
                .long("id")
                .value_name("ID")
                .help("Lecture identifier used in logs")
        )
        .arg(
            Arg::new("duration")
                .long("duration")
                .value_name("SECONDS")
                .help("Reported lecture length (informational)")
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("TOML configuration file (defaults to standard locations, then environment)")
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECONDS")
                .help("Per-lecture timeout, 0 for none (overrides configuration)")
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Write the JSON result to this file instead of stdout")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue)
        )
        .get_matches();

    // Configure logging based on verbose flag
    if matches.get_flag("verbose") {
        tracing_subscriber::fmt()
            .with_target(true)
            .with_env_filter("lecture_transcriber=debug,info")
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_target(false)
            .with_env_filter("lecture_transcriber=info,warn")
            .with_writer(std::io::stderr)
            .init();
    }

    // Load configuration
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => TranscriptionConfig::from_file(&PathBuf::from(path))?,
        None => TranscriptionConfig::load()?,
    };
    if let Some(timeout) = matches.get_one::<String>("timeout") {
        let secs: u64 = timeout.parse().context("--timeout must be a number of seconds")?;
        config = config.with_timeout((secs > 0).then(|| Duration::from_secs(secs)));
    }

    // Non-local processing is fatal
    if let Err(e) = config.validate() {
        error!("❌ Refusing to start: {}", e);
        return Err(e.into());
    }

    info!("🚀 Lecture Transcriber starting...");
    for line in config.summary().lines() {
        info!("{}", line);
    }

    let engine = Arc::new(TranscriptionEngine::load(config).await?);
    let pool = TranscriptionPool::new(Arc::clone(&engine));

    let (json, failures) = if let Some(batch_file) = matches.get_one::<String>("batch") {
        let content = tokio::fs::read_to_string(batch_file)
            .await
            .with_context(|| format!("Cannot read batch file {}", batch_file))?;
        let lectures: Vec<LectureRecord> = serde_json::from_str(&content)
            .with_context(|| format!("Invalid lecture records in {}", batch_file))?;

        let summary = pool.transcribe_batch(lectures).await;
        info!("📊 Success rate: {:.1}%",
            if summary.total > 0 {
                summary.successful as f64 / summary.total as f64 * 100.0
            } else {
                0.0
            }
        );
        (serde_json::to_string_pretty(&summary)?, summary.failed)
    } else {
        let mut lecture = match (matches.get_one::<String>("audio"), matches.get_one::<String>("video")) {
            (Some(audio), _) => LectureRecord::audio(audio),
            (None, Some(video)) => LectureRecord::video(video),
            (None, None) => unreachable!("clap enforces an input"),
        };
        if let Some(id) = matches.get_one::<String>("id") {
            lecture = lecture.with_id(id.as_str());
        }
        if let Some(duration) = matches.get_one::<String>("duration") {
            lecture = lecture.with_duration(duration.parse().context("--duration must be a number of seconds")?);
        }

        let result = pool.transcribe(&lecture).await;
        let failures = usize::from(!result.success());
        (serde_json::to_string_pretty(&result)?, failures)
    };

    match matches.get_one::<String>("output") {
        Some(path) => {
            tokio::fs::write(path, &json).await?;
            info!("💾 Result saved to: {}", path);
        }
        None => println!("{}", json),
    }

    if failures > 0 {
        warn!("⚠️  {} lecture(s) failed transcription. Check logs for details.", failures);
        std::process::exit(1);
    }

    Ok(())
}
