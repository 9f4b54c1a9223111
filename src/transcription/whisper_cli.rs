//! whisper.cpp command-line backend
//!
//! The binary and GGML model file are resolved once at load time. Every call
//! runs the binary against a local audio file and parses its JSON output.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error, info};

use super::model::{InferenceRequest, ModelOutput, SpeechModel, TaskKind};
use crate::config::TranscriptionConfig;
use crate::{Result, TranscriptionError};

/// Binaries probed when none is configured, fastest first
const CLI_CANDIDATES: [&str; 2] = ["whisper-cli", "whisper-cpp"];

/// Base name of the JSON file whisper.cpp writes
const OUTPUT_STEM: &str = "transcript";

/// whisper.cpp CLI with a verified model file
#[derive(Debug, Clone)]
pub struct WhisperCliModel {
    binary: String,
    model_path: PathBuf,
    use_gpu: bool,
    threads: usize,
    temp_dir: Option<PathBuf>,
    label: String,
}

impl WhisperCliModel {
    /// Resolve the model file and the whisper.cpp binary
    pub async fn load(config: &TranscriptionConfig) -> Result<Self> {
        let model_path = config.model_path();
        info!("🔍 Looking for Whisper model file: {}", model_path.display());
        match tokio::fs::metadata(&model_path).await {
            Ok(metadata) if metadata.is_file() && metadata.len() > 0 => {
                info!(
                    "✅ Found model: {} ({:.1} MB)",
                    model_path.display(),
                    metadata.len() as f64 / 1_000_000.0
                );
            }
            _ => {
                return Err(TranscriptionError::ModelLoad(format!(
                    "Model file not found: {} (download with ./models/download-ggml-model.sh {})",
                    model_path.display(),
                    config.model_size().ggml_name()
                )));
            }
        }

        let binary = match config.whisper_binary() {
            Some(binary) => binary.to_string(),
            None => Self::detect_binary().await?,
        };
        info!("✅ Using {} backend", binary);

        Ok(Self {
            binary,
            model_path,
            use_gpu: config.device().use_gpu(),
            threads: config.threads(),
            temp_dir: config.temp_dir().map(Path::to_path_buf),
            label: config.model_label(),
        })
    }

    async fn detect_binary() -> Result<String> {
        info!("🔍 Detecting available Whisper backends...");
        for candidate in CLI_CANDIDATES {
            if check_command_available(candidate).await {
                return Ok(candidate.to_string());
            }
            debug!("{} not available", candidate);
        }

        error!("❌ No Whisper backend found!");
        Err(TranscriptionError::ModelLoad(
            "No whisper.cpp binary found (tried whisper-cli, whisper-cpp)".to_string(),
        ))
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    fn command_args(&self, request: &InferenceRequest, output_base: &Path) -> Vec<String> {
        let mut args = vec![
            "-m".to_string(),
            self.model_path.to_string_lossy().to_string(),
            "-f".to_string(),
            request.audio_path.to_string_lossy().to_string(),
            "-oj".to_string(), // JSON output
            "-of".to_string(),
            output_base.to_string_lossy().to_string(),
            "-t".to_string(),
            self.threads.to_string(),
            "-np".to_string(), // No progress prints
            "-l".to_string(),
            request.language.clone().unwrap_or_else(|| "auto".to_string()),
        ];
        if request.task == TaskKind::Translate {
            args.push("-tr".to_string());
        }
        if !self.use_gpu {
            args.push("-ng".to_string());
        }
        args
    }
}

#[async_trait]
impl SpeechModel for WhisperCliModel {
    async fn transcribe(&self, request: InferenceRequest) -> Result<ModelOutput> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("whisper-out-");
        let output_dir = match &self.temp_dir {
            Some(dir) => builder.tempdir_in(dir)?,
            None => builder.tempdir()?,
        };
        let output_base = output_dir.path().join(OUTPUT_STEM);

        let args = self.command_args(&request, &output_base);
        debug!("Executing command: {} {:?}", self.binary, args);
        info!("🚀 Running {} on {}", self.binary, request.audio_path.display());

        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                TranscriptionError::Inference(format!("Failed to spawn {}: {}", self.binary, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let last_line = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
            error!("❌ {} failed with exit code: {}", self.binary, output.status);
            return Err(TranscriptionError::Inference(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                last_line.trim()
            )));
        }

        let json_path = output_base.with_extension("json");
        let json_content = tokio::fs::read_to_string(&json_path).await.map_err(|e| {
            TranscriptionError::Inference(format!(
                "No JSON output at {}: {}",
                json_path.display(),
                e
            ))
        })?;
        debug!("📊 JSON content size: {} bytes", json_content.len());

        parse_output(&json_content)
    }

    fn name(&self) -> &str {
        &self.label
    }
}

/// Subset of whisper.cpp `-oj` output
#[derive(Debug, Deserialize)]
struct CliOutput {
    #[serde(default)]
    result: Option<CliResult>,
    #[serde(default)]
    transcription: Vec<CliSegment>,
}

#[derive(Debug, Deserialize)]
struct CliResult {
    #[serde(default)]
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CliSegment {
    text: String,
}

fn parse_output(json_content: &str) -> Result<ModelOutput> {
    let output: CliOutput = serde_json::from_str(json_content).map_err(|e| {
        TranscriptionError::Inference(format!("Failed to parse whisper.cpp JSON output: {}", e))
    })?;

    let text = output
        .transcription
        .iter()
        .map(|seg| seg.text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let language = output
        .result
        .and_then(|r| r.language)
        .filter(|lang| !lang.is_empty() && lang != "auto");

    Ok(ModelOutput { text, language })
}

/// Check if a command is available
async fn check_command_available(cmd_name: &str) -> bool {
    Command::new(cmd_name)
        .arg("--help")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}
