//! Audio extraction through an external ffmpeg process

use crate::config::TranscriptionConfig;
use crate::{Result, TranscriptionError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Whisper expects 16 kHz mono input
pub const TARGET_SAMPLE_RATE: u32 = 16000;

/// Lines of decoder stderr kept in error messages
const STDERR_TAIL_LINES: usize = 5;

/// Audio containers whisper.cpp reads directly; anything else is decoded first
pub const NATIVE_AUDIO_FORMATS: [&str; 3] = ["wav", "mp3", "flac"];

/// Whether an audio file must go through ffmpeg before inference
pub fn needs_decoding(audio_path: &Path) -> bool {
    let extension = audio_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());
    match extension {
        Some(ext) => !NATIVE_AUDIO_FORMATS.contains(&ext.as_str()),
        None => true,
    }
}

/// Extracts transcription-ready audio from lecture media
#[derive(Debug, Clone)]
pub struct AudioExtractor {
    ffmpeg_binary: String,
    target_sample_rate: u32,
    temp_dir: Option<PathBuf>,
}

impl Default for AudioExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioExtractor {
    /// Create new audio extractor with optimal settings for Whisper
    pub fn new() -> Self {
        Self {
            ffmpeg_binary: "ffmpeg".to_string(),
            target_sample_rate: TARGET_SAMPLE_RATE,
            temp_dir: None,
        }
    }

    pub fn from_config(config: &TranscriptionConfig) -> Self {
        Self {
            ffmpeg_binary: config.ffmpeg_binary().to_string(),
            target_sample_rate: TARGET_SAMPLE_RATE,
            temp_dir: config.temp_dir().map(Path::to_path_buf),
        }
    }

    pub fn ffmpeg_binary(&self) -> &str {
        &self.ffmpeg_binary
    }

    pub fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    /// ffmpeg arguments producing mono 16-bit PCM WAV at the target rate
    pub fn extraction_args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-i".into(), input.into()];
        args.extend(
            [
                "-vn", // No video stream
                "-acodec",
                "pcm_s16le", // 16-bit PCM
                "-ar",
                &self.target_sample_rate.to_string(),
                "-ac",
                "1", // Mono channel
                "-f",
                "wav",
                "-y", // Overwrite existing
            ]
            .into_iter()
            .map(OsString::from),
        );
        args.push(output.into());
        args
    }

    /// Extract the audio track of `media_path` (a video, or audio in a
    /// container the model cannot read) into a uniquely named temporary WAV
    /// file. The file is deleted when the returned handle is dropped, so a
    /// failed extraction never leaves partial output behind.
    pub async fn extract_to_temp(&self, media_path: &Path) -> Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("lecture-audio-").suffix(".wav");
        let temp_file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        info!("🎵 Extracting audio for transcription: {}", media_path.display());
        debug!("Extraction target: {}", temp_file.path().display());

        let output = Command::new(&self.ffmpeg_binary)
            .args(self.extraction_args(media_path, temp_file.path()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                TranscriptionError::MediaExtraction(format!(
                    "Failed to launch {}: {}",
                    self.ffmpeg_binary, e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                "❌ Audio extraction failed for {} ({})",
                media_path.display(),
                output.status
            );
            return Err(TranscriptionError::MediaExtraction(format!(
                "{} exited with {} for {}: {}",
                self.ffmpeg_binary,
                output.status,
                media_path.display(),
                stderr_tail(&stderr)
            )));
        }

        let extracted_size = tokio::fs::metadata(temp_file.path()).await?.len();
        if extracted_size == 0 {
            return Err(TranscriptionError::MediaExtraction(format!(
                "No audio extracted from {}",
                media_path.display()
            )));
        }

        info!(
            "✅ Audio extracted: {:.1} MB",
            extracted_size as f64 / 1_000_000.0
        );
        Ok(temp_file)
    }

    /// Decode any media file to mono f32 samples at the target rate
    pub async fn decode_pcm_f32(&self, path: &Path) -> Result<Vec<f32>> {
        let output = Command::new(&self.ffmpeg_binary)
            .arg("-i")
            .arg(path)
            .args([
                "-vn",
                "-f",
                "f32le",
                "-acodec",
                "pcm_f32le",
                "-ar",
                &self.target_sample_rate.to_string(),
                "-ac",
                "1",
                "-",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                TranscriptionError::MediaExtraction(format!(
                    "Failed to launch {}: {}",
                    self.ffmpeg_binary, e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscriptionError::MediaExtraction(format!(
                "Decoding {} failed with {}: {}",
                path.display(),
                output.status,
                stderr_tail(&stderr)
            )));
        }

        let samples: Vec<f32> = output
            .stdout
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        debug!(
            "Decoded {} samples ({:.1}s) from {}",
            samples.len(),
            samples.len() as f64 / self.target_sample_rate as f64,
            path.display()
        );
        Ok(samples)
    }

    /// Check whether the decoder binary can be launched
    pub async fn check_available(&self) -> bool {
        Command::new(&self.ffmpeg_binary)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join(" | ")
}
