//! Transcription configuration
//!
//! Read once at startup from a TOML file or the environment and never mutated
//! afterwards. The engine refuses to start unless processing is local.

use crate::{Result, TranscriptionError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// The only processing mode the engine accepts
pub const LOCAL_PROCESSING_MODE: &str = "local";

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Whisper model size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ModelSize {
    Tiny,
    Base,
    Small,
    Medium,
    Large,
}

impl ModelSize {
    /// Model name as used in whisper.cpp GGML file names
    pub fn ggml_name(self) -> &'static str {
        match self {
            Self::Tiny => "tiny",
            Self::Base => "base",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large-v3",
        }
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tiny => "tiny",
            Self::Base => "base",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        };
        f.write_str(name)
    }
}

impl FromStr for ModelSize {
    type Err = TranscriptionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "tiny" => Ok(Self::Tiny),
            "base" => Ok(Self::Base),
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" | "large-v3" => Ok(Self::Large),
            other => Err(TranscriptionError::Configuration(format!(
                "Unknown model size '{}'",
                other
            ))),
        }
    }
}

/// Compute device for inference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ComputeDevice {
    Cpu,
    Gpu,
}

impl ComputeDevice {
    pub fn use_gpu(self) -> bool {
        matches!(self, Self::Gpu)
    }
}

impl fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cpu => "cpu",
            Self::Gpu => "gpu",
        })
    }
}

impl FromStr for ComputeDevice {
    type Err = TranscriptionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "gpu" | "cuda" => Ok(Self::Gpu),
            other => Err(TranscriptionError::Configuration(format!(
                "Unknown compute device '{}'",
                other
            ))),
        }
    }
}

/// Numeric precision of the model weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ComputePrecision {
    Int8,
    Float16,
    Float32,
}

impl ComputePrecision {
    /// Suffix of the matching whisper.cpp model file (f16 weights carry none)
    pub fn ggml_suffix(self) -> &'static str {
        match self {
            Self::Int8 => "-q8_0",
            Self::Float16 => "",
            Self::Float32 => "-f32",
        }
    }
}

impl fmt::Display for ComputePrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Int8 => "int8",
            Self::Float16 => "float16",
            Self::Float32 => "float32",
        })
    }
}

impl FromStr for ComputePrecision {
    type Err = TranscriptionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "int8" => Ok(Self::Int8),
            "float16" | "fp16" => Ok(Self::Float16),
            "float32" | "fp32" => Ok(Self::Float32),
            other => Err(TranscriptionError::Configuration(format!(
                "Unknown compute precision '{}'",
                other
            ))),
        }
    }
}

/// Inference backend used to run the Whisper model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum ModelBackend {
    /// whisper.cpp command-line binary, one child process per call
    WhisperCli,
    /// whisper.cpp linked in-process (requires the `local-whisper` feature)
    LocalWhisper,
}

impl FromStr for ModelBackend {
    type Err = TranscriptionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "whisper-cli" | "cli" => Ok(Self::WhisperCli),
            "local-whisper" | "whisper-rs" => Ok(Self::LocalWhisper),
            other => Err(TranscriptionError::Configuration(format!(
                "Unknown model backend '{}'",
                other
            ))),
        }
    }
}

/// Config files accept the same spellings as the environment
macro_rules! parse_via_from_str {
    ($($name:ty),+) => {
        $(
            impl TryFrom<String> for $name {
                type Error = TranscriptionError;

                fn try_from(value: String) -> Result<Self> {
                    value.parse()
                }
            }
        )+
    };
}

parse_via_from_str!(ModelSize, ComputeDevice, ComputePrecision, ModelBackend);

/// Configuration for transcription operations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Must be "local"; anything else is a fatal startup error
    processing_mode: String,

    /// Must stay unset; media is never uploaded anywhere
    remote_endpoint: Option<String>,

    /// Whisper model: "tiny", "base", "small", "medium", "large"
    model_size: ModelSize,

    device: ComputeDevice,

    precision: ComputePrecision,

    backend: ModelBackend,

    /// Maximum accepted upload size in bytes
    max_file_size_bytes: u64,

    /// Longest audio window handed to the model in one pass (seconds)
    max_chunk_duration_secs: u64,

    /// Lowercase extensions without the leading dot
    allowed_extensions: BTreeSet<String>,

    /// Language hint (None for auto-detect)
    language: Option<String>,

    /// Reported when the model does not detect a language
    default_language: String,

    /// Directory holding GGML model files
    model_dir: PathBuf,

    /// Explicit whisper.cpp binary; auto-detected when unset
    whisper_binary: Option<String>,

    ffmpeg_binary: String,

    /// Directory for extracted audio; system temp dir when unset
    temp_dir: Option<PathBuf>,

    /// Threads per inference call
    threads: usize,

    /// Concurrent transcriptions in a pool
    workers: usize,

    /// Per-lecture timeout in seconds (0 = no limit)
    timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            processing_mode: LOCAL_PROCESSING_MODE.to_string(),
            remote_endpoint: None,
            model_size: ModelSize::Base,
            device: ComputeDevice::Cpu,
            precision: ComputePrecision::Int8,
            backend: ModelBackend::WhisperCli,
            max_file_size_bytes: 500 * BYTES_PER_MB,
            max_chunk_duration_secs: 600, // 10 minutes
            allowed_extensions: ["mp3", "wav", "m4a", "ogg", "flac", "webm", "mp4", "mov", "avi"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            language: None,
            default_language: "en".to_string(),
            model_dir: PathBuf::from("models"),
            whisper_binary: None,
            ffmpeg_binary: "ffmpeg".to_string(),
            temp_dir: None,
            threads: 4,
            workers: num_cpus::get().min(8), // Use available cores, max 8
            timeout_secs: 3600,              // 60 minutes for long lectures
        }
    }
}

impl TranscriptionConfig {
    /// Create new transcription config
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the first config file found, then the environment
    pub fn load() -> Result<Self> {
        let config_paths = [
            "lecture-transcriber.toml",
            "config/lecture-transcriber.toml",
            "/etc/lecture-transcriber/config.toml",
        ];

        for path in &config_paths {
            let path = Path::new(path);
            if path.exists() {
                let config = Self::from_file(path)?;
                tracing::info!("📄 Loaded configuration from: {}", path.display());
                return Ok(config);
            }
        }

        Self::from_env()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path).map_err(|e| {
            TranscriptionError::Configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&config_str).map_err(|e| match e {
            TranscriptionError::Configuration(msg) => {
                TranscriptionError::Configuration(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(config_str)
            .map_err(|e| TranscriptionError::Configuration(e.to_string()))?;
        config.allowed_extensions = normalize_extensions(config.allowed_extensions.iter());
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from defaults overridden by `lookup(key)` values
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(mode) = lookup("TRANSCRIPTION_PROCESSING_MODE") {
            config.processing_mode = mode.trim().to_string();
        }
        if let Some(endpoint) = lookup("TRANSCRIPTION_REMOTE_ENDPOINT") {
            if !endpoint.trim().is_empty() {
                config.remote_endpoint = Some(endpoint.trim().to_string());
            }
        }
        if let Some(size) = lookup("WHISPER_MODEL_SIZE") {
            config.model_size = size.parse()?;
        }
        if let Some(device) = lookup("WHISPER_DEVICE") {
            config.device = device.parse()?;
        }
        if let Some(precision) = lookup("WHISPER_COMPUTE_TYPE") {
            config.precision = precision.parse()?;
        }
        if let Some(backend) = lookup("TRANSCRIPTION_BACKEND") {
            config.backend = backend.parse()?;
        }
        if let Some(max_mb) = lookup("MAX_AUDIO_FILE_SIZE_MB") {
            config.max_file_size_bytes = parse_number::<u64>("MAX_AUDIO_FILE_SIZE_MB", &max_mb)?
                .saturating_mul(BYTES_PER_MB);
        }
        if let Some(secs) = lookup("MAX_CHUNK_DURATION_SECONDS") {
            config.max_chunk_duration_secs = parse_number("MAX_CHUNK_DURATION_SECONDS", &secs)?;
        }
        if let Some(formats) = lookup("ALLOWED_AUDIO_FORMATS") {
            config.allowed_extensions = normalize_extensions(formats.split(','));
        }
        if let Some(language) = lookup("TRANSCRIPTION_LANGUAGE") {
            let language = language.trim();
            config.language = if language.is_empty() || language.eq_ignore_ascii_case("auto") {
                None
            } else {
                Some(language.to_string())
            };
        }
        if let Some(language) = lookup("TRANSCRIPTION_DEFAULT_LANGUAGE") {
            config.default_language = language.trim().to_string();
        }
        if let Some(dir) = lookup("WHISPER_MODEL_DIR") {
            config.model_dir = PathBuf::from(dir);
        }
        if let Some(binary) = lookup("WHISPER_BINARY") {
            config.whisper_binary = Some(binary);
        }
        if let Some(binary) = lookup("FFMPEG_BINARY") {
            config.ffmpeg_binary = binary;
        }
        if let Some(dir) = lookup("TRANSCRIPTION_TEMP_DIR") {
            config.temp_dir = Some(PathBuf::from(dir));
        }
        if let Some(threads) = lookup("TRANSCRIPTION_THREADS") {
            config.threads = parse_number("TRANSCRIPTION_THREADS", &threads)?;
        }
        if let Some(workers) = lookup("TRANSCRIPTION_WORKERS") {
            config.workers = parse_number("TRANSCRIPTION_WORKERS", &workers)?;
        }
        if let Some(timeout) = lookup("TRANSCRIPTION_TIMEOUT_SECONDS") {
            config.timeout_secs = parse_number("TRANSCRIPTION_TIMEOUT_SECONDS", &timeout)?;
        }

        Ok(config)
    }

    /// Fail unless every transcription stays on this host.
    pub fn validate_local_mode(&self) -> Result<()> {
        if !self.processing_mode.eq_ignore_ascii_case(LOCAL_PROCESSING_MODE) {
            return Err(TranscriptionError::Configuration(format!(
                "Processing mode must be '{}', found '{}'",
                LOCAL_PROCESSING_MODE, self.processing_mode
            )));
        }
        if let Some(endpoint) = &self.remote_endpoint {
            return Err(TranscriptionError::Configuration(format!(
                "Remote transcription endpoint configured ({}); only local processing is allowed",
                endpoint
            )));
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.validate_local_mode()?;

        if self.max_file_size_bytes == 0 {
            return Err(TranscriptionError::Configuration(
                "max_file_size_bytes must be greater than 0".to_string(),
            ));
        }
        if self.allowed_extensions.is_empty() {
            return Err(TranscriptionError::Configuration(
                "allowed_extensions must not be empty".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(TranscriptionError::Configuration(
                "workers must be greater than 0".to_string(),
            ));
        }
        if self.threads == 0 {
            return Err(TranscriptionError::Configuration(
                "threads must be greater than 0".to_string(),
            ));
        }

        tracing::info!("✅ Configuration validation passed");
        Ok(())
    }

    /// Whether the file's extension is accepted (case-insensitive)
    pub fn validate_file_format(&self, filename: &str) -> bool {
        Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.allowed_extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    /// Whether a file of `byte_count` bytes fits under the ceiling
    pub fn validate_file_size(&self, byte_count: u64) -> bool {
        byte_count <= self.max_file_size_bytes
    }

    pub fn processing_mode(&self) -> &str {
        &self.processing_mode
    }

    pub fn model_size(&self) -> ModelSize {
        self.model_size
    }

    pub fn device(&self) -> ComputeDevice {
        self.device
    }

    pub fn precision(&self) -> ComputePrecision {
        self.precision
    }

    pub fn backend(&self) -> ModelBackend {
        self.backend
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_bytes
    }

    pub fn max_chunk_duration(&self) -> Duration {
        Duration::from_secs(self.max_chunk_duration_secs)
    }

    pub fn allowed_extensions(&self) -> &BTreeSet<String> {
        &self.allowed_extensions
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// GGML file name for the configured size and precision
    pub fn model_file_name(&self) -> String {
        format!(
            "ggml-{}{}.bin",
            self.model_size.ggml_name(),
            self.precision.ggml_suffix()
        )
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(self.model_file_name())
    }

    /// Label recorded in results, e.g. "whisper-base-int8"
    pub fn model_label(&self) -> String {
        format!("whisper-{}-{}", self.model_size, self.precision)
    }

    pub fn whisper_binary(&self) -> Option<&str> {
        self.whisper_binary.as_deref()
    }

    pub fn ffmpeg_binary(&self) -> &str {
        &self.ffmpeg_binary
    }

    pub fn temp_dir(&self) -> Option<&Path> {
        self.temp_dir.as_deref()
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Per-lecture timeout, None when unlimited
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn with_processing_mode(mut self, mode: &str) -> Self {
        self.processing_mode = mode.to_string();
        self
    }

    pub fn with_remote_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.remote_endpoint = endpoint;
        self
    }

    pub fn with_model_size(mut self, size: ModelSize) -> Self {
        self.model_size = size;
        self
    }

    pub fn with_device(mut self, device: ComputeDevice) -> Self {
        self.device = device;
        self
    }

    pub fn with_precision(mut self, precision: ComputePrecision) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_backend(mut self, backend: ModelBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size_bytes = bytes;
        self
    }

    pub fn with_max_chunk_duration(mut self, duration: Duration) -> Self {
        self.max_chunk_duration_secs = duration.as_secs();
        self
    }

    pub fn with_allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_extensions = normalize_extensions(extensions);
        self
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    pub fn with_default_language(mut self, language: &str) -> Self {
        self.default_language = language.to_string();
        self
    }

    pub fn with_model_dir(mut self, dir: PathBuf) -> Self {
        self.model_dir = dir;
        self
    }

    pub fn with_whisper_binary(mut self, binary: Option<String>) -> Self {
        self.whisper_binary = binary;
        self
    }

    pub fn with_ffmpeg_binary(mut self, binary: &str) -> Self {
        self.ffmpeg_binary = binary.to_string();
        self
    }

    pub fn with_temp_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.temp_dir = dir;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout_secs = timeout.map(|t| t.as_secs()).unwrap_or(0);
        self
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Lecture Transcriber Configuration:\n\
            - Processing Mode: {}\n\
            - Backend: {:?}\n\
            - Model: {} ({}, {})\n\
            - Model File: {}\n\
            - Max File Size: {} MB\n\
            - Max Chunk Duration: {}s\n\
            - Allowed Extensions: {}\n\
            - Workers: {}",
            self.processing_mode,
            self.backend,
            self.model_size,
            self.device,
            self.precision,
            self.model_path().display(),
            self.max_file_size_bytes / BYTES_PER_MB,
            self.max_chunk_duration_secs,
            self.allowed_extensions.iter().cloned().collect::<Vec<_>>().join(", "),
            self.workers
        )
    }
}

fn normalize_extensions<I, S>(extensions: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    extensions
        .into_iter()
        .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        TranscriptionError::Configuration(format!("{} must be a number, found '{}'", key, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = TranscriptionConfig::default();
        assert_eq!(config.processing_mode(), "local");
        assert_eq!(config.model_size(), ModelSize::Base);
        assert_eq!(config.device(), ComputeDevice::Cpu);
        assert_eq!(config.precision(), ComputePrecision::Int8);
        assert_eq!(config.max_file_size_bytes(), 500 * 1024 * 1024);
        assert!(config.allowed_extensions().contains("wav"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_local_mode_rejects_cloud() {
        let config = TranscriptionConfig::default().with_processing_mode("cloud");
        let err = config.validate_local_mode().unwrap_err();
        assert!(matches!(err, TranscriptionError::Configuration(_)));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_local_mode_rejects_remote_endpoint() {
        let config = TranscriptionConfig::default()
            .with_remote_endpoint(Some("https://api.example.com/v1/audio".to_string()));
        assert!(config.validate_local_mode().is_err());
    }

    #[test]
    fn test_validate_local_mode_is_case_insensitive() {
        let config = TranscriptionConfig::default().with_processing_mode("LOCAL");
        tokio_test::assert_ok!(config.validate_local_mode());
    }

    #[test]
    fn test_validate_file_format() {
        let config = TranscriptionConfig::default().with_allowed_extensions(["mp3", "wav", "mp4"]);
        assert!(config.validate_file_format("lecture.wav"));
        assert!(config.validate_file_format("LECTURE.MP4"));
        assert!(config.validate_file_format("/srv/media/week1.Mp3"));
        assert!(!config.validate_file_format("lecture.mkv"));
        assert!(!config.validate_file_format("lecture"));
    }

    #[test]
    fn test_validate_file_size_boundary() {
        let config = TranscriptionConfig::default().with_max_file_size(1000);
        assert!(config.validate_file_size(0));
        assert!(config.validate_file_size(1000));
        assert!(!config.validate_file_size(1001));
    }

    #[test]
    fn test_allowed_extensions_are_normalized() {
        let config = TranscriptionConfig::default().with_allowed_extensions([".WAV", " mp3 ", ""]);
        let exts: Vec<&str> = config.allowed_extensions().iter().map(|s| s.as_str()).collect();
        assert_eq!(exts, vec!["mp3", "wav"]);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = TranscriptionConfig::from_lookup(lookup_from(&[
            ("WHISPER_MODEL_SIZE", "small"),
            ("WHISPER_DEVICE", "gpu"),
            ("WHISPER_COMPUTE_TYPE", "float16"),
            ("MAX_AUDIO_FILE_SIZE_MB", "200"),
            ("MAX_CHUNK_DURATION_SECONDS", "120"),
            ("ALLOWED_AUDIO_FORMATS", "mp3, WAV,.mp4"),
            ("TRANSCRIPTION_LANGUAGE", "auto"),
            ("TRANSCRIPTION_WORKERS", "2"),
        ]))
        .unwrap();

        assert_eq!(config.model_size(), ModelSize::Small);
        assert!(config.device().use_gpu());
        assert_eq!(config.precision(), ComputePrecision::Float16);
        assert_eq!(config.max_file_size_bytes(), 200 * 1024 * 1024);
        assert_eq!(config.max_chunk_duration(), Duration::from_secs(120));
        assert_eq!(config.allowed_extensions().len(), 3);
        assert!(config.validate_file_format("talk.wav"));
        assert_eq!(config.language(), None);
        assert_eq!(config.workers(), 2);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let err = TranscriptionConfig::from_lookup(lookup_from(&[("WHISPER_DEVICE", "tpu")]))
            .unwrap_err();
        assert!(matches!(err, TranscriptionError::Configuration(_)));

        let err = TranscriptionConfig::from_lookup(lookup_from(&[("MAX_AUDIO_FILE_SIZE_MB", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("MAX_AUDIO_FILE_SIZE_MB"));
    }

    #[test]
    fn test_from_lookup_remote_endpoint_fails_validation() {
        let config = TranscriptionConfig::from_lookup(lookup_from(&[(
            "TRANSCRIPTION_REMOTE_ENDPOINT",
            "https://transcribe.example.com",
        )]))
        .unwrap();
        assert!(config.validate_local_mode().is_err());
    }

    #[test]
    fn test_from_toml() {
        let config = TranscriptionConfig::from_toml_str(
            r#"
            model_size = "medium"
            precision = "float32"
            backend = "whisper-cli"
            allowed_extensions = ["MP3", "wav"]
            "#,
        )
        .unwrap();

        assert_eq!(config.model_size(), ModelSize::Medium);
        assert_eq!(config.model_file_name(), "ggml-medium-f32.bin");
        assert!(config.validate_file_format("a.mp3"));
        // Unset fields keep their defaults
        assert_eq!(config.processing_mode(), "local");
    }

    #[test]
    fn test_from_toml_accepts_environment_spellings() {
        let config = TranscriptionConfig::from_toml_str(
            r#"
            model_size = "large-v3"
            device = "CUDA"
            precision = "fp16"
            backend = "cli"
            "#,
        )
        .unwrap();

        assert_eq!(config.model_size(), ModelSize::Large);
        assert_eq!(config.device(), ComputeDevice::Gpu);
        assert_eq!(config.precision(), ComputePrecision::Float16);
        assert_eq!(config.backend(), ModelBackend::WhisperCli);

        let err = TranscriptionConfig::from_toml_str(r#"model_size = "huge""#).unwrap_err();
        assert!(err.to_string().contains("Unknown model size"));
    }

    #[test]
    fn test_model_file_naming() {
        let config = TranscriptionConfig::default()
            .with_model_size(ModelSize::Large)
            .with_precision(ComputePrecision::Float16)
            .with_model_dir(PathBuf::from("/opt/models"));
        assert_eq!(config.model_path(), PathBuf::from("/opt/models/ggml-large-v3.bin"));
        assert_eq!(config.model_label(), "whisper-large-float16");
    }

    #[test]
    fn test_timeout_zero_means_unlimited() {
        let config = TranscriptionConfig::default().with_timeout(None);
        assert_eq!(config.timeout(), None);
        let config = config.with_timeout(Some(Duration::from_secs(30)));
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
    }
}
