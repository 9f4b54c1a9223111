//! The speech model seam and backend loading

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::{ModelBackend, TranscriptionConfig};
use crate::Result;

/// What the model is asked to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Text in the spoken language
    Transcribe,
    /// Text translated to English
    Translate,
}

/// One inference call against a loaded model
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    /// Audio file on local disk
    pub audio_path: PathBuf,
    /// Language hint; None lets the model detect it
    pub language: Option<String>,
    pub task: TaskKind,
    /// Longest audio window handed to the model in one pass
    pub max_chunk_duration: Duration,
}

/// Raw model output before result shaping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelOutput {
    pub text: String,
    /// Language reported by the model, if any
    pub language: Option<String>,
}

/// A speech model loaded once and shared by every transcription call.
///
/// Implementations must tolerate concurrent `transcribe` calls.
#[async_trait]
pub trait SpeechModel: Send + Sync + 'static {
    async fn transcribe(&self, request: InferenceRequest) -> Result<ModelOutput>;

    /// Human-readable backend name
    fn name(&self) -> &str;
}

/// Load the backend selected by `config`
pub async fn load_model(config: &TranscriptionConfig) -> Result<Arc<dyn SpeechModel>> {
    info!(
        "🧠 Loading {:?} model {} ({}, {})",
        config.backend(),
        config.model_size(),
        config.device(),
        config.precision()
    );

    match config.backend() {
        ModelBackend::WhisperCli => {
            let model = super::whisper_cli::WhisperCliModel::load(config).await?;
            Ok(Arc::new(model))
        }
        #[cfg(feature = "local-whisper")]
        ModelBackend::LocalWhisper => {
            let model = super::local_whisper::LocalWhisperModel::load(config).await?;
            Ok(Arc::new(model))
        }
        #[cfg(not(feature = "local-whisper"))]
        ModelBackend::LocalWhisper => Err(crate::TranscriptionError::Configuration(
            "local-whisper backend requires building with the `local-whisper` feature".to_string(),
        )),
    }
}
