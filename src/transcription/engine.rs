//! Transcription engine: media resolution, validation, extraction, inference

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::model::{load_model, InferenceRequest, ModelOutput, SpeechModel, TaskKind};
use super::result::{count_words, Transcript, TranscriptionResult};
use crate::audio::{needs_decoding, AudioExtractor};
use crate::config::TranscriptionConfig;
use crate::lecture::LectureRecord;
use crate::validation::validate_media_file;
use crate::{Result, TranscriptionError};

/// Steps of a single transcription call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Resolving,
    Validating,
    ExtractingAudio,
    Transcribing,
}

/// Owns the loaded model and turns lecture media into transcripts.
///
/// Build it once at startup and share it by reference (or `Arc`) with every
/// request handler. A failure on one lecture never affects the shared model.
#[derive(Clone)]
pub struct TranscriptionEngine {
    config: Arc<TranscriptionConfig>,
    model: Arc<dyn SpeechModel>,
    extractor: AudioExtractor,
}

impl TranscriptionEngine {
    /// Validate the configuration and load the configured model.
    ///
    /// Fails with a configuration error when processing is not local; callers
    /// should treat that as fatal.
    pub async fn load(config: TranscriptionConfig) -> Result<Self> {
        config.validate()?;
        let model = load_model(&config).await?;
        Self::with_model(config, model)
    }

    /// Build an engine around an already loaded model
    pub fn with_model(config: TranscriptionConfig, model: Arc<dyn SpeechModel>) -> Result<Self> {
        config.validate_local_mode()?;
        let extractor = AudioExtractor::from_config(&config);
        info!("🔧 Transcription engine ready with model {}", model.name());
        Ok(Self {
            config: Arc::new(config),
            model,
            extractor,
        })
    }

    pub fn config(&self) -> &TranscriptionConfig {
        &self.config
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Transcribe a lecture. Never fails: every error is reported through a
    /// `success == false` result.
    pub async fn transcribe(&self, lecture: &LectureRecord) -> TranscriptionResult {
        let start_time = Instant::now();
        let outcome = self.try_transcribe(lecture).await;
        self.finish(lecture, outcome, start_time.elapsed())
    }

    /// Like [`transcribe`](Self::transcribe), aborting the call once `timeout`
    /// elapses. Decoder and model child processes are killed on abort.
    pub async fn transcribe_with_timeout(
        &self,
        lecture: &LectureRecord,
        timeout: Duration,
    ) -> TranscriptionResult {
        let start_time = Instant::now();
        let outcome = match tokio::time::timeout(timeout, self.try_transcribe(lecture)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(TranscriptionError::Timeout(timeout)),
        };
        self.finish(lecture, outcome, start_time.elapsed())
    }

    /// Transcribe a lecture, returning the tagged error on failure
    pub async fn try_transcribe(&self, lecture: &LectureRecord) -> Result<Transcript> {
        debug!("{:?}: {}", PipelineStage::Resolving, lecture.label());
        let media = lecture.media_reference()?;

        debug!("{:?}: {}", PipelineStage::Validating, media.path().display());
        let file_size = validate_media_file(&self.config, media.path()).await?;

        info!(
            "🎤 Starting transcription for: {} ({:?}, {:.1} MB{})",
            lecture.label(),
            media.kind(),
            file_size as f64 / 1_000_000.0,
            lecture
                .duration_seconds
                .map(|secs| format!(", {}s", secs))
                .unwrap_or_default()
        );

        // Held until inference finishes; removed from disk when dropped
        let extracted = if media.is_video() || needs_decoding(media.path()) {
            debug!("{:?}: {}", PipelineStage::ExtractingAudio, media.path().display());
            Some(self.extractor.extract_to_temp(media.path()).await?)
        } else {
            None
        };
        let audio_path: PathBuf = match &extracted {
            Some(temp_file) => temp_file.path().to_path_buf(),
            None => media.path().to_path_buf(),
        };

        debug!("{:?}: {}", PipelineStage::Transcribing, audio_path.display());
        let request = InferenceRequest {
            audio_path,
            language: self.config.language().map(str::to_string),
            task: TaskKind::Transcribe,
            max_chunk_duration: self.config.max_chunk_duration(),
        };

        let inference_start = Instant::now();
        let output = self.run_model(request).await?;
        let inference_time = inference_start.elapsed();
        drop(extracted);

        let text = output.text.trim().to_string();
        let language = match output.language.filter(|lang| !lang.trim().is_empty()) {
            Some(language) => language,
            None => {
                debug!(
                    "Model reported no language, using default '{}'",
                    self.config.default_language()
                );
                self.config.default_language().to_string()
            }
        };

        Ok(Transcript {
            word_count: count_words(&text),
            text,
            language,
            inference_time,
            model_used: self.model.name().to_string(),
        })
    }

    /// Run the model on its own task so a panic inside it is contained
    async fn run_model(&self, request: InferenceRequest) -> Result<ModelOutput> {
        let model = Arc::clone(&self.model);
        InferenceTask(tokio::spawn(async move { model.transcribe(request).await }))
            .join()
            .await
    }

    fn finish(
        &self,
        lecture: &LectureRecord,
        outcome: Result<Transcript>,
        elapsed: Duration,
    ) -> TranscriptionResult {
        match outcome {
            Ok(transcript) => {
                info!(
                    "🎉 Transcription completed in {:.1}s: {} words, language {}",
                    transcript.inference_time.as_secs_f64(),
                    transcript.word_count,
                    transcript.language
                );
                TranscriptionResult::succeeded(transcript)
            }
            Err(e) => {
                error!(
                    "❌ Transcription failed for {} after {:.1}s: {}",
                    lecture.label(),
                    elapsed.as_secs_f64(),
                    e
                );
                TranscriptionResult::failed(
                    &e,
                    elapsed,
                    self.config.default_language(),
                    self.model.name(),
                )
            }
        }
    }
}

/// Spawned inference call, aborted if dropped before completion
struct InferenceTask(JoinHandle<Result<ModelOutput>>);

impl InferenceTask {
    async fn join(mut self) -> Result<ModelOutput> {
        match (&mut self.0).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => {
                let payload = e.into_panic();
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(TranscriptionError::Unknown(format!("Model panicked: {}", message)))
            }
            Err(e) => Err(TranscriptionError::Unknown(format!(
                "Inference task cancelled: {}",
                e
            ))),
        }
    }
}

impl Drop for InferenceTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}
