//! In-process whisper.cpp backend via whisper-rs

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};
use whisper_rs::{
    get_lang_str, FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters,
};

use super::model::{InferenceRequest, ModelOutput, SpeechModel, TaskKind};
use crate::audio::{AudioExtractor, TARGET_SAMPLE_RATE};
use crate::config::TranscriptionConfig;
use crate::{Result, TranscriptionError};

/// Whisper context loaded once; each call creates its own inference state
pub struct LocalWhisperModel {
    ctx: Arc<WhisperContext>,
    decoder: AudioExtractor,
    threads: i32,
    label: String,
}

impl LocalWhisperModel {
    /// Load the GGML model from disk. Runs on the blocking pool.
    pub async fn load(config: &TranscriptionConfig) -> Result<Self> {
        let model_path = config.model_path();
        if !model_path.is_file() {
            return Err(TranscriptionError::ModelLoad(format!(
                "Model file not found: {}",
                model_path.display()
            )));
        }

        let use_gpu = config.device().use_gpu();
        let path_str = model_path.to_string_lossy().to_string();
        info!("Loading Whisper model from {}", path_str);

        let ctx = tokio::task::spawn_blocking(move || {
            let mut params = WhisperContextParameters::default();
            params.use_gpu(use_gpu);
            WhisperContext::new_with_params(&path_str, params)
                .map_err(|e| TranscriptionError::ModelLoad(format!("{}: {}", path_str, e)))
        })
        .await
        .map_err(|e| TranscriptionError::ModelLoad(format!("Model load task failed: {}", e)))??;
        info!("✅ Whisper model loaded");

        Ok(Self {
            ctx: Arc::new(ctx),
            decoder: AudioExtractor::from_config(config),
            threads: config.threads() as i32,
            label: config.model_label(),
        })
    }
}

#[async_trait]
impl SpeechModel for LocalWhisperModel {
    async fn transcribe(&self, request: InferenceRequest) -> Result<ModelOutput> {
        let samples = self.decoder.decode_pcm_f32(&request.audio_path).await?;
        if samples.is_empty() {
            return Err(TranscriptionError::Inference(format!(
                "No audio samples decoded from {}",
                request.audio_path.display()
            )));
        }

        let window = (request.max_chunk_duration.as_secs().max(1) as usize)
            * TARGET_SAMPLE_RATE as usize;
        let ctx = Arc::clone(&self.ctx);
        let threads = self.threads;

        // whisper-rs is CPU-bound; run on blocking thread pool
        tokio::task::spawn_blocking(move || -> Result<ModelOutput> {
            let mut pieces = Vec::new();
            let mut detected_id: Option<i32> = None;

            for (index, chunk) in samples.chunks(window).enumerate() {
                let mut state = ctx.create_state().map_err(|e| {
                    TranscriptionError::Inference(format!("Failed to create Whisper state: {}", e))
                })?;

                let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
                params.set_n_threads(threads);
                params.set_translate(request.task == TaskKind::Translate);
                params.set_language(Some(request.language.as_deref().unwrap_or("auto")));
                params.set_print_progress(false);
                params.set_print_special(false);
                params.set_print_realtime(false);
                params.set_print_timestamps(false);

                state.full(params, chunk).map_err(|e| {
                    TranscriptionError::Inference(format!("Whisper transcription failed: {}", e))
                })?;

                if request.language.is_none() && detected_id.is_none() {
                    detected_id = Some(state.full_lang_id_from_state());
                }

                let n_segments = state.full_n_segments();
                for i in 0..n_segments {
                    if let Some(segment) = state.get_segment(i) {
                        if let Ok(text) = segment.to_str() {
                            let text = text.trim();
                            if !text.is_empty() {
                                pieces.push(text.to_string());
                            }
                        }
                    }
                }
                debug!("Chunk {} produced {} segments", index, n_segments);
            }

            Ok(ModelOutput {
                text: pieces.join(" "),
                language: reported_language(request.language.as_deref(), detected_id),
            })
        })
        .await
        .map_err(|e| TranscriptionError::Inference(format!("Whisper task join error: {}", e)))?
    }

    fn name(&self) -> &str {
        &self.label
    }
}

/// Caller hint if any, else the language whisper detected on the first chunk
fn reported_language(hint: Option<&str>, detected_id: Option<i32>) -> Option<String> {
    match hint {
        Some(hint) => Some(hint.to_string()),
        None => detected_id.and_then(get_lang_str).map(str::to_string),
    }
}
