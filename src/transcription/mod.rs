pub mod engine;
pub mod model;
pub mod result;
pub mod whisper_cli;

#[cfg(feature = "local-whisper")]
pub mod local_whisper;

pub use engine::{PipelineStage, TranscriptionEngine};
pub use model::{load_model, InferenceRequest, ModelOutput, SpeechModel, TaskKind};
pub use result::{count_words, Transcript, TranscriptionResult, TRANSCRIPTION_COST};
pub use whisper_cli::WhisperCliModel;
