//! Lecture Transcriber - on-premise transcription of recorded lectures
//!
//! Loads a Whisper model once per process, validates lecture media before any
//! expensive work, extracts audio from video uploads with ffmpeg and returns a
//! structured result. Media never leaves the host.

pub mod audio;
pub mod config;
pub mod lecture;
pub mod pool;
pub mod transcription;
pub mod validation;

use serde::{Deserialize, Serialize};
use std::time::Duration;

// Re-export main types for easy access
pub use crate::audio::AudioExtractor;
pub use crate::config::{
    ComputeDevice, ComputePrecision, ModelBackend, ModelSize, TranscriptionConfig,
};
pub use crate::lecture::{LectureRecord, MediaReference, RecordingKind};
pub use crate::pool::{BatchSummary, TranscriptionPool};
pub use crate::transcription::{
    SpeechModel, Transcript, TranscriptionEngine, TranscriptionResult,
};

/// Result type for transcription operations
pub type Result<T> = std::result::Result<T, TranscriptionError>;

/// Error types for transcription operations
#[derive(thiserror::Error, Debug)]
pub enum TranscriptionError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to load speech model: {0}")]
    ModelLoad(String),

    #[error("No media file attached to lecture")]
    NoMedia,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Audio extraction failed: {0}")]
    MediaExtraction(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Transcription timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl TranscriptionError {
    /// Failure class reported to callers alongside the message
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) | Self::ModelLoad(_) => ErrorKind::Configuration,
            Self::NoMedia => ErrorKind::NoMedia,
            Self::Validation(_) => ErrorKind::Validation,
            Self::MediaExtraction(_) => ErrorKind::MediaExtraction,
            Self::Inference(_) => ErrorKind::Inference,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Io(_) | Self::Unknown(_) => ErrorKind::Unknown,
        }
    }
}

/// Tagged failure class of a transcription attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    NoMedia,
    Validation,
    MediaExtraction,
    Inference,
    Timeout,
    Unknown,
}

impl ErrorKind {
    /// Whether the caller may reasonably retry the same lecture later.
    ///
    /// Validation and missing-media failures depend only on the upload itself
    /// and will fail the same way again.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::MediaExtraction | Self::Inference | Self::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(TranscriptionError::NoMedia.kind(), ErrorKind::NoMedia);
        assert_eq!(
            TranscriptionError::ModelLoad("missing".to_string()).kind(),
            ErrorKind::Configuration
        );
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert_eq!(TranscriptionError::from(io).kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ErrorKind::MediaExtraction.is_retryable());
        assert!(ErrorKind::Inference.is_retryable());
        assert!(ErrorKind::Timeout.is_retryable());
        assert!(!ErrorKind::Validation.is_retryable());
        assert!(!ErrorKind::NoMedia.is_retryable());
        assert!(!ErrorKind::Configuration.is_retryable());
    }

    #[test]
    fn test_timeout_message() {
        let err = TranscriptionError::Timeout(Duration::from_secs(90));
        assert_eq!(err.to_string(), "Transcription timed out after 90s");
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::MediaExtraction).unwrap();
        assert_eq!(json, "\"media_extraction\"");
    }
}
