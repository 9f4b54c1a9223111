//! Result shaping for transcription calls

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{ErrorKind, TranscriptionError};

/// Local inference has no metered calls
pub const TRANSCRIPTION_COST: f64 = 0.0;

/// Number of whitespace-separated tokens in `text`
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Successful transcription before it is flattened into a result
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub text: String,
    pub word_count: usize,
    pub language: String,
    /// Wall-clock time of the model call
    pub inference_time: Duration,
    pub model_used: String,
}

/// Outcome of one transcription call, handed to the caller for persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResult {
    success: bool,
    transcript: Option<String>,
    word_count: usize,
    detected_language: String,
    processing_time_seconds: f64,
    cost: f64,
    error: Option<String>,
    error_kind: Option<ErrorKind>,
    model_used: String,
    completed_at: DateTime<Utc>,
}

impl TranscriptionResult {
    pub fn succeeded(transcript: Transcript) -> Self {
        Self {
            success: true,
            word_count: transcript.word_count,
            detected_language: transcript.language,
            processing_time_seconds: transcript.inference_time.as_secs_f64(),
            transcript: Some(transcript.text),
            cost: TRANSCRIPTION_COST,
            error: None,
            error_kind: None,
            model_used: transcript.model_used,
            completed_at: Utc::now(),
        }
    }

    pub fn failed(
        error: &TranscriptionError,
        elapsed: Duration,
        default_language: &str,
        model_used: &str,
    ) -> Self {
        Self {
            success: false,
            transcript: None,
            word_count: 0,
            detected_language: default_language.to_string(),
            processing_time_seconds: elapsed.as_secs_f64(),
            cost: TRANSCRIPTION_COST,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
            model_used: model_used.to_string(),
            completed_at: Utc::now(),
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn detected_language(&self) -> &str {
        &self.detected_language
    }

    /// Seconds spent on the lecture. For a successful result this is the
    /// model inference call alone; for a failed one it is the whole attempt
    /// up to the failure, including validation and audio extraction. Filter on
    /// `success()` before averaging.
    pub fn processing_time_seconds(&self) -> f64 {
        self.processing_time_seconds
    }

    /// Always 0.0
    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error_kind
    }

    /// Whether a failed call is worth retrying
    pub fn is_retryable(&self) -> bool {
        self.error_kind.map(ErrorKind::is_retryable).unwrap_or(false)
    }

    pub fn model_used(&self) -> &str {
        &self.model_used
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript(text: &str) -> Transcript {
        Transcript {
            text: text.trim().to_string(),
            word_count: count_words(text),
            language: "en".to_string(),
            inference_time: Duration::from_millis(1500),
            model_used: "whisper-base-int8".to_string(),
        }
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_words("  hello   world  "), 2);
        assert_eq!(count_words("one\ttwo\nthree"), 3);
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("   "), 0);
    }

    #[test]
    fn test_succeeded_result() {
        let result = TranscriptionResult::succeeded(transcript("  hello   world  "));
        assert!(result.success());
        assert_eq!(result.transcript(), Some("hello   world"));
        assert_eq!(result.word_count(), 2);
        assert_eq!(result.processing_time_seconds(), 1.5);
        assert_eq!(result.cost(), 0.0);
        assert_eq!(result.error(), None);
        assert!(!result.is_retryable());
    }

    #[test]
    fn test_failed_result() {
        let err = TranscriptionError::MediaExtraction("ffmpeg exited with 1".to_string());
        let result = TranscriptionResult::failed(&err, Duration::from_secs(2), "en", "whisper-base-int8");
        assert!(!result.success());
        assert_eq!(result.transcript(), None);
        assert_eq!(result.word_count(), 0);
        assert_eq!(result.processing_time_seconds(), 2.0);
        assert_eq!(result.cost(), 0.0);
        assert_eq!(result.error_kind(), Some(ErrorKind::MediaExtraction));
        assert!(result.error().unwrap().contains("Audio extraction failed"));
        assert!(result.is_retryable());
    }

    #[test]
    fn test_result_json_shape() {
        let result = TranscriptionResult::failed(&TranscriptionError::NoMedia, Duration::ZERO, "en", "m");
        let json: serde_json::Value = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["cost"], 0.0);
        assert_eq!(json["error_kind"], "no_media");
        assert!(json["transcript"].is_null());
    }
}
