//! Lecture records handed in by the scheduling/content subsystem

use crate::{Result, TranscriptionError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How the lecture was recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingKind {
    Audio,
    Video,
}

/// The lecture as the caller stores it. The engine only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LectureRecord {
    /// Caller's identifier, used in logs only
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub audio_file_path: Option<PathBuf>,
    #[serde(default)]
    pub video_file_path: Option<PathBuf>,
    pub recording_kind: RecordingKind,
    /// Reported length; informational, never enforced
    #[serde(default)]
    pub duration_seconds: Option<u64>,
}

impl LectureRecord {
    pub fn audio(path: impl Into<PathBuf>) -> Self {
        Self {
            id: None,
            audio_file_path: Some(path.into()),
            video_file_path: None,
            recording_kind: RecordingKind::Audio,
            duration_seconds: None,
        }
    }

    pub fn video(path: impl Into<PathBuf>) -> Self {
        Self {
            id: None,
            audio_file_path: None,
            video_file_path: Some(path.into()),
            recording_kind: RecordingKind::Video,
            duration_seconds: None,
        }
    }

    /// A record with no media attached
    pub fn empty(recording_kind: RecordingKind) -> Self {
        Self {
            id: None,
            audio_file_path: None,
            video_file_path: None,
            recording_kind,
            duration_seconds: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_duration(mut self, seconds: u64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    /// Label for log lines
    pub fn label(&self) -> String {
        match (&self.id, self.media_reference()) {
            (Some(id), _) => id.clone(),
            (None, Ok(media)) => media.path().display().to_string(),
            (None, Err(_)) => "<no media>".to_string(),
        }
    }

    /// Resolve the single media file to transcribe.
    ///
    /// The path matching `recording_kind` wins; otherwise whichever path is
    /// present, audio first.
    pub fn media_reference(&self) -> Result<MediaReference> {
        let audio = non_empty(&self.audio_file_path);
        let video = non_empty(&self.video_file_path);

        match (self.recording_kind, audio, video) {
            (RecordingKind::Video, _, Some(video)) => Ok(MediaReference::Video(video.to_path_buf())),
            (_, Some(audio), _) => Ok(MediaReference::Audio(audio.to_path_buf())),
            (_, None, Some(video)) => Ok(MediaReference::Video(video.to_path_buf())),
            (_, None, None) => Err(TranscriptionError::NoMedia),
        }
    }
}

fn non_empty(path: &Option<PathBuf>) -> Option<&Path> {
    path.as_deref().filter(|p| !p.as_os_str().is_empty())
}

/// The resolved media file of a lecture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaReference {
    Audio(PathBuf),
    Video(PathBuf),
}

impl MediaReference {
    pub fn path(&self) -> &Path {
        match self {
            Self::Audio(path) | Self::Video(path) => path,
        }
    }

    pub fn kind(&self) -> RecordingKind {
        match self {
            Self::Audio(_) => RecordingKind::Audio,
            Self::Video(_) => RecordingKind::Video,
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self, Self::Video(_))
    }
}
