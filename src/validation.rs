//! Precondition gate run before any extraction or inference

use crate::config::TranscriptionConfig;
use crate::{Result, TranscriptionError};
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::debug;

/// Bytes read to prove the file is readable
const PROBE_BYTES: usize = 1024;

/// Check that `path` exists, is non-empty, fits under the size ceiling, has an
/// accepted extension and can actually be read. Returns the file size.
pub async fn validate_media_file(config: &TranscriptionConfig, path: &Path) -> Result<u64> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(TranscriptionError::Validation(format!(
                "File not found: {}",
                path.display()
            )));
        }
        Err(e) => {
            return Err(TranscriptionError::Validation(format!(
                "Cannot stat {}: {}",
                path.display(),
                e
            )));
        }
    };

    if !metadata.is_file() {
        return Err(TranscriptionError::Validation(format!(
            "Not a regular file: {}",
            path.display()
        )));
    }

    let size = metadata.len();
    if size == 0 {
        return Err(TranscriptionError::Validation(format!(
            "File is empty: {}",
            path.display()
        )));
    }

    if !config.validate_file_size(size) {
        return Err(TranscriptionError::Validation(format!(
            "File too large: {:.1} MB exceeds limit of {:.1} MB",
            size as f64 / 1_048_576.0,
            config.max_file_size_bytes() as f64 / 1_048_576.0
        )));
    }

    let filename = path.to_string_lossy();
    if !config.validate_file_format(&filename) {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_string())
            .unwrap_or_default();
        return Err(TranscriptionError::Validation(format!(
            "Unsupported file format '{}'; allowed: {}",
            extension,
            config
                .allowed_extensions()
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    let mut file = tokio::fs::File::open(path).await.map_err(|e| {
        TranscriptionError::Validation(format!("File not readable: {}: {}", path.display(), e))
    })?;
    let mut probe = [0u8; PROBE_BYTES];
    let read = file.read(&mut probe).await.map_err(|e| {
        TranscriptionError::Validation(format!("File not readable: {}: {}", path.display(), e))
    })?;
    if read == 0 {
        return Err(TranscriptionError::Validation(format!(
            "File is empty: {}",
            path.display()
        )));
    }

    debug!("Validated {} ({} bytes)", path.display(), size);
    Ok(size)
}
