//! Bounded worker pool over one shared transcription engine

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::lecture::LectureRecord;
use crate::transcription::{TranscriptionEngine, TranscriptionResult};
use crate::TranscriptionError;

/// Overall batch results, in submission order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub total_time: Duration,
    pub results: Vec<TranscriptionResult>,
}

/// Runs transcriptions with at most `workers` in flight at once.
///
/// A timed-out lecture releases its worker immediately. With the in-process
/// `local-whisper` backend the blocking inference call cannot be interrupted
/// and keeps its CPU threads until it finishes, so after timeouts more than
/// `workers` inferences may briefly run at the same time.
pub struct TranscriptionPool {
    engine: Arc<TranscriptionEngine>,
    worker_semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    timeout: Option<Duration>,
}

impl TranscriptionPool {
    /// Pool sized and timed by the engine's configuration
    pub fn new(engine: Arc<TranscriptionEngine>) -> Self {
        let workers = engine.config().workers();
        let timeout = engine.config().timeout();
        Self::with_workers(engine, workers, timeout)
    }

    pub fn with_workers(
        engine: Arc<TranscriptionEngine>,
        workers: usize,
        timeout: Option<Duration>,
    ) -> Self {
        let max_concurrent = workers.max(1);
        info!("🔧 Initializing TranscriptionPool with {} workers", max_concurrent);
        Self {
            engine,
            worker_semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            timeout,
        }
    }

    pub fn workers(&self) -> usize {
        self.max_concurrent
    }

    pub fn engine(&self) -> &TranscriptionEngine {
        &self.engine
    }

    /// Wait for a free worker, then transcribe one lecture
    pub async fn transcribe(&self, lecture: &LectureRecord) -> TranscriptionResult {
        let _permit = match self.worker_semaphore.acquire().await {
            Ok(permit) => permit,
            Err(_) => return pool_closed(&self.engine),
        };
        run_one(&self.engine, lecture, self.timeout).await
    }

    /// Transcribe many lectures concurrently, bounded by the worker count.
    ///
    /// Dropping the returned future aborts every lecture still queued or in
    /// flight.
    pub async fn transcribe_batch(&self, lectures: Vec<LectureRecord>) -> BatchSummary {
        let start_time = Instant::now();
        let total = lectures.len();
        let mut workers = JoinSet::new();

        info!("📚 Transcribing {} lectures with {} workers", total, self.max_concurrent);

        for (index, lecture) in lectures.into_iter().enumerate() {
            let engine = Arc::clone(&self.engine);
            let semaphore = Arc::clone(&self.worker_semaphore);
            let timeout = self.timeout;

            workers.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => {
                        info!("🎬 Lecture {}/{}: {}", index + 1, total, lecture.label());
                        run_one(&engine, &lecture, timeout).await
                    }
                    Err(_) => pool_closed(&engine),
                };
                (index, result)
            });
        }

        let mut slots: Vec<Option<TranscriptionResult>> = vec![None; total];
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => error!("Batch worker failed: {}", e),
            }
        }

        let results: Vec<TranscriptionResult> = slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    let err = TranscriptionError::Unknown("Worker exited without a result".to_string());
                    failed_result(&self.engine, &err)
                })
            })
            .collect();

        let successful = results.iter().filter(|r| r.success()).count();
        let summary = BatchSummary {
            total,
            successful,
            failed: total - successful,
            total_time: start_time.elapsed(),
            results,
        };

        info!(
            "✅ Batch complete in {:.1}s: {} succeeded, {} failed",
            summary.total_time.as_secs_f64(),
            summary.successful,
            summary.failed
        );
        summary
    }
}

async fn run_one(
    engine: &TranscriptionEngine,
    lecture: &LectureRecord,
    timeout: Option<Duration>,
) -> TranscriptionResult {
    match timeout {
        Some(timeout) => engine.transcribe_with_timeout(lecture, timeout).await,
        None => engine.transcribe(lecture).await,
    }
}

fn pool_closed(engine: &TranscriptionEngine) -> TranscriptionResult {
    failed_result(engine, &TranscriptionError::Unknown("Worker pool closed".to_string()))
}

fn failed_result(engine: &TranscriptionEngine, err: &TranscriptionError) -> TranscriptionResult {
    TranscriptionResult::failed(
        err,
        Duration::ZERO,
        engine.config().default_language(),
        engine.model_name(),
    )
}
