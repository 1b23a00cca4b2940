//! Folder watch mode.
//!
//! A file is picked up once its size has stayed the same across two polls,
//! so half-copied videos are left alone. Failed runs are retried on later
//! polls until `max_attempts` is reached.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mclip_ai::FailureTracker;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::batch::{run_batch, BatchSummary};
use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::input::discover_inputs;
use crate::pipeline::Pipeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Waiting,
    Done,
    Failed,
}

#[derive(Debug, Clone)]
struct TrackedFile {
    path: PathBuf,
    size: u64,
    attempts: u32,
    status: FileStatus,
}

/// Result of one poll.
#[derive(Debug, Default)]
pub struct PollSummary {
    pub batch: BatchSummary,
    /// Files seen but not yet stable or awaiting retry
    pub waiting: usize,
}

pub struct FolderWatcher {
    pipeline: Arc<Pipeline>,
    input_dir: PathBuf,
    interval: Duration,
    max_attempts: u32,
    max_concurrent: usize,
    files: HashMap<String, TrackedFile>,
    scan_failures: FailureTracker,
}

impl FolderWatcher {
    pub fn new(pipeline: Arc<Pipeline>, config: &WorkerConfig) -> Self {
        Self {
            pipeline,
            input_dir: config.input_dir.clone(),
            interval: config.watch_interval,
            max_attempts: config.watch_max_attempts.max(1),
            max_concurrent: config.max_concurrent_videos,
            files: HashMap::new(),
            scan_failures: FailureTracker::new(3),
        }
    }

    pub fn status(&self, video_id: &str) -> Option<FileStatus> {
        self.files.get(video_id).map(|f| f.status)
    }

    /// Scan once and process every file that is ready.
    pub async fn poll_once(&mut self) -> WorkerResult<PollSummary> {
        let inputs = discover_inputs(&self.input_dir).await?;
        let mut ready = Vec::new();

        for input in inputs {
            let size = match tokio::fs::metadata(&input.path).await {
                Ok(meta) => meta.len(),
                Err(e) => {
                    debug!(path = %input.path.display(), "Skipping unreadable file: {}", e);
                    continue;
                }
            };

            let tracked = match self.files.entry(input.id.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(TrackedFile {
                        path: input.path.clone(),
                        size,
                        attempts: 0,
                        status: FileStatus::Waiting,
                    });
                    continue;
                }
                Entry::Occupied(slot) => slot.into_mut(),
            };

            if tracked.path != input.path || tracked.size != size {
                // Replaced or still growing
                tracked.path = input.path.clone();
                tracked.size = size;
                tracked.attempts = 0;
                tracked.status = FileStatus::Waiting;
            } else if tracked.status == FileStatus::Waiting {
                ready.push(input);
            }
        }

        let batch = if ready.is_empty() {
            BatchSummary::default()
        } else {
            run_batch(Arc::clone(&self.pipeline), ready, self.max_concurrent).await
        };
        self.record(&batch);

        let waiting = self
            .files
            .values()
            .filter(|f| f.status == FileStatus::Waiting)
            .count();
        Ok(PollSummary { batch, waiting })
    }

    fn record(&mut self, batch: &BatchSummary) {
        for report in &batch.succeeded {
            if let Some(tracked) = self.files.get_mut(&report.video_id) {
                tracked.status = FileStatus::Done;
            }
        }
        for failure in &batch.failed {
            let Some(tracked) = self.files.get_mut(&failure.video_id) else {
                continue;
            };
            tracked.attempts += 1;
            if !failure.retryable || tracked.attempts >= self.max_attempts {
                warn!(
                    video_id = %failure.video_id,
                    attempts = tracked.attempts,
                    "Giving up on video: {}", failure.error
                );
                tracked.status = FileStatus::Failed;
            }
        }
    }

    /// Poll until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> WorkerResult<()> {
        info!(dir = %self.input_dir.display(), interval_secs = self.interval.as_secs(), "Watching for videos");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Shutdown signal received, stopping watcher");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    match self.poll_once().await {
                        Ok(poll) => {
                            self.scan_failures.record_success();
                            if !poll.batch.is_empty() {
                                info!(
                                    succeeded = poll.batch.succeeded.len(),
                                    failed = poll.batch.failed.len(),
                                    waiting = poll.waiting,
                                    "Poll processed videos"
                                );
                            }
                        }
                        Err(e) => {
                            if self.scan_failures.record_failure() {
                                warn!(dir = %self.input_dir.display(), "Scan failed: {}", e);
                            }
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

