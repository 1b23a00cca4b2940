//! Bounded-concurrency batch runs.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::error::WorkerError;
use crate::input::VideoInput;
use crate::pipeline::{Pipeline, RunReport};

/// A video whose run failed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure {
    pub video_id: String,
    pub error: String,
    /// Whether another attempt could succeed
    pub retryable: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub succeeded: Vec<RunReport>,
    pub failed: Vec<BatchFailure>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Run every input through the pipeline, at most `max_concurrent` at a time.
///
/// A failing video is recorded and the rest of the batch carries on.
/// Results come back in input order.
pub async fn run_batch(pipeline: Arc<Pipeline>, inputs: Vec<VideoInput>, max_concurrent: usize) -> BatchSummary {
    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
    let mut video_ids = Vec::with_capacity(inputs.len());
    let mut handles = Vec::with_capacity(inputs.len());

    info!(videos = inputs.len(), max_concurrent = max_concurrent, "Starting batch");

    for input in inputs {
        let pipeline = Arc::clone(&pipeline);
        let semaphore = Arc::clone(&semaphore);
        video_ids.push(input.id.clone());
        handles.push(tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|_| WorkerError::Task("semaphore closed".to_string()))?;
            pipeline.run_video(&input).await
        }));
    }

    let mut summary = BatchSummary::default();
    for (video_id, joined) in video_ids.into_iter().zip(join_all(handles).await) {
        match joined.map_err(WorkerError::from).and_then(|result| result) {
            Ok(report) => summary.succeeded.push(report),
            Err(e) => {
                error!(video_id = %video_id, "Video failed: {}", e);
                summary.failed.push(BatchFailure {
                    video_id,
                    error: e.to_string(),
                    retryable: e.is_retryable(),
                });
            }
        }
    }

    info!(
        succeeded = summary.succeeded.len(),
        failed = summary.failed.len(),
        "Batch complete"
    );
    summary
}
