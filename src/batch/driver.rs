//! Sequential batch driver.

use crate::client::{IssueCreator, Slot};
use crate::config::PipelineSettings;
use crate::types::{CreatedIssue, PendingRequest};
use std::time::Duration;
use tracing::{info, warn};

use super::splitter::{batch_count, split};

/// Where the driver is in its single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Pending,
    InProgress { batch: usize },
    Done,
}

/// Created/failed partition of one pass.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub created: Vec<CreatedIssue>,
    pub failed: Vec<PendingRequest>,
}

impl BatchOutcome {
    pub fn total(&self) -> usize {
        self.created.len() + self.failed.len()
    }

    fn absorb(&mut self, other: BatchOutcome) {
        self.created.extend(other.created);
        self.failed.extend(other.failed);
    }
}

/// Drives an [`IssueCreator`] over ordered requests, one batch at a time.
pub struct BatchPipeline<C: IssueCreator> {
    pub(super) creator: C,
    pub(super) batch_size: usize,
    pub(super) batch_pause: Duration,
    pub(super) retry_settle_delay: Duration,
    pub(super) retry_round_pause: Duration,
    state: PipelineState,
}

impl<C: IssueCreator> BatchPipeline<C> {
    pub fn new(creator: C, settings: &PipelineSettings) -> Self {
        Self {
            creator,
            batch_size: settings.batch_size.max(1),
            batch_pause: settings.batch_pause(),
            retry_settle_delay: settings.retry_settle_delay(),
            retry_round_pause: settings.retry_round_pause(),
            state: PipelineState::Pending,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn creator(&self) -> &C {
        &self.creator
    }

    /// Run every batch in order. Failures are collected, never retried here.
    pub async fn process_all(&mut self, requests: &[PendingRequest]) -> BatchOutcome {
        let batches = split(requests, self.batch_size);
        let total_batches = batches.len();
        let mut outcome = BatchOutcome::default();

        for batch in batches {
            self.state = PipelineState::InProgress { batch: batch.index };
            info!(
                batch = batch.index + 1,
                total_batches,
                items = batch.len(),
                "Processing batch"
            );

            let result = self.run_batch(batch.requests).await;
            info!(
                batch = batch.index + 1,
                created = result.created.len(),
                failed = result.failed.len(),
                "Batch finished"
            );
            outcome.absorb(result);

            if batch.index + 1 < total_batches && !self.batch_pause.is_zero() {
                info!(pause_secs = self.batch_pause.as_secs_f64(), "Waiting before next batch");
                tokio::time::sleep(self.batch_pause).await;
            }
        }

        self.state = PipelineState::Done;
        outcome
    }

    /// Create each item of one batch sequentially.
    pub async fn run_batch(&self, requests: &[PendingRequest]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        let total = requests.len();
        for (index, request) in requests.iter().enumerate() {
            match self.creator.create(request, Slot::new(index, total)).await {
                Ok(issue) => outcome.created.push(issue),
                Err(reason) => {
                    warn!(
                        slot = %Slot::new(index, total),
                        title = %request.payload().short_title(),
                        %reason,
                        "Item failed"
                    );
                    outcome.failed.push(request.clone());
                }
            }
        }
        outcome
    }

    /// Number of batches `total` items would be split into.
    pub fn planned_batches(&self, total: usize) -> usize {
        batch_count(total, self.batch_size)
    }
}
