//! Retry sweep over the failed partition.

use crate::client::IssueCreator;
use crate::types::{CreatedIssue, PendingRequest};
use tracing::{info, warn};

use super::driver::BatchPipeline;

/// How many unresolved titles are listed before collapsing to a count.
const REPORTED_FAILURES: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct RetryOutcome {
    pub created: Vec<CreatedIssue>,
    pub remaining: Vec<PendingRequest>,
    /// Sweep passes actually run.
    pub rounds: u32,
}

impl<C: IssueCreator> BatchPipeline<C> {
    /// Re-submit `failed` in up to `max_rounds` passes.
    pub async fn retry_failed(&self, failed: Vec<PendingRequest>, max_rounds: u32) -> RetryOutcome {
        let mut outcome = RetryOutcome {
            remaining: failed,
            ..Default::default()
        };
        if outcome.remaining.is_empty() {
            return outcome;
        }

        info!(failed = outcome.remaining.len(), max_rounds, "Retrying failed issues");

        while !outcome.remaining.is_empty() && outcome.rounds < max_rounds {
            outcome.rounds += 1;
            if !self.retry_settle_delay.is_zero() {
                tokio::time::sleep(self.retry_settle_delay).await;
            }
            info!(
                round = outcome.rounds,
                max_rounds,
                items = outcome.remaining.len(),
                "Retry round"
            );

            let pending = std::mem::take(&mut outcome.remaining);
            let result = self.run_batch(&pending).await;
            info!(
                round = outcome.rounds,
                recovered = result.created.len(),
                still_failing = result.failed.len(),
                "Retry round finished"
            );
            outcome.created.extend(result.created);
            outcome.remaining = result.failed;

            if !outcome.remaining.is_empty()
                && outcome.rounds < max_rounds
                && !self.retry_round_pause.is_zero()
            {
                tokio::time::sleep(self.retry_round_pause).await;
            }
        }

        report_unresolved(&outcome.remaining);
        outcome
    }
}

fn report_unresolved(remaining: &[PendingRequest]) {
    if remaining.is_empty() {
        return;
    }
    warn!(count = remaining.len(), "Issues still failing after retries");
    for request in remaining.iter().take(REPORTED_FAILURES) {
        warn!(title = %request.payload().short_title(), "Unresolved");
    }
    if remaining.len() > REPORTED_FAILURES {
        warn!(more = remaining.len() - REPORTED_FAILURES, "Further unresolved issues");
    }
}
