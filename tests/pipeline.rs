mod common;

use common::{requests, settings, AlwaysCreates, AlwaysFails, FlakyOnce};
use repo_seeder::batch::{BatchPipeline, PipelineState};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_all_created_in_order_with_batch_pauses() {
    let input = requests(23, "task");
    let mut pipeline = BatchPipeline::new(AlwaysCreates::default(), &settings());
    assert_eq!(pipeline.state(), PipelineState::Pending);
    assert_eq!(pipeline.planned_batches(input.len()), 3);

    let started = Instant::now();
    let outcome = pipeline.process_all(&input).await;

    // Two pauses between three batches, none after the last.
    assert_eq!(started.elapsed(), Duration::from_secs(30));
    assert_eq!(pipeline.state(), PipelineState::Done);
    assert!(outcome.failed.is_empty());
    let titles: Vec<_> = outcome.created.iter().map(|i| i.title.clone()).collect();
    let expected: Vec<_> = input.iter().map(|r| r.payload().title.clone()).collect();
    assert_eq!(titles, expected);
}

#[tokio::test(start_paused = true)]
async fn test_single_batch_has_no_pause() {
    let input = requests(10, "task");
    let mut pipeline = BatchPipeline::new(AlwaysCreates::default(), &settings());
    let started = Instant::now();
    let outcome = pipeline.process_all(&input).await;
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(outcome.created.len(), 10);
}

#[tokio::test(start_paused = true)]
async fn test_empty_input() {
    let mut pipeline = BatchPipeline::new(AlwaysCreates::default(), &settings());
    let outcome = pipeline.process_all(&[]).await;
    assert_eq!(outcome.total(), 0);
    assert_eq!(pipeline.state(), PipelineState::Done);

    let retry = pipeline.retry_failed(Vec::new(), 2).await;
    assert_eq!(retry.rounds, 0);
}

#[tokio::test(start_paused = true)]
async fn test_flaky_items_recover_in_first_sweep() {
    let input = requests(12, "test");
    let mut pipeline = BatchPipeline::new(FlakyOnce::default(), &settings());

    let first = pipeline.process_all(&input).await;
    assert!(first.created.is_empty());
    assert_eq!(first.failed.len(), 12);
    assert_eq!(first.total(), input.len());

    let retry = pipeline.retry_failed(first.failed, 2).await;
    assert_eq!(retry.rounds, 1);
    assert!(retry.remaining.is_empty());
    assert_eq!(retry.created.len(), 12);
    assert_eq!(pipeline.creator().calls.load(Ordering::SeqCst), 24);

    // Retry preserves the failed partition's order.
    assert_eq!(retry.created[0].title, input[0].payload().title);
    assert_eq!(retry.created[11].title, input[11].payload().title);
}

#[tokio::test(start_paused = true)]
async fn test_always_failing_is_bounded_by_rounds() {
    let n = 7;
    let rounds = 2;
    let input = requests(n, "kpt");
    let mut pipeline = BatchPipeline::new(AlwaysFails::default(), &settings());

    let first = pipeline.process_all(&input).await;
    assert_eq!(first.failed.len(), n);

    let started = Instant::now();
    let retry = pipeline.retry_failed(first.failed, rounds).await;
    // settle, round, pause, settle, round: no pause after the final round.
    assert_eq!(started.elapsed(), Duration::from_secs(3 + 5 + 3));

    assert_eq!(retry.rounds, rounds);
    assert_eq!(retry.remaining.len(), n);
    assert!(retry.created.is_empty());
    assert_eq!(
        pipeline.creator().calls.load(Ordering::SeqCst),
        n * (1 + rounds as usize)
    );
}

#[tokio::test(start_paused = true)]
async fn test_zero_rounds_returns_failures_untouched() {
    let input = requests(3, "task");
    let mut pipeline = BatchPipeline::new(AlwaysFails::default(), &settings());
    let first = pipeline.process_all(&input).await;
    let retry = pipeline.retry_failed(first.failed, 0).await;
    assert_eq!(retry.rounds, 0);
    assert_eq!(retry.remaining.len(), 3);
    assert_eq!(pipeline.creator().calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_no_request_is_dropped() {
    let input = requests(31, "task");
    let mut pipeline = BatchPipeline::new(FlakyOnce::default(), &settings());
    let first = pipeline.process_all(&input).await;
    let retry = pipeline.retry_failed(first.failed, 1).await;
    assert_eq!(
        first.created.len() + retry.created.len() + retry.remaining.len(),
        input.len()
    );
}
