mod common;

use common::{issue_for, requests, settings, ScriptedLinker};
use repo_seeder::batch::Linker;
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_link_counts_only_successes() {
    let created: Vec<_> = requests(5, "task")
        .iter()
        .enumerate()
        .map(|(i, r)| issue_for(r, i as u64 + 1))
        .collect();

    // #2 errors, #3 returns no item id.
    let linker = Linker::new(ScriptedLinker::failing(&[2, 3]), &settings());
    let started = Instant::now();
    let linked = linker.link(&created, "PVT_tasks", "Tasks").await;

    assert_eq!(linked, 3);
    // 0.1 s between items.
    assert_eq!(started.elapsed(), Duration::from_millis(400));
}

#[tokio::test(start_paused = true)]
async fn test_link_empty_is_noop() {
    let linker = Linker::new(ScriptedLinker::failing(&[]), &settings());
    assert_eq!(linker.link(&[], "PVT_tasks", "Tasks").await, 0);
}
