//! Shared fixtures: simulated creators and linkers, request builders.

#![allow(dead_code)]

use async_trait::async_trait;
use repo_seeder::client::{CreateFailure, CreateOutcome, IssueCreator, ProjectLinker, Slot};
use repo_seeder::config::PipelineSettings;
use repo_seeder::types::{CreatedIssue, IssueKind, IssueRequest, PendingRequest};
use repo_seeder::{Error, Result};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn requests(n: usize, kind: &str) -> Vec<PendingRequest> {
    (1..=n)
        .map(|i| {
            PendingRequest::new(
                IssueRequest::new(format!("Task{i:03}: item {i}"), "body")
                    .with_labels(vec![kind.to_string()]),
                IssueKind::new(kind),
            )
        })
        .collect()
}

pub fn issue_for(request: &PendingRequest, number: u64) -> CreatedIssue {
    CreatedIssue {
        id: number,
        node_id: format!("I_{number}"),
        number,
        title: request.payload().title.clone(),
        html_url: format!("https://github.com/acme/app/issues/{number}"),
        labels: request.payload().labels.clone(),
        kind: request.kind().clone(),
    }
}

pub fn settings() -> PipelineSettings {
    PipelineSettings {
        batch_size: 10,
        batch_pause: 15.0,
        retry_settle_delay: 3.0,
        retry_round_pause: 5.0,
        link_delay: 0.1,
        ..PipelineSettings::default()
    }
}

/// Creates every item on the first try.
#[derive(Default)]
pub struct AlwaysCreates {
    pub calls: AtomicUsize,
}

#[async_trait]
impl IssueCreator for AlwaysCreates {
    async fn create(&self, request: &PendingRequest, _slot: Slot) -> CreateOutcome {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(issue_for(request, n as u64))
    }
}

/// Fails the first attempt for each title, succeeds afterwards.
#[derive(Default)]
pub struct FlakyOnce {
    pub calls: AtomicUsize,
    seen: Mutex<HashSet<String>>,
}

#[async_trait]
impl IssueCreator for FlakyOnce {
    async fn create(&self, request: &PendingRequest, _slot: Slot) -> CreateOutcome {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let first_time = self
            .seen
            .lock()
            .unwrap()
            .insert(request.payload().title.clone());
        if first_time {
            Err(CreateFailure::Exhausted { attempts: 15 })
        } else {
            Ok(issue_for(request, n as u64))
        }
    }
}

/// Never creates anything.
#[derive(Default)]
pub struct AlwaysFails {
    pub calls: AtomicUsize,
}

#[async_trait]
impl IssueCreator for AlwaysFails {
    async fn create(&self, _request: &PendingRequest, _slot: Slot) -> CreateOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CreateFailure::Rejected {
            status: 422,
            message: "Validation Failed".into(),
        })
    }
}

/// Fails items whose number is listed; `Err` for even numbers, no item id for odd.
pub struct ScriptedLinker {
    pub failing: Vec<u64>,
    pub calls: AtomicUsize,
}

impl ScriptedLinker {
    pub fn failing(numbers: &[u64]) -> Self {
        Self {
            failing: numbers.to_vec(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ProjectLinker for ScriptedLinker {
    async fn add_to_project(&self, _project_id: &str, issue: &CreatedIssue) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.failing.contains(&issue.number) {
            return Ok(Some(format!("PVTI_{}", issue.number)));
        }
        if issue.number % 2 == 0 {
            Err(Error::GraphQl {
                message: "Could not resolve to a node".into(),
            })
        } else {
            Ok(None)
        }
    }
}
