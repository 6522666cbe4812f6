//! Bulk issue creation: prepare, batch, retry, link, summarize.

use crate::batch::{batch_count, estimate_completion, BatchPipeline, Linker};
use crate::client::{check_initial_rate_limit, GraphqlClient, IssueClient};
use crate::config::{IssueKindsConfig, SeederConfig};
use crate::input::{classify, prepare_all, read_project_ids};
use crate::report::{KindSummary, RunSummary};
use crate::transport::HttpTransport;
use crate::{Error, ErrorContext, Result};
use chrono::Local;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Inputs of one issues run.
#[derive(Debug, Clone)]
pub struct IssuesOptions {
    pub kinds: IssueKindsConfig,
    pub data_dir: PathBuf,
    pub project_ids: PathBuf,
    pub output: PathBuf,
}

impl Default for IssuesOptions {
    fn default() -> Self {
        Self {
            kinds: IssueKindsConfig::default(),
            data_dir: PathBuf::from("data"),
            project_ids: PathBuf::from("project_ids.txt"),
            output: PathBuf::from("issue_creation_result.txt"),
        }
    }
}

pub async fn run(config: &SeederConfig, options: &IssuesOptions) -> Result<RunSummary> {
    let started = Instant::now();
    let settings = &config.settings;
    config.log_settings();

    let transport = Arc::new(HttpTransport::new(config)?);
    if let Err(e) = check_initial_rate_limit(&transport).await {
        warn!(error = %e, "Could not read the initial rate limit");
    }

    let requests = prepare_all(&options.kinds, &options.data_dir)?;
    if requests.is_empty() {
        return Err(Error::validation_with_context(
            "No issues found in CSV files",
            ErrorContext::new()
                .with_field_path(options.data_dir.display().to_string())
                .with_source("issues"),
        ));
    }

    let eta = estimate_completion(
        requests.len(),
        settings.batch_size,
        settings.request_delay(),
        settings.batch_pause(),
    );
    let finish = chrono::Duration::from_std(eta)
        .ok()
        .and_then(|d| Local::now().checked_add_signed(d))
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_default();
    info!(
        total = requests.len(),
        batch_size = settings.batch_size,
        batches = batch_count(requests.len(), settings.batch_size),
        eta_mins = %format!("{:.1}", eta.as_secs_f64() / 60.0),
        finish = %finish,
        "Processing plan"
    );

    let project_ids = read_project_ids(&options.project_ids)?;

    let creator = IssueClient::new(Arc::clone(&transport), config);
    let mut pipeline = BatchPipeline::new(creator, settings);
    let first_pass = pipeline.process_all(&requests).await;
    let retry = pipeline
        .retry_failed(first_pass.failed, settings.max_retry_rounds)
        .await;

    let mut created = first_pass.created;
    created.extend(retry.created.iter().cloned());
    let groups = classify(&created);

    let linker = Linker::new(GraphqlClient::new(Arc::clone(&transport), config), settings);
    let mut per_kind = Vec::with_capacity(options.kinds.kinds.len());
    for spec in &options.kinds.kinds {
        let issues = groups.get(&spec.kind()).map(Vec::as_slice).unwrap_or_default();
        let linked = match spec.project_name.as_deref() {
            Some(project) => match project_ids.get(project) {
                Some(project_id) => linker.link(issues, project_id, project).await,
                None => {
                    if !issues.is_empty() {
                        warn!(kind = %spec.name, project, "No project id found, skipping linking");
                    }
                    0
                }
            },
            None => 0,
        };
        per_kind.push(KindSummary {
            kind: spec.name.clone(),
            created: issues.len(),
            linked,
        });
    }

    let summary = RunSummary {
        submitted: requests.len(),
        per_kind,
        retry_created: retry.created.len(),
        final_failed: retry.remaining.len(),
        elapsed: started.elapsed(),
    };
    summary.log();
    summary.write_to(&options.output)?;
    Ok(summary)
}
