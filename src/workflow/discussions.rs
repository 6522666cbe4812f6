//! Publish a directory of markdown files as discussions.

use crate::client::GraphqlClient;
use crate::config::SeederConfig;
use crate::transport::HttpTransport;
use crate::{Error, ErrorContext, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct DiscussionsOptions {
    pub dir: PathBuf,
    /// Category name or slug, matched case-insensitively.
    pub category: String,
}

impl Default for DiscussionsOptions {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("wiki"),
            category: "General".to_string(),
        }
    }
}

/// A discussion to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscussionDraft {
    pub title: String,
    pub body: String,
}

impl DiscussionDraft {
    /// Title is the first `# ` heading, else the file stem.
    pub fn from_markdown(stem: &str, body: String) -> Self {
        let title = body
            .lines()
            .find_map(|l| l.strip_prefix("# "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(stem)
            .to_string();
        Self { title, body }
    }
}

/// Markdown files of `dir`, sorted by file name.
pub fn load_drafts(dir: &Path) -> Result<Vec<DiscussionDraft>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e.eq_ignore_ascii_case("md")))
        .collect();
    paths.sort();

    let mut drafts = Vec::with_capacity(paths.len());
    for path in paths {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let body = std::fs::read_to_string(&path)?;
        drafts.push(DiscussionDraft::from_markdown(&stem, body));
    }
    Ok(drafts)
}

/// An existing discussion counts as a duplicate if its title contains the draft's.
pub fn already_exists(existing_titles: &[String], title: &str) -> bool {
    existing_titles.iter().any(|t| t.contains(title))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscussionsReport {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub async fn run(config: &SeederConfig, options: &DiscussionsOptions) -> Result<DiscussionsReport> {
    let drafts = load_drafts(&options.dir)?;
    info!(dir = %options.dir.display(), drafts = drafts.len(), "Loaded discussion drafts");

    let transport = Arc::new(HttpTransport::new(config)?);
    let client = GraphqlClient::new(transport, config);

    let categories = client.discussion_categories().await?;
    let category = categories
        .iter()
        .find(|c| c.matches(&options.category))
        .ok_or_else(|| {
            Error::validation_with_context(
                format!("Discussion category '{}' not found", options.category),
                ErrorContext::new()
                    .with_field_path("--category")
                    .with_details(
                        categories
                            .iter()
                            .map(|c| c.name.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    )
                    .with_source("discussions"),
            )
        })?;
    info!(category = %category.name, id = %category.id, "Using discussion category");

    let repo = client.repository_info().await?;
    let existing: Vec<String> = client
        .existing_discussions()
        .await?
        .into_iter()
        .map(|d| d.title)
        .collect();

    let mut report = DiscussionsReport::default();
    for draft in &drafts {
        if already_exists(&existing, &draft.title) {
            info!(title = %draft.title, "Discussion already exists");
            report.skipped += 1;
            continue;
        }
        if report.created + report.failed > 0 {
            tokio::time::sleep(config.settings.project_pause()).await;
        }
        match client
            .create_discussion(&repo.repository_id, &category.id, &draft.title, &draft.body)
            .await
        {
            Ok(created) => {
                info!(title = %created.title, url = %created.url, "Created discussion");
                report.created += 1;
            }
            Err(e) => {
                warn!(title = %draft.title, error = %e, "Failed to create discussion");
                report.failed += 1;
            }
        }
    }

    info!(
        created = report.created,
        skipped = report.skipped,
        failed = report.failed,
        "Discussions completed"
    );
    Ok(report)
}
