//! Turning CSV rows into ordered pending requests, and grouping the results.

use crate::config::{IssueKindSpec, IssueKindsConfig};
use crate::types::{CreatedIssue, IssueKind, IssueRequest, PendingRequest};
use crate::{Error, ErrorContext, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use super::csv_loader::{load_issue_rows, IssueRow};

/// Builds requests for one issue kind.
pub struct KindPreparer<'a> {
    spec: &'a IssueKindSpec,
    numbering: Option<Regex>,
}

impl<'a> KindPreparer<'a> {
    pub fn new(spec: &'a IssueKindSpec) -> Result<Self> {
        let numbering = if spec.numbered_title && !spec.title_prefix.is_empty() {
            let pattern = format!(r"^{}[\d\s:.]*(.+)$", regex::escape(&spec.title_prefix));
            Some(Regex::new(&pattern).map_err(|e| {
                Error::configuration_with_context(
                    format!("Invalid title prefix for kind '{}'", spec.name),
                    ErrorContext::new()
                        .with_field_path(format!("kinds.{}.title_prefix", spec.name))
                        .with_details(e.to_string()),
                )
            })?)
        } else {
            None
        };
        Ok(Self { spec, numbering })
    }

    /// `{prefix}{index:03}: {title}` for numbered kinds, with any existing
    /// `{prefix}<digits>` lead replaced. `index` is 1-based.
    pub fn title(&self, raw: &str, index: usize) -> String {
        let raw = raw.trim();
        let Some(re) = &self.numbering else {
            return raw.to_string();
        };
        let clean = re
            .captures(raw)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim())
            .unwrap_or(raw);
        format!("{}{:03}: {}", self.spec.title_prefix, index, clean)
    }

    /// CSV labels merged with the kind's defaults, deduplicated in first-seen order.
    pub fn labels(&self, raw: &str) -> Vec<String> {
        let raw = raw.trim();
        let raw = raw
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(raw);

        let mut labels: Vec<String> = Vec::new();
        let candidates = raw
            .split(',')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .chain(self.spec.labels.iter().cloned());
        for label in candidates {
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        labels
    }

    pub fn prepare(&self, rows: &[IssueRow]) -> Vec<PendingRequest> {
        let kind = self.spec.kind();
        rows.iter()
            .filter(|row| !row.title.trim().is_empty())
            .enumerate()
            .map(|(i, row)| {
                let payload = IssueRequest::new(self.title(&row.title, i + 1), row.body.trim())
                    .with_labels(self.labels(&row.labels));
                PendingRequest::new(payload, kind.clone())
            })
            .collect()
    }
}

/// Load and prepare every configured kind, in configuration order.
pub fn prepare_all(kinds: &IssueKindsConfig, data_dir: &Path) -> Result<Vec<PendingRequest>> {
    let mut all = Vec::new();
    for spec in &kinds.kinds {
        let rows = load_issue_rows(&data_dir.join(&spec.csv_file), &spec.name)?;
        let prepared = KindPreparer::new(spec)?.prepare(&rows);
        info!(kind = %spec.name, requests = prepared.len(), "Prepared requests");
        all.extend(prepared);
    }
    info!(total = all.len(), "Prepared requests for all kinds");
    Ok(all)
}

/// Group created issues by the kind of the request that produced them.
pub fn classify(created: &[CreatedIssue]) -> BTreeMap<IssueKind, Vec<CreatedIssue>> {
    let mut groups: BTreeMap<IssueKind, Vec<CreatedIssue>> = BTreeMap::new();
    for issue in created {
        groups.entry(issue.kind.clone()).or_default().push(issue.clone());
    }
    groups
}
