//! Fill `[text](#)` placeholders in a README with project, issue and discussion URLs.

use crate::client::GraphqlClient;
use crate::config::{load_structured, SeederConfig};
use crate::transport::HttpTransport;
use crate::{Error, ErrorContext, Result};
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Which listing a link is looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkSource {
    Project,
    Issue,
    Discussion,
}

impl LinkSource {
    pub const ALL: [LinkSource; 3] = [LinkSource::Project, LinkSource::Issue, LinkSource::Discussion];

    fn heading(&self) -> &'static str {
        match self {
            LinkSource::Project => "Projects",
            LinkSource::Issue => "Issues",
            LinkSource::Discussion => "Discussions",
        }
    }
}

/// One URL to resolve and the link texts it fills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRule {
    pub key: String,
    pub source: LinkSource,
    /// A title containing any of these (case-insensitive) matches.
    pub keywords: Vec<String>,
    /// Link texts whose `(#)` target is replaced. Empty rules are only reported.
    #[serde(default)]
    pub labels: Vec<String>,
}

impl LinkRule {
    pub fn matches(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        self.keywords
            .iter()
            .any(|k| title.contains(&k.to_lowercase()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPlan {
    pub rules: Vec<LinkRule>,
}

impl Default for LinkPlan {
    fn default() -> Self {
        let rule = |key: &str, source, keywords: &[&str], labels: &[&str]| LinkRule {
            key: key.to_string(),
            source,
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            labels: labels.iter().map(|s| s.to_string()).collect(),
        };
        use LinkSource::*;
        Self {
            rules: vec![
                rule("task", Project, &["タスク", "task"], &["タスクプロジェクトボード"]),
                rule("kpt", Project, &["KPT"], &["KPTプロジェクトボード"]),
                rule("test", Project, &["テスト", "test"], &[]),
                rule(
                    "kpt_kickoff",
                    Issue,
                    &["KPT説明", "KPTキックオフ", "KPT kickoff"],
                    &["KPTキックオフ説明Issue"],
                ),
                rule(
                    "task000",
                    Issue,
                    &["タスク000", "見積もりについて", "Task000"],
                    &["タスク000: 見積もりIssue"],
                ),
                rule("project_overview", Discussion, &["プロジェクト概要"], &[]),
                rule("rules", Discussion, &["チーム開発ルール", "ルール"], &[]),
                rule("table_design", Discussion, &["テーブル設計", "DB設計"], &[]),
            ],
        }
    }
}

impl LinkPlan {
    pub fn from_file_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => load_structured(p),
            None => Ok(Self::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub key: String,
    pub source: LinkSource,
    pub url: String,
}

/// URLs found for the plan's rules, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedLinks {
    pub links: Vec<ResolvedLink>,
}

impl ResolvedLinks {
    /// First `(title, url)` matching each rule of `source`.
    pub fn collect(&mut self, plan: &LinkPlan, source: LinkSource, items: &[(String, String)]) {
        for rule in plan.rules.iter().filter(|r| r.source == source) {
            let found = items
                .iter()
                .find(|(title, url)| !url.is_empty() && rule.matches(title));
            if let Some((_, url)) = found {
                self.links.push(ResolvedLink {
                    key: rule.key.clone(),
                    source,
                    url: url.clone(),
                });
            }
        }
    }

    pub fn url(&self, key: &str) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.key == key)
            .map(|l| l.url.as_str())
    }

    pub fn count(&self, source: LinkSource) -> usize {
        self.links.iter().filter(|l| l.source == source).count()
    }

    /// Body of the result file: per-source counts, then `key: url` lines.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for source in LinkSource::ALL {
            let _ = writeln!(out, "{}: {} found", source.heading(), self.count(source));
        }
        for source in LinkSource::ALL {
            for link in self.links.iter().filter(|l| l.source == source) {
                let _ = writeln!(out, "{}: {}", link.key, link.url);
            }
        }
        out
    }
}

/// Replace `[label](#)` with `[label](url)` for every resolved rule.
///
/// Returns the new content and the number of placeholders filled. Links that
/// already point somewhere are left alone.
pub fn fill_placeholders(content: &str, plan: &LinkPlan, links: &ResolvedLinks) -> Result<(String, usize)> {
    let mut content = content.to_string();
    let mut filled = 0;
    for rule in &plan.rules {
        let Some(url) = links.url(&rule.key) else {
            continue;
        };
        for label in &rule.labels {
            let pattern = format!(r"\[{}\]\(#\)", regex::escape(label));
            let re = Regex::new(&pattern).map_err(|e| {
                Error::configuration_with_context(
                    format!("Invalid link label '{label}'"),
                    ErrorContext::new()
                        .with_field_path(format!("rules.{}.labels", rule.key))
                        .with_details(e.to_string())
                        .with_source("readme_links"),
                )
            })?;
            let hits = re.find_iter(&content).count();
            if hits == 0 {
                continue;
            }
            content = re
                .replace_all(&content, NoExpand(&format!("[{label}]({url})")))
                .into_owned();
            filled += hits;
        }
    }
    Ok((content, filled))
}

#[derive(Debug, Clone)]
pub struct ReadmeOptions {
    pub plan: LinkPlan,
    pub readme: PathBuf,
    /// `readme_links_result.txt`
    pub output: PathBuf,
}

impl Default for ReadmeOptions {
    fn default() -> Self {
        Self {
            plan: LinkPlan::default(),
            readme: PathBuf::from("README.md"),
            output: PathBuf::from("readme_links_result.txt"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadmeReport {
    pub links: ResolvedLinks,
    pub filled: usize,
}

pub async fn run(config: &SeederConfig, options: &ReadmeOptions) -> Result<ReadmeReport> {
    let content = std::fs::read_to_string(&options.readme)?;

    let transport = Arc::new(HttpTransport::new(config)?);
    let client = GraphqlClient::new(transport, config);
    let plan = &options.plan;
    let mut links = ResolvedLinks::default();

    // Each listing is best-effort: a failed lookup leaves its placeholders as `#`.
    match client.repository_info().await {
        Ok(repo) => {
            let items: Vec<_> = repo
                .existing_projects
                .into_iter()
                .map(|p| (p.title, p.url))
                .collect();
            links.collect(plan, LinkSource::Project, &items);
        }
        Err(e) => warn!(error = %e, "Could not list projects"),
    }
    match client.recent_issues().await {
        Ok(issues) => {
            let items: Vec<_> = issues.into_iter().map(|i| (i.title, i.url)).collect();
            links.collect(plan, LinkSource::Issue, &items);
        }
        Err(e) => warn!(error = %e, "Could not list issues"),
    }
    match client.existing_discussions().await {
        Ok(discussions) => {
            let items: Vec<_> = discussions.into_iter().map(|d| (d.title, d.url)).collect();
            links.collect(plan, LinkSource::Discussion, &items);
        }
        Err(e) => warn!(error = %e, "Could not list discussions"),
    }

    let (updated, filled) = fill_placeholders(&content, plan, &links)?;
    if updated != content {
        std::fs::write(&options.readme, &updated)?;
    }
    std::fs::write(&options.output, links.render())?;

    info!(
        readme = %options.readme.display(),
        projects = links.count(LinkSource::Project),
        issues = links.count(LinkSource::Issue),
        discussions = links.count(LinkSource::Discussion),
        filled,
        "README links updated"
    );
    Ok(ReadmeReport { links, filled })
}
