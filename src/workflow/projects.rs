//! Project setup: reuse or create projects and their single-select fields.

use crate::client::{GraphqlClient, RepositoryInfo};
use crate::config::{load_structured, SeederConfig};
use crate::input::write_project_ids;
use crate::transport::HttpTransport;
use crate::Result;
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Option placeholder that expands to the upcoming weekly sprints.
pub const SPRINTS_PLACEHOLDER: &str = "@sprints";
const SPRINT_WEEKS: i64 = 13;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSpec {
    pub title: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// Projects to ensure, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectPlan {
    pub projects: Vec<ProjectSpec>,
}

impl Default for ProjectPlan {
    fn default() -> Self {
        let points: Vec<String> = ["1", "2", "3", "5", "8", "13"].map(String::from).to_vec();
        let field = |name: &str, options: Vec<String>| FieldSpec {
            name: name.to_string(),
            options,
        };
        let sprint = || field("Sprint", vec![SPRINTS_PLACEHOLDER.to_string()]);
        Self {
            projects: vec![
                ProjectSpec {
                    title: "Tasks".into(),
                    fields: vec![
                        field("Planned pt", points.clone()),
                        field("Actual pt", points),
                        sprint(),
                    ],
                },
                ProjectSpec {
                    title: "Tests".into(),
                    fields: vec![sprint()],
                },
                ProjectSpec {
                    title: "KPT".into(),
                    fields: Vec::new(),
                },
            ],
        }
    }
}

impl ProjectPlan {
    pub fn from_file_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => load_structured(p),
            None => Ok(Self::default()),
        }
    }
}

/// `Sprint N (m/d-m/d)` labels for `SPRINT_WEEKS` weeks starting at `start`.
pub fn sprint_options(start: NaiveDate) -> Vec<String> {
    (0..SPRINT_WEEKS)
        .map(|i| {
            let from = start + chrono::Duration::weeks(i);
            let to = from + chrono::Duration::days(6);
            format!(
                "Sprint {} ({}/{}-{}/{})",
                i + 1,
                from.month(),
                from.day(),
                to.month(),
                to.day()
            )
        })
        .collect()
}

/// Replace every `@sprints` entry with the generated sprint labels.
pub fn expand_options(options: &[String], today: NaiveDate) -> Vec<String> {
    options
        .iter()
        .flat_map(|o| {
            if o == SPRINTS_PLACEHOLDER {
                sprint_options(today)
            } else {
                vec![o.clone()]
            }
        })
        .collect()
}

/// Whether any project had to be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectStatus {
    AllSkipped,
    Created,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::AllSkipped => "ALL_SKIPPED",
            ProjectStatus::Created => "CREATED",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProjectsOptions {
    pub plan: ProjectPlan,
    /// `project_ids.txt`; `project_status.txt` is written next to it.
    pub output: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectsReport {
    /// `(title, id)` in plan order.
    pub projects: Vec<(String, String)>,
    pub created: usize,
    pub reused: usize,
    pub fields_created: usize,
}

impl ProjectsReport {
    pub fn status(&self, planned: usize) -> ProjectStatus {
        if self.reused == planned {
            ProjectStatus::AllSkipped
        } else {
            ProjectStatus::Created
        }
    }
}

pub async fn run(config: &SeederConfig, options: &ProjectsOptions) -> Result<ProjectsReport> {
    let transport = Arc::new(HttpTransport::new(config)?);
    let client = GraphqlClient::new(transport, config);
    let repo = client.repository_info().await?;
    info!(
        repository = %config.repository(),
        existing = repo.existing_projects.len(),
        "Found existing projects"
    );

    let today = Local::now().date_naive();
    let planned = options.plan.projects.len();
    let mut report = ProjectsReport::default();

    for (i, spec) in options.plan.projects.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(config.settings.project_pause()).await;
        }
        let Some(project_id) = ensure_project(&client, &repo, spec, &mut report).await else {
            continue;
        };
        report.fields_created += ensure_fields(&client, &project_id, spec, today).await;
        report.projects.push((spec.title.clone(), project_id));
    }

    if !report.projects.is_empty() {
        write_project_ids(
            &options.output,
            report.projects.iter().map(|(t, id)| (t.as_str(), id.as_str())),
        )?;
    }
    let status = report.status(planned);
    std::fs::write(status_path(&options.output), status.as_str())?;

    info!(
        created = report.created,
        reused = report.reused,
        fields_created = report.fields_created,
        status = status.as_str(),
        "Project setup completed"
    );
    Ok(report)
}

fn status_path(ids_path: &Path) -> PathBuf {
    ids_path.with_file_name("project_status.txt")
}

async fn ensure_project(
    client: &GraphqlClient,
    repo: &RepositoryInfo,
    spec: &ProjectSpec,
    report: &mut ProjectsReport,
) -> Option<String> {
    if let Some(existing) = repo.find_project(&spec.title) {
        info!(title = %spec.title, id = %existing.id, "Project already exists, reusing");
        report.reused += 1;
        return Some(existing.id.clone());
    }
    match client.create_project(&spec.title, repo).await {
        Ok(project) => {
            report.created += 1;
            Some(project.id)
        }
        Err(e) => {
            warn!(title = %spec.title, error = %e, "Failed to create project");
            None
        }
    }
}

async fn ensure_fields(
    client: &GraphqlClient,
    project_id: &str,
    spec: &ProjectSpec,
    today: NaiveDate,
) -> usize {
    if spec.fields.is_empty() {
        return 0;
    }
    let existing = match client.project_fields(project_id).await {
        Ok(fields) => fields,
        Err(e) => {
            warn!(project = %spec.title, error = %e, "Could not list project fields");
            return 0;
        }
    };

    let mut created = 0;
    for field in &spec.fields {
        if existing.contains_key(&field.name) {
            info!(project = %spec.title, field = %field.name, "Field already exists");
            continue;
        }
        let options = expand_options(&field.options, today);
        match client
            .create_single_select_field(project_id, &field.name, &options)
            .await
        {
            Ok(_) => created += 1,
            Err(e) => warn!(project = %spec.title, field = %field.name, error = %e, "Failed to create field"),
        }
    }
    created
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sprint_options_cross_month() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 29).unwrap();
        let sprints = sprint_options(start);
        assert_eq!(sprints.len(), 13);
        assert_eq!(sprints[0], "Sprint 1 (1/29-2/4)");
        assert_eq!(sprints[1], "Sprint 2 (2/5-2/11)");
        assert_eq!(sprints[12], "Sprint 13 (4/22-4/28)");
    }

    #[test]
    fn test_expand_options() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let plain = vec!["1".to_string(), "2".to_string()];
        assert_eq!(expand_options(&plain, today), plain);

        let mixed = vec!["Backlog".to_string(), SPRINTS_PLACEHOLDER.to_string()];
        let expanded = expand_options(&mixed, today);
        assert_eq!(expanded.len(), 14);
        assert_eq!(expanded[0], "Backlog");
        assert_eq!(expanded[1], "Sprint 1 (6/3-6/9)");
    }

    #[test]
    fn test_status() {
        let report = ProjectsReport {
            reused: 3,
            ..Default::default()
        };
        assert_eq!(report.status(3), ProjectStatus::AllSkipped);
        let report = ProjectsReport {
            reused: 2,
            created: 1,
            ..Default::default()
        };
        assert_eq!(report.status(3).as_str(), "CREATED");
    }

    #[test]
    fn test_default_plan_matches_default_kinds() {
        let plan = ProjectPlan::default();
        let kinds = crate::config::IssueKindsConfig::default();
        for kind in &kinds.kinds {
            let project = kind.project_name.as_deref().unwrap();
            assert!(plan.projects.iter().any(|p| p.title == project));
        }
        assert_eq!(
            status_path(Path::new("out/project_ids.txt")),
            PathBuf::from("out/project_status.txt")
        );
    }
}
