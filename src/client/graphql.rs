//! GraphQL v4 operations: projects, project fields, discussions, linking.

use crate::config::SeederConfig;
use crate::transport::HttpTransport;
use crate::types::CreatedIssue;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::outcome::ProjectLinker;

const REPOSITORY_INFO: &str = r#"
query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    id
    owner { id }
    projectsV2(first: 100) { nodes { id title number url } }
  }
}"#;

const CREATE_PROJECT: &str = r#"
mutation($ownerId: ID!, $repositoryId: ID!, $title: String!) {
  createProjectV2(input: {ownerId: $ownerId, repositoryId: $repositoryId, title: $title}) {
    projectV2 { id title number url }
  }
}"#;

const PROJECT_FIELDS: &str = r#"
query($projectId: ID!) {
  node(id: $projectId) {
    ... on ProjectV2 {
      fields(first: 100) {
        nodes { ... on ProjectV2SingleSelectField { id name } }
      }
    }
  }
}"#;

const CREATE_SINGLE_SELECT_FIELD: &str = r#"
mutation($projectId: ID!, $name: String!, $dataType: ProjectV2CustomFieldType!, $options: [ProjectV2SingleSelectFieldOptionInput!]) {
  createProjectV2Field(input: {projectId: $projectId, name: $name, dataType: $dataType, singleSelectOptions: $options}) {
    projectV2Field { ... on ProjectV2SingleSelectField { id name } }
  }
}"#;

const DISCUSSION_CATEGORIES: &str = r#"
query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    discussionCategories(first: 20) { nodes { id name slug } }
  }
}"#;

const EXISTING_DISCUSSIONS: &str = r#"
query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    discussions(first: 100) { nodes { id title url } }
  }
}"#;

const RECENT_ISSUES: &str = r#"
query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    issues(first: 100, orderBy: {field: CREATED_AT, direction: DESC}) { nodes { number title url } }
  }
}"#;

const CREATE_DISCUSSION: &str = r#"
mutation($repositoryId: ID!, $title: String!, $body: String!, $categoryId: ID!) {
  createDiscussion(input: {repositoryId: $repositoryId, title: $title, body: $body, categoryId: $categoryId}) {
    discussion { id title url }
  }
}"#;

const ADD_PROJECT_ITEM: &str = r#"
mutation($projectId: ID!, $contentId: ID!) {
  addProjectV2ItemById(input: {projectId: $projectId, contentId: $contentId}) {
    item { id }
  }
}"#;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectSummary {
    pub id: String,
    pub title: String,
    pub number: u64,
    #[serde(default)]
    pub url: String,
}

/// Repository ids needed by the project mutations, plus the projects it already has.
#[derive(Debug, Clone)]
pub struct RepositoryInfo {
    pub repository_id: String,
    pub owner_id: String,
    pub existing_projects: Vec<ProjectSummary>,
}

impl RepositoryInfo {
    pub fn find_project(&self, title: &str) -> Option<&ProjectSummary> {
        self.existing_projects.iter().find(|p| p.title == title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiscussionCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

impl DiscussionCategory {
    /// Case-insensitive match on name or slug.
    pub fn matches(&self, wanted: &str) -> bool {
        self.name.eq_ignore_ascii_case(wanted) || self.slug.eq_ignore_ascii_case(wanted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiscussionSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssueSummary {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct Nodes<T> {
    nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryNode {
    id: String,
    owner: IdOnly,
    projects_v2: Nodes<ProjectSummary>,
}

#[derive(Debug, Deserialize)]
struct IdOnly {
    id: String,
}

/// Field nodes that are not single-select come back as `{}`.
#[derive(Debug, Deserialize)]
struct FieldNode {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FieldsNode {
    fields: Nodes<FieldNode>,
}

/// GraphQL client scoped to one repository.
pub struct GraphqlClient {
    transport: Arc<HttpTransport>,
    owner: String,
    name: String,
}

impl GraphqlClient {
    pub fn new(transport: Arc<HttpTransport>, config: &SeederConfig) -> Self {
        Self {
            transport,
            owner: config.owner().to_string(),
            name: config.repo_name().to_string(),
        }
    }

    fn repo_vars(&self) -> serde_json::Value {
        json!({ "owner": self.owner, "name": self.name })
    }

    /// Run `query` and deserialize the value at `pointer` inside `data`.
    async fn request<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
        pointer: &str,
    ) -> Result<T> {
        let data = self.transport.graphql(query, Some(variables)).await?;
        let value = data.pointer(pointer).cloned().ok_or_else(|| Error::GraphQl {
            message: format!("response is missing {pointer}"),
        })?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn repository_info(&self) -> Result<RepositoryInfo> {
        let repo: RepositoryNode = self
            .request(REPOSITORY_INFO, self.repo_vars(), "/repository")
            .await?;
        Ok(RepositoryInfo {
            repository_id: repo.id,
            owner_id: repo.owner.id,
            existing_projects: repo.projects_v2.nodes,
        })
    }

    pub async fn create_project(&self, title: &str, repo: &RepositoryInfo) -> Result<ProjectSummary> {
        let vars = json!({
            "ownerId": repo.owner_id,
            "repositoryId": repo.repository_id,
            "title": title,
        });
        let project: ProjectSummary = self
            .request(CREATE_PROJECT, vars, "/createProjectV2/projectV2")
            .await?;
        info!(title = %project.title, number = project.number, url = %project.url, "Created project");
        Ok(project)
    }

    /// Single-select fields of a project, by name.
    pub async fn project_fields(&self, project_id: &str) -> Result<HashMap<String, String>> {
        let node: FieldsNode = self
            .request(PROJECT_FIELDS, json!({ "projectId": project_id }), "/node")
            .await?;
        Ok(node
            .fields
            .nodes
            .into_iter()
            .filter_map(|f| Some((f.name?, f.id?)))
            .collect())
    }

    pub async fn create_single_select_field(
        &self,
        project_id: &str,
        name: &str,
        options: &[String],
    ) -> Result<String> {
        let options: Vec<_> = options
            .iter()
            .map(|o| json!({ "name": o, "color": "GRAY", "description": "" }))
            .collect();
        let vars = json!({
            "projectId": project_id,
            "name": name,
            "dataType": "SINGLE_SELECT",
            "options": options,
        });
        let id: String = self
            .request(
                CREATE_SINGLE_SELECT_FIELD,
                vars,
                "/createProjectV2Field/projectV2Field/id",
            )
            .await?;
        info!(field = name, options = options.len(), "Created project field");
        Ok(id)
    }

    pub async fn discussion_categories(&self) -> Result<Vec<DiscussionCategory>> {
        let nodes: Nodes<DiscussionCategory> = self
            .request(
                DISCUSSION_CATEGORIES,
                self.repo_vars(),
                "/repository/discussionCategories",
            )
            .await?;
        Ok(nodes.nodes)
    }

    pub async fn existing_discussions(&self) -> Result<Vec<DiscussionSummary>> {
        let nodes: Nodes<DiscussionSummary> = self
            .request(EXISTING_DISCUSSIONS, self.repo_vars(), "/repository/discussions")
            .await?;
        Ok(nodes.nodes)
    }

    /// The 100 most recently created issues.
    pub async fn recent_issues(&self) -> Result<Vec<IssueSummary>> {
        let nodes: Nodes<IssueSummary> = self
            .request(RECENT_ISSUES, self.repo_vars(), "/repository/issues")
            .await?;
        Ok(nodes.nodes)
    }

    pub async fn create_discussion(
        &self,
        repository_id: &str,
        category_id: &str,
        title: &str,
        body: &str,
    ) -> Result<DiscussionSummary> {
        let vars = json!({
            "repositoryId": repository_id,
            "title": title,
            "body": body,
            "categoryId": category_id,
        });
        self.request(CREATE_DISCUSSION, vars, "/createDiscussion/discussion")
            .await
    }
}

#[async_trait]
impl ProjectLinker for GraphqlClient {
    async fn add_to_project(&self, project_id: &str, issue: &CreatedIssue) -> Result<Option<String>> {
        let vars = json!({ "projectId": project_id, "contentId": issue.node_id });
        let data = self.transport.graphql(ADD_PROJECT_ITEM, Some(vars)).await?;
        let item_id = data
            .pointer("/addProjectV2ItemById/item/id")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        debug!(issue = issue.number, item = ?item_id, "Project item added");
        Ok(item_id)
    }
}
