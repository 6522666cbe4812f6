//! Issues returned by the platform.

use super::request::IssueKind;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssueLabel {
    pub name: String,
}

/// A successfully created issue.
///
/// `node_id` is the GraphQL global id needed for project linking; `kind` is
/// copied from the request that produced the issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIssue {
    pub id: u64,
    pub node_id: String,
    pub number: u64,
    pub title: String,
    pub html_url: String,
    pub labels: Vec<String>,
    pub kind: IssueKind,
}

/// Wire shape of the 201 response body (only the fields we use).
#[derive(Debug, Deserialize)]
pub(crate) struct IssueResponse {
    pub id: u64,
    pub node_id: String,
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub labels: Vec<IssueLabel>,
}

impl IssueResponse {
    pub(crate) fn into_created(self, kind: IssueKind) -> CreatedIssue {
        CreatedIssue {
            id: self.id,
            node_id: self.node_id,
            number: self.number,
            title: self.title,
            html_url: self.html_url,
            labels: self.labels.into_iter().map(|l| l.name).collect(),
            kind,
        }
    }
}

impl CreatedIssue {
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_response_parses_github_shape() {
        let body = r#"{
            "id": 1, "node_id": "I_kwDOA", "number": 42,
            "title": "Task001: Set up CI",
            "html_url": "https://github.com/acme/app/issues/42",
            "labels": [{"id": 9, "name": "task"}, {"id": 10, "name": "Required"}],
            "state": "open"
        }"#;
        let parsed: IssueResponse = serde_json::from_str(body).unwrap();
        let issue = parsed.into_created(IssueKind::new("task"));
        assert_eq!(issue.number, 42);
        assert_eq!(issue.node_id, "I_kwDOA");
        assert!(issue.has_label("Required"));
        assert_eq!(issue.kind.as_str(), "task");
    }
}
