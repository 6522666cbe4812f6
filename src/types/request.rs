//! Pending creation requests.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of a `POST /repos/{owner}/{repo}/issues` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRequest {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

impl IssueRequest {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            labels: Vec::new(),
        }
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    /// Title shortened for log lines (char-boundary safe).
    pub fn short_title(&self) -> String {
        const MAX: usize = 50;
        if self.title.chars().count() <= MAX {
            self.title.clone()
        } else {
            let cut: String = self.title.chars().take(MAX).collect();
            format!("{cut}...")
        }
    }
}

/// Category tag of a request (`task`, `test`, `kpt`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueKind(String);

impl IssueKind {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One unit of work for the pipeline. Immutable once built; order is significant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    payload: IssueRequest,
    kind: IssueKind,
}

impl PendingRequest {
    pub fn new(payload: IssueRequest, kind: IssueKind) -> Self {
        Self { payload, kind }
    }

    pub fn payload(&self) -> &IssueRequest {
        &self.payload
    }

    pub fn kind(&self) -> &IssueKind {
        &self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_title_truncates_on_char_boundary() {
        let req = IssueRequest::new("タ".repeat(60), "");
        let short = req.short_title();
        assert!(short.ends_with("..."));
        assert_eq!(short.chars().count(), 53);
    }

    #[test]
    fn test_labels_omitted_when_empty() {
        let json = serde_json::to_value(IssueRequest::new("a", "b")).unwrap();
        assert!(json.get("labels").is_none());
        let json = serde_json::to_value(
            IssueRequest::new("a", "b").with_labels(vec!["task".into()]),
        )
        .unwrap();
        assert_eq!(json["labels"], serde_json::json!(["task"]));
    }
}
