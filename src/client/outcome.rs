use crate::types::{CreatedIssue, PendingRequest};
use crate::Result;
use async_trait::async_trait;
use std::fmt;

/// Position of an item inside the batch being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub index: usize,
    pub total: usize,
}

impl Slot {
    pub fn new(index: usize, total: usize) -> Self {
        Self { index, total }
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.index + 1, self.total)
    }
}

/// Why an item ended up in the failed partition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CreateFailure {
    #[error("rejected with HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("transport error on final attempt: {message}")]
    Transport { message: String },

    #[error("gave up after {attempts} attempts")]
    Exhausted { attempts: u32 },

    #[error("created but response unreadable: {message}")]
    Unreadable { message: String },

    #[error("request could not be encoded: {message}")]
    Encoding { message: String },
}

/// Result of one item's creation, including all of its retries.
pub type CreateOutcome = std::result::Result<CreatedIssue, CreateFailure>;

/// Creates one remote issue, owning its own attempt budget and pacing.
#[async_trait]
pub trait IssueCreator: Send + Sync {
    async fn create(&self, request: &PendingRequest, slot: Slot) -> CreateOutcome;
}

/// Associates a created issue with a project.
///
/// `Ok(None)` means the call went through but returned no item id.
#[async_trait]
pub trait ProjectLinker: Send + Sync {
    async fn add_to_project(&self, project_id: &str, issue: &CreatedIssue) -> Result<Option<String>>;
}
