//! Best-effort project linking.

use crate::client::ProjectLinker;
use crate::config::PipelineSettings;
use crate::types::CreatedIssue;
use std::time::Duration;
use tracing::{info, warn};

const PROGRESS_EVERY: usize = 20;

/// Adds created issues to a project, one call each, no retry and no rollback.
pub struct Linker<L: ProjectLinker> {
    client: L,
    link_delay: Duration,
}

impl<L: ProjectLinker> Linker<L> {
    pub fn new(client: L, settings: &PipelineSettings) -> Self {
        Self {
            client,
            link_delay: settings.link_delay(),
        }
    }

    /// Returns how many issues were linked. Individual failures are logged and skipped.
    pub async fn link(&self, created: &[CreatedIssue], project_id: &str, project_name: &str) -> usize {
        if created.is_empty() {
            return 0;
        }
        info!(project = project_name, items = created.len(), "Adding issues to project");

        let total = created.len();
        let mut linked = 0;
        for (i, issue) in created.iter().enumerate() {
            if i > 0 && !self.link_delay.is_zero() {
                tokio::time::sleep(self.link_delay).await;
            }
            match self.client.add_to_project(project_id, issue).await {
                Ok(Some(_)) => linked += 1,
                Ok(None) => warn!(issue = issue.number, project = project_name, "Project returned no item id"),
                Err(e) => warn!(issue = issue.number, project = project_name, error = %e, "Failed to add issue to project"),
            }
            if (i + 1) % PROGRESS_EVERY == 0 {
                info!(project = project_name, done = i + 1, total, "Linking progress");
            }
        }

        info!(project = project_name, linked, total, "Project linking finished");
        linked
    }
}
