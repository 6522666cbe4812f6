//! `project_ids.txt`: one `name:id` pair per line.

use crate::Result;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Project titles mapped to their node ids.
pub type ProjectIds = BTreeMap<String, String>;

/// Parse `name:id` lines. Blank and malformed lines are skipped.
pub fn parse_project_ids(contents: &str) -> ProjectIds {
    contents
        .lines()
        .filter_map(|line| {
            let (name, id) = line.trim().rsplit_once(':')?;
            let (name, id) = (name.trim(), id.trim());
            (!name.is_empty() && !id.is_empty()).then(|| (name.to_string(), id.to_string()))
        })
        .collect()
}

/// Read the file at `path`; a missing file yields an empty map.
pub fn read_project_ids(path: &Path) -> Result<ProjectIds> {
    if !path.exists() {
        warn!(path = %path.display(), "Project ids file not found, issues will not be linked");
        return Ok(ProjectIds::new());
    }
    let ids = parse_project_ids(&std::fs::read_to_string(path)?);
    info!(path = %path.display(), projects = ids.len(), "Loaded project ids");
    Ok(ids)
}

/// Write `name:id` lines in the given order.
pub fn write_project_ids<'a>(
    path: &Path,
    entries: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<()> {
    let body = entries
        .into_iter()
        .map(|(name, id)| format!("{name}:{id}"))
        .collect::<Vec<_>>()
        .join("\n");
    std::fs::write(path, body)?;
    Ok(())
}
