//! CSV issue rows.

use crate::Result;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// One row of a `title,body,labels` issue CSV.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IssueRow {
    pub title: String,
    #[serde(default)]
    pub body: String,
    /// Comma-separated, possibly wrapped in quotes.
    #[serde(default)]
    pub labels: String,
}

/// Load issue rows from `path`.
///
/// A missing file yields an empty list; rows with a blank title are dropped.
pub fn load_issue_rows(path: &Path, kind: &str) -> Result<Vec<IssueRow>> {
    if !path.exists() {
        warn!(path = %path.display(), kind, "CSV file not found");
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for record in reader.deserialize::<IssueRow>() {
        let row = record?;
        if row.title.trim().is_empty() {
            skipped += 1;
            continue;
        }
        rows.push(row);
    }

    if skipped > 0 {
        warn!(kind, skipped, "Skipped rows without a title");
    }
    info!(kind, loaded = rows.len(), path = %path.display(), "Loaded issue rows");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_csv(name: &str, contents: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("repo-seeder-csv-{}-{name}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("issues.csv");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_missing_file_is_empty() {
        let rows = load_issue_rows(Path::new("/definitely/not/here.csv"), "task").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_blank_titles_are_dropped() {
        let path = temp_csv(
            "blank",
            "title,body,labels\nSet up CI,Configure it,\"task,Required\"\n  ,orphan body,\nWrite docs,,\n",
        );
        let rows = load_issue_rows(&path, "task").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].labels, "task,Required");
        assert_eq!(rows[1].title, "Write docs");
        assert_eq!(rows[1].body, "");
    }

    #[test]
    fn test_missing_optional_columns() {
        let path = temp_csv("title-only", "title\nOnly a title\n");
        let rows = load_issue_rows(&path, "kpt").unwrap();
        assert_eq!(
            rows,
            vec![IssueRow {
                title: "Only a title".into(),
                ..Default::default()
            }]
        );
    }
}
