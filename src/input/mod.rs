//! 输入模块：CSV 读取、请求准备与项目 ID 文件。
//!
//! Everything read from disk before a run: issue CSVs per kind, the
//! `project_ids.txt` handoff file, and the grouping of created issues by kind
//! for linking.

pub mod csv_loader;
pub mod prepare;
pub mod project_ids;

pub use csv_loader::{load_issue_rows, IssueRow};
pub use prepare::{classify, prepare_all, KindPreparer};
pub use project_ids::{parse_project_ids, read_project_ids, write_project_ids, ProjectIds};
