//! 类型模块：定义批量创建流水线中流转的核心数据类型。
//!
//! # Types Module
//!
//! Typed records that flow through the seeding pipeline. External data (CSV rows,
//! REST responses) is converted into these types at the boundary, so the batch
//! machinery never touches untyped JSON.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`IssueRequest`] | Creation body sent to the REST endpoint |
//! | [`IssueKind`] | Category tag (e.g. `task`, `kpt`) used for linking |
//! | [`PendingRequest`] | Ordered `(payload, kind)` unit of work |
//! | [`CreatedIssue`] | Result of a successful creation |
//!
//! ## Example
//!
//! ```rust
//! use repo_seeder::types::{IssueKind, IssueRequest, PendingRequest};
//!
//! let request = PendingRequest::new(
//!     IssueRequest::new("Task001: Set up CI", "Configure the pipeline")
//!         .with_labels(vec!["task".to_string()]),
//!     IssueKind::new("task"),
//! );
//! assert_eq!(request.kind().as_str(), "task");
//! ```

pub mod issue;
pub mod request;

pub use issue::{CreatedIssue, IssueLabel};
pub use request::{IssueKind, IssueRequest, PendingRequest};
