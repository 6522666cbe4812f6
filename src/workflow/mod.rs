//! 工作流模块：Issue、项目、讨论与 README 链接的端到端流程。
//!
//! Each workflow takes the run's [`SeederConfig`](crate::config::SeederConfig)
//! by reference and builds its own transport and clients from it.

pub mod discussions;
pub mod issues;
pub mod projects;
pub mod readme;

pub use discussions::{DiscussionsOptions, DiscussionsReport};
pub use issues::IssuesOptions;
pub use projects::{ProjectPlan, ProjectStatus, ProjectsOptions, ProjectsReport};
pub use readme::{LinkPlan, ReadmeOptions, ReadmeReport};
