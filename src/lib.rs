//! # repo-seeder
//!
//! 这是一个面向 GitHub 仓库的批量初始化工具：按批次、限流感知地创建 Issue、项目与讨论，并回填 README 链接。
//!
//! Bulk seeding of issues, projects and discussions for a GitHub repository,
//! driven by CSV and markdown input files.
//!
//! ## Overview
//!
//! The core is a batched, rate-limited, retrying request pipeline. An ordered
//! list of pending issue requests is split into fixed-size batches; every item
//! is created sequentially by an [`client::IssueClient`] that owns its own
//! attempt budget and honors the platform's `retry-after` guidance. Failures
//! are swept again in bounded rounds, and created issues are linked to their
//! project on a best-effort basis.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use repo_seeder::config::SeederConfig;
//! use repo_seeder::workflow::{issues, IssuesOptions};
//!
//! #[tokio::main]
//! async fn main() -> repo_seeder::Result<()> {
//!     let config = SeederConfig::from_env()?;
//!     let summary = issues::run(&config, &IssuesOptions::default()).await?;
//!     println!("success rate {:.1}%", summary.success_rate());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Credentials, pipeline settings, issue kinds |
//! | [`transport`] | Pooled HTTP transport for REST and GraphQL |
//! | [`resilience`] | Rate-limit snapshots and the wait policy |
//! | [`client`] | Issue creation, GraphQL operations, project linking |
//! | [`batch`] | Splitter, pipeline driver, retry sweep, linker |
//! | [`input`] | CSV loading, request preparation, project id files |
//! | [`workflow`] | End-to-end issues / projects / discussions / README link runs |
//! | [`report`] | Run summary and result file |
//! | [`types`] | Typed requests and created issues |

pub mod batch;
pub mod client;
pub mod config;
pub mod input;
pub mod report;
pub mod resilience;
pub mod transport;
pub mod types;
pub mod workflow;

pub use client::{CreateFailure, CreateOutcome, IssueClient, IssueCreator, ProjectLinker, Slot};
pub use config::{PipelineSettings, SeederConfig};
pub use types::{CreatedIssue, IssueKind, IssueRequest, PendingRequest};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
