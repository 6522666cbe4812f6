//! 批处理模块：分批、顺序执行、失败重试与项目关联。
//!
//! # Batch Pipeline Module
//!
//! Turns an ordered list of pending issue requests into created issues while
//! staying under the platform's rate limit.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`split`] / [`estimate_completion`] | Fixed-size batches and a pre-run ETA |
//! | [`BatchPipeline`] | Drives an [`IssueCreator`](crate::client::IssueCreator) over every batch |
//! | [`BatchPipeline::retry_failed`] | Bounded sweep over the failed partition |
//! | [`Linker`] | Best-effort project association of created issues |
//!
//! ## Ordering
//!
//! Items are created strictly one after another: within a batch in input
//! order, batches in order, with `batch_pause` between batches (never after
//! the last). Every submitted request ends up either created or in the
//! failed partition.
//!
//! ## Example
//!
//! ```rust
//! use repo_seeder::batch::{estimate_completion, split};
//! use std::time::Duration;
//!
//! let items: Vec<u32> = (0..23).collect();
//! let sizes: Vec<usize> = split(&items, 10).iter().map(|b| b.len()).collect();
//! assert_eq!(sizes, vec![10, 10, 3]);
//!
//! let eta = estimate_completion(23, 10, Duration::from_secs(1), Duration::from_secs(15));
//! assert_eq!(eta, Duration::from_secs(53));
//! ```

mod driver;
mod linker;
mod retry;
mod splitter;

pub use driver::{BatchOutcome, BatchPipeline, PipelineState};
pub use linker::Linker;
pub use retry::RetryOutcome;
pub use splitter::{batch_count, estimate_completion, split, Batch};
