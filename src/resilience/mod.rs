//! 弹性模块：限流信号解析与重试等待策略。
//!
//! # Resilience Module
//!
//! Rate-limit awareness for the issue client.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`rate_limit`] | [`RateLimitSnapshot`] parsed from `x-ratelimit-*` headers, quota warnings |
//! | [`policy`] | [`RateLimitPolicy`]: wait durations for rate limits, 5xx and transport errors |
//!
//! ```rust
//! use repo_seeder::config::PipelineSettings;
//! use repo_seeder::resilience::{RateLimitPolicy, RateLimitSnapshot};
//! use std::time::Duration;
//!
//! let policy = RateLimitPolicy::from_settings(&PipelineSettings::default());
//! let wait = policy.rate_limited_delay(
//!     3,
//!     Some(Duration::from_secs(60)),
//!     &RateLimitSnapshot::default(),
//!     1.0,
//! );
//! assert_eq!(wait, Duration::from_secs(60));
//! ```

pub mod policy;
pub mod rate_limit;

pub use policy::{classify_status, AttemptEvent, Decision, RateLimitPolicy, ResponseClass};
pub use rate_limit::{QuotaStatus, RateLimitSnapshot};
