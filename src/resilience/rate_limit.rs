use chrono::{DateTime, Local};
use reqwest::header::HeaderMap;
use tracing::{info, warn};

/// Below this share of remaining quota a warning is logged.
const LOW_QUOTA_PERCENT: f64 = 20.0;
/// An informational snapshot is logged each time `remaining` crosses a multiple of this.
const CHECKPOINT_EVERY: u64 = 100;

/// Quota facts parsed from `x-ratelimit-*` headers. Transient, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    pub remaining: Option<u64>,
    pub limit: Option<u64>,
    /// Epoch seconds at which the window resets.
    pub reset: Option<i64>,
}

/// What a snapshot says about quota pressure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuotaStatus {
    /// Remaining quota under 20% of the limit.
    Low { percent: f64 },
    /// Remaining is a multiple of 100.
    Checkpoint { percent: f64 },
    Normal,
    Unknown,
}

impl RateLimitSnapshot {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            remaining: header_first(headers, &["x-ratelimit-remaining"]).and_then(|v| v.parse().ok()),
            limit: header_first(headers, &["x-ratelimit-limit"]).and_then(|v| v.parse().ok()),
            reset: header_first(headers, &["x-ratelimit-reset"]).and_then(|v| v.parse().ok()),
        }
    }

    pub fn percent_remaining(&self) -> Option<f64> {
        match (self.remaining, self.limit) {
            (Some(rem), Some(limit)) if limit > 0 => Some(rem as f64 / limit as f64 * 100.0),
            _ => None,
        }
    }

    pub fn status(&self) -> QuotaStatus {
        let (Some(remaining), Some(percent)) = (self.remaining, self.percent_remaining()) else {
            return QuotaStatus::Unknown;
        };
        if percent < LOW_QUOTA_PERCENT {
            QuotaStatus::Low { percent }
        } else if remaining % CHECKPOINT_EVERY == 0 {
            QuotaStatus::Checkpoint { percent }
        } else {
            QuotaStatus::Normal
        }
    }

    /// Reset time rendered in local time, if known.
    pub fn reset_time(&self) -> Option<String> {
        let reset = DateTime::from_timestamp(self.reset?, 0)?;
        Some(reset.with_timezone(&Local).format("%H:%M:%S").to_string())
    }

    /// Log quota pressure: warn when low, info on checkpoints.
    pub fn report(&self) -> QuotaStatus {
        let status = self.status();
        let remaining = self.remaining.unwrap_or_default();
        let limit = self.limit.unwrap_or_default();
        match status {
            QuotaStatus::Low { percent } => match self.reset_time() {
                Some(resets_at) => warn!(
                    remaining,
                    limit,
                    percent = %format!("{percent:.1}"),
                    resets_at = %resets_at,
                    "Rate limit warning"
                ),
                None => warn!(
                    remaining,
                    limit,
                    percent = %format!("{percent:.1}"),
                    "Rate limit warning"
                ),
            },
            QuotaStatus::Checkpoint { percent } => info!(
                remaining,
                limit,
                percent = %format!("{percent:.1}"),
                "Rate limit status"
            ),
            QuotaStatus::Normal | QuotaStatus::Unknown => {}
        }
        status
    }
}

/// Extract the first non-empty header value from a list of header names.
pub(crate) fn header_first(headers: &HeaderMap, names: &[&str]) -> Option<String> {
    for name in names {
        if let Some(v) = headers.get(*name) {
            if let Ok(s) = v.to_str() {
                let s = s.trim();
                if !s.is_empty() {
                    return Some(s.to_string());
                }
            }
        }
    }
    None
}
