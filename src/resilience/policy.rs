use crate::config::PipelineSettings;
use rand::Rng;
use reqwest::header::HeaderMap;
use std::time::Duration;

use super::rate_limit::{header_first, RateLimitSnapshot};

/// How a REST status is treated by the attempt loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    Created,
    RateLimited,
    ServerError,
    Rejected,
}

pub fn classify_status(status: u16) -> ResponseClass {
    match status {
        201 => ResponseClass::Created,
        403 | 429 => ResponseClass::RateLimited,
        500..=599 => ResponseClass::ServerError,
        _ => ResponseClass::Rejected,
    }
}

/// A retryable event observed on one attempt.
#[derive(Debug, Clone, Copy)]
pub enum AttemptEvent<'a> {
    RateLimited {
        retry_after: Option<Duration>,
        snapshot: &'a RateLimitSnapshot,
    },
    ServerError,
    TransportError,
}

/// Decision for how to proceed after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Retry { delay: Duration },
    Fail,
}

/// Wait-time policy for the issue client.
///
/// Explicit server guidance (`retry-after`) is always honored verbatim; the
/// exponential formula only covers "blocked without guidance".
#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    pub max_attempts: u32,
    pub request_delay: Duration,
    pub retry_delay: Duration,
    pub secondary_limit_delay: Duration,
    pub retry_after_margin: Duration,
    pub secondary_limit_remaining_threshold: Option<u64>,
}

impl RateLimitPolicy {
    pub fn from_settings(settings: &PipelineSettings) -> Self {
        Self {
            max_attempts: settings.max_retries.max(1),
            request_delay: settings.request_delay(),
            retry_delay: settings.retry_delay(),
            secondary_limit_delay: settings.secondary_limit_delay(),
            retry_after_margin: settings.retry_after_margin(),
            secondary_limit_remaining_threshold: settings.secondary_limit_remaining_threshold,
        }
    }

    /// Decide what to do after a retryable event on `attempt` (0-based).
    ///
    /// The final attempt never waits: nothing follows it.
    pub fn decide(&self, attempt: u32, event: AttemptEvent<'_>) -> Decision {
        if attempt.saturating_add(1) >= self.max_attempts {
            return Decision::Fail;
        }
        let delay = match event {
            AttemptEvent::RateLimited {
                retry_after,
                snapshot,
            } => {
                let jitter = rand::thread_rng().gen_range(0.8..=1.2);
                self.rate_limited_delay(attempt, retry_after, snapshot, jitter)
            }
            AttemptEvent::ServerError | AttemptEvent::TransportError => self.linear_delay(attempt),
        };
        Decision::Retry { delay }
    }

    /// Wait after a rate-limited response.
    ///
    /// `retry-after` wins (plus the configured margin). Otherwise
    /// `base * 2^(attempt / 2) * jitter`, with `base` the short delay on the
    /// first attempt and the secondary-limit delay afterwards.
    pub fn rate_limited_delay(
        &self,
        attempt: u32,
        retry_after: Option<Duration>,
        snapshot: &RateLimitSnapshot,
        jitter: f64,
    ) -> Duration {
        if let Some(hint) = retry_after {
            return hint.saturating_add(self.retry_after_margin);
        }
        let base = if attempt == 0 && !self.looks_like_secondary_limit(snapshot) {
            self.retry_delay
        } else {
            self.secondary_limit_delay
        };
        let factor = 2f64.powi((attempt / 2) as i32) * jitter;
        Duration::try_from_secs_f64(base.as_secs_f64() * factor).unwrap_or(Duration::MAX)
    }

    /// Heuristic: plenty of primary quota left yet blocked means a content-creation limit.
    pub fn looks_like_secondary_limit(&self, snapshot: &RateLimitSnapshot) -> bool {
        match (self.secondary_limit_remaining_threshold, snapshot.remaining) {
            (Some(threshold), Some(remaining)) => remaining > threshold,
            _ => false,
        }
    }

    /// `retry_delay * (attempt + 1)`, used for 5xx and transport errors.
    pub fn linear_delay(&self, attempt: u32) -> Duration {
        self.retry_delay.saturating_mul(attempt.saturating_add(1))
    }

    /// Best-effort parsing of the `Retry-After: <seconds>` form.
    pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
        let raw = header_first(headers, &["retry-after"])?;
        raw.parse::<u64>().ok().map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RateLimitPolicy {
        RateLimitPolicy::from_settings(&PipelineSettings::default())
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(201), ResponseClass::Created);
        assert_eq!(classify_status(403), ResponseClass::RateLimited);
        assert_eq!(classify_status(429), ResponseClass::RateLimited);
        assert_eq!(classify_status(502), ResponseClass::ServerError);
        assert_eq!(classify_status(200), ResponseClass::Rejected);
        assert_eq!(classify_status(422), ResponseClass::Rejected);
        assert_eq!(classify_status(404), ResponseClass::Rejected);
    }

    #[test]
    fn test_retry_after_hint_is_honored_verbatim() {
        let p = policy();
        let snap = RateLimitSnapshot::default();
        for attempt in 0..6 {
            let d = p.rate_limited_delay(attempt, Some(Duration::from_secs(7)), &snap, 1.2);
            assert_eq!(d, Duration::from_secs(7));
        }
    }

    #[test]
    fn test_retry_after_margin_is_added() {
        let mut settings = PipelineSettings::default();
        settings.retry_after_margin = 30.0;
        let p = RateLimitPolicy::from_settings(&settings);
        let d = p.rate_limited_delay(3, Some(Duration::from_secs(60)), &RateLimitSnapshot::default(), 1.0);
        assert_eq!(d, Duration::from_secs(90));
    }

    #[test]
    fn test_backoff_formula_without_hint() {
        let p = policy();
        let snap = RateLimitSnapshot::default();
        // attempt 0 uses the short delay: 120 * 2^0
        assert_eq!(p.rate_limited_delay(0, None, &snap, 1.0), Duration::from_secs(120));
        // attempt 1: 300 * 2^0
        assert_eq!(p.rate_limited_delay(1, None, &snap, 1.0), Duration::from_secs(300));
        // attempt 2 and 3: 300 * 2^1
        assert_eq!(p.rate_limited_delay(2, None, &snap, 1.0), Duration::from_secs(600));
        assert_eq!(p.rate_limited_delay(3, None, &snap, 1.0), Duration::from_secs(600));
        // attempt 4: 300 * 2^2, scaled by jitter
        let d = p.rate_limited_delay(4, None, &snap, 0.8);
        assert!((d.as_secs_f64() - 960.0).abs() < 1e-6);
    }

    #[test]
    fn test_decide_rate_limited_jitter_stays_in_bounds() {
        let p = policy();
        let snap = RateLimitSnapshot::default();
        for _ in 0..200 {
            let event = AttemptEvent::RateLimited {
                retry_after: None,
                snapshot: &snap,
            };
            match p.decide(2, event) {
                Decision::Retry { delay } => {
                    let secs = delay.as_secs_f64();
                    assert!((480.0..=720.0).contains(&secs), "delay {secs} out of range");
                }
                Decision::Fail => panic!("attempt 2 of 15 must be retried"),
            }
        }
    }

    #[test]
    fn test_secondary_limit_heuristic() {
        let mut settings = PipelineSettings::default();
        settings.secondary_limit_remaining_threshold = Some(3000);
        let p = RateLimitPolicy::from_settings(&settings);

        let plenty = RateLimitSnapshot {
            remaining: Some(4500),
            limit: Some(5000),
            reset: None,
        };
        assert!(p.looks_like_secondary_limit(&plenty));
        assert_eq!(p.rate_limited_delay(0, None, &plenty, 1.0), Duration::from_secs(300));

        let scarce = RateLimitSnapshot {
            remaining: Some(10),
            ..plenty
        };
        assert!(!p.looks_like_secondary_limit(&scarce));
        assert_eq!(p.rate_limited_delay(0, None, &scarce, 1.0), Duration::from_secs(120));

        // Disabled by default.
        assert!(!policy().looks_like_secondary_limit(&plenty));
    }

    #[test]
    fn test_server_and_transport_errors_back_off_linearly() {
        let p = policy();
        assert_eq!(
            p.decide(0, AttemptEvent::ServerError),
            Decision::Retry {
                delay: Duration::from_secs(120)
            }
        );
        assert_eq!(
            p.decide(2, AttemptEvent::TransportError),
            Decision::Retry {
                delay: Duration::from_secs(360)
            }
        );
        // Last attempt of a 15-attempt budget.
        assert_eq!(p.decide(14, AttemptEvent::TransportError), Decision::Fail);
    }

    #[test]
    fn test_final_attempt_never_waits() {
        let p = policy();
        let snap = RateLimitSnapshot::default();
        assert_eq!(p.decide(14, AttemptEvent::ServerError), Decision::Fail);
        let event = AttemptEvent::RateLimited {
            retry_after: Some(Duration::from_secs(60)),
            snapshot: &snap,
        };
        assert_eq!(p.decide(14, event), Decision::Fail);
        assert!(matches!(
            p.decide(13, AttemptEvent::ServerError),
            Decision::Retry { .. }
        ));
    }

    #[test]
    fn test_retry_after_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(RateLimitPolicy::retry_after(&headers), None);
        headers.insert("retry-after", "42".parse().unwrap());
        assert_eq!(
            RateLimitPolicy::retry_after(&headers),
            Some(Duration::from_secs(42))
        );
        headers.insert("retry-after", "Wed, 21 Oct 2015 07:28:00 GMT".parse().unwrap());
        assert_eq!(RateLimitPolicy::retry_after(&headers), None);
    }
}
