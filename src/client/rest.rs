//! REST issue creation (single item, bounded retries).

use crate::config::SeederConfig;
use crate::resilience::{classify_status, AttemptEvent, Decision, RateLimitPolicy, RateLimitSnapshot, ResponseClass};
use crate::transport::{HttpTransport, RestTransport};
use crate::types::issue::IssueResponse;
use crate::types::PendingRequest;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::outcome::{CreateFailure, CreateOutcome, IssueCreator, Slot};

/// Creates issues through `POST /repos/{owner}/{repo}/issues`.
///
/// Generic over the transport so the attempt loop can be scripted in tests;
/// production code uses the pooled [`HttpTransport`].
pub struct IssueClient<T: RestTransport = HttpTransport> {
    transport: Arc<T>,
    policy: RateLimitPolicy,
    issues_path: String,
}

impl<T: RestTransport> IssueClient<T> {
    pub fn new(transport: Arc<T>, config: &SeederConfig) -> Self {
        Self {
            transport,
            policy: RateLimitPolicy::from_settings(&config.settings),
            issues_path: format!("/repos/{}/issues", config.repository()),
        }
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    async fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl<T: RestTransport> IssueCreator for IssueClient<T> {
    async fn create(&self, request: &PendingRequest, slot: Slot) -> CreateOutcome {
        // Cap steady-state request rate inside a batch.
        if !slot.is_first() {
            self.pause(self.policy.request_delay).await;
        }

        let body = serde_json::to_value(request.payload()).map_err(|e| CreateFailure::Encoding {
            message: e.to_string(),
        })?;
        let kind = request.kind();
        let title = request.payload().short_title();

        for attempt in 0..self.policy.max_attempts {
            let resp = match self.transport.post_json(&self.issues_path, &body).await {
                Ok(resp) => resp,
                Err(e) => {
                    warn!(%slot, %kind, attempt = attempt + 1, error = %e, "Issue creation transport error");
                    match self.policy.decide(attempt, AttemptEvent::TransportError) {
                        Decision::Retry { delay } => {
                            self.pause(delay).await;
                            continue;
                        }
                        Decision::Fail => {
                            return Err(CreateFailure::Transport {
                                message: e.to_string(),
                            })
                        }
                    }
                }
            };

            match classify_status(resp.status) {
                ResponseClass::Created => {
                    RateLimitSnapshot::from_headers(&resp.headers).report();
                    return match serde_json::from_str::<IssueResponse>(&resp.body) {
                        Ok(parsed) => {
                            if attempt > 0 {
                                info!(%slot, %kind, retry = attempt, title = %title, "Issue created");
                            } else {
                                info!(%slot, %kind, title = %title, "Issue created");
                            }
                            Ok(parsed.into_created(kind.clone()))
                        }
                        Err(e) => {
                            error!(%slot, %kind, error = %e, "Issue created but response unreadable");
                            Err(CreateFailure::Unreadable {
                                message: e.to_string(),
                            })
                        }
                    };
                }
                ResponseClass::RateLimited => {
                    let snapshot = RateLimitSnapshot::from_headers(&resp.headers);
                    let retry_after = RateLimitPolicy::retry_after(&resp.headers);
                    let event = AttemptEvent::RateLimited {
                        retry_after,
                        snapshot: &snapshot,
                    };
                    if let Decision::Retry { delay } = self.policy.decide(attempt, event) {
                        warn!(
                            %slot,
                            attempt = attempt + 1,
                            retry_after_secs = retry_after.map(|d| d.as_secs()),
                            remaining = snapshot.remaining,
                            wait_secs = delay.as_secs_f64(),
                            "Rate limit hit, waiting"
                        );
                        self.pause(delay).await;
                    }
                }
                ResponseClass::ServerError => {
                    if let Decision::Retry { delay } =
                        self.policy.decide(attempt, AttemptEvent::ServerError)
                    {
                        warn!(
                            %slot,
                            http_status = resp.status,
                            attempt = attempt + 1,
                            wait_secs = delay.as_secs_f64(),
                            "Server error, retrying"
                        );
                        self.pause(delay).await;
                    }
                }
                ResponseClass::Rejected => {
                    warn!(
                        %slot,
                        %kind,
                        http_status = resp.status,
                        body = %resp.body_excerpt(),
                        "Issue creation failed"
                    );
                    return Err(CreateFailure::Rejected {
                        status: resp.status,
                        message: resp.body_excerpt(),
                    });
                }
            }
        }

        warn!(%slot, %kind, attempts = self.policy.max_attempts, title = %title, "Attempt budget exhausted");
        Err(CreateFailure::Exhausted {
            attempts: self.policy.max_attempts,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RateLimitBody {
    resources: RateLimitResources,
}

#[derive(Debug, Deserialize)]
struct RateLimitResources {
    core: CoreQuota,
}

#[derive(Debug, Deserialize)]
struct CoreQuota {
    #[serde(default)]
    remaining: u64,
    #[serde(default)]
    limit: u64,
    #[serde(default)]
    reset: i64,
}

/// Below this many remaining core requests the run start is flagged.
const LOW_INITIAL_QUOTA: u64 = 100;

/// Query `GET /rate_limit` before a run and log the core quota.
pub async fn check_initial_rate_limit(transport: &HttpTransport) -> Result<RateLimitSnapshot> {
    let resp = transport.get("/rate_limit").await?;
    if resp.status != 200 {
        return Err(Error::Remote {
            status: resp.status,
            message: resp.body_excerpt(),
        });
    }
    let body: RateLimitBody = serde_json::from_str(&resp.body)?;
    let core = body.resources.core;
    let snapshot = RateLimitSnapshot {
        remaining: Some(core.remaining),
        limit: Some(core.limit),
        reset: (core.reset > 0).then_some(core.reset),
    };
    info!(
        remaining = core.remaining,
        limit = core.limit,
        resets_at = %snapshot.reset_time().unwrap_or_default(),
        "Initial rate limit"
    );
    if core.remaining < LOW_INITIAL_QUOTA {
        warn!(
            remaining = core.remaining,
            "Low rate limit remaining, consider waiting until reset"
        );
    }
    Ok(snapshot)
}
