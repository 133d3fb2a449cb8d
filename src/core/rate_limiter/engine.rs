//! Rate limit decision engine
//!
//! Resolves which tier applies to a request, queries the active counter, and
//! applies the store-failure policy. The HTTP middleware is a thin wrapper
//! around [`RateLimitEngine::check`].

use super::health::StoreHealth;
use super::key::build_key;
use super::local::LocalLimiter;
use super::path::resolve_pattern;
use super::sliding_window::SlidingWindowLimiter;
use super::token_bucket::TokenBucketLimiter;
use super::types::{epoch_secs, KeyType, RateLimitDecision};
use crate::config::{RateLimitConfig, RateLimitStrategy, TierConfig};
use crate::storage::redis::RedisPool;
use crate::utils::error::Result;
use parking_lot::RwLock;
use std::sync::{Arc, Once};
use std::time::Duration;
use tracing::{debug, warn};

/// Inputs the engine needs from one HTTP request.
#[derive(Debug)]
pub struct RequestInfo<'a> {
    /// Concrete request path, matched against the api patterns
    pub path: &'a str,
    /// Authenticated user id, if any
    pub user_id: Option<&'a str>,
    /// Normalized client IP (port already stripped)
    pub client_ip: &'a str,
}

/// Tiered rate limiting engine.
///
/// Configuration is copy-on-publish: every check takes a snapshot `Arc` and
/// uses it throughout, so `set_config` never tears a request in half.
pub struct RateLimitEngine {
    config: RwLock<Arc<RateLimitConfig>>,
    sliding_window: Option<SlidingWindowLimiter>,
    token_bucket: Option<TokenBucketLimiter>,
    local: LocalLimiter,
    health: Arc<StoreHealth>,
    zero_limit_logged: Once,
}

impl RateLimitEngine {
    /// Build the engine. Without a pool every decision is local.
    pub fn new(pool: Option<RedisPool>, config: RateLimitConfig) -> Self {
        let (sliding_window, token_bucket) = match &pool {
            Some(pool) => (
                Some(SlidingWindowLimiter::new(pool.clone())),
                Some(TokenBucketLimiter::new(pool.clone())),
            ),
            None => (None, None),
        };

        Self {
            config: RwLock::new(Arc::new(config)),
            sliding_window,
            token_bucket,
            local: LocalLimiter::new(),
            health: Arc::new(StoreHealth::new(pool)),
            zero_limit_logged: Once::new(),
        }
    }

    /// Snapshot of the published configuration.
    pub fn config(&self) -> Arc<RateLimitConfig> {
        self.config.read().clone()
    }

    /// Atomically publish a new configuration; subsequent requests see it.
    pub fn set_config(&self, config: RateLimitConfig) {
        *self.config.write() = Arc::new(config);
    }

    /// True while decisions are served by the in-process counter.
    pub fn is_using_local_fallback(&self) -> bool {
        self.health.use_local()
    }

    /// Decide whether to admit this request. `None` means rate limiting does
    /// not apply (disabled, or no usable tier) and the request passes through.
    pub async fn check(&self, request: &RequestInfo<'_>) -> Option<RateLimitDecision> {
        let config = self.config();
        if !config.enabled {
            return None;
        }

        let (tier, key) = resolve_tier(&config, request);
        let limit = tier.effective_limit();
        let window = tier.effective_window();

        if limit == 0 {
            self.zero_limit_logged.call_once(|| {
                warn!(key = %key, "tier has no effective limit, forwarding unlimited");
            });
            return None;
        }

        Some(self.check_key(&config, &key, limit, window, tier).await)
    }

    async fn check_key(
        &self,
        config: &RateLimitConfig,
        key: &str,
        limit: u32,
        window: Duration,
        tier: &TierConfig,
    ) -> RateLimitDecision {
        if self.health.use_local() {
            return self.local.allow(key, limit, window);
        }

        match self.shared_allow(key, limit, window, tier, config.strategy).await {
            Some(Ok(decision)) => decision,
            Some(Err(e)) => {
                debug!(error = %e, key, "shared store check failed");
                if !e.is_store_unavailable() {
                    // Not a store fault, so the watcher stays untripped and
                    // this one request is admitted
                    store_failure_decision(false, limit, window)
                } else if config.fallback_to_local {
                    self.health.on_store_error();
                    self.local.allow(key, limit, window)
                } else {
                    store_failure_decision(config.strict_errors, limit, window)
                }
            }
            // No shared limiter was built (started without a pool)
            None => self.local.allow(key, limit, window),
        }
    }

    async fn shared_allow(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
        tier: &TierConfig,
        strategy: RateLimitStrategy,
    ) -> Option<Result<RateLimitDecision>> {
        match strategy {
            RateLimitStrategy::SlidingWindow => {
                let limiter = self.sliding_window.as_ref()?;
                Some(limiter.allow(key, limit, window).await)
            }
            RateLimitStrategy::TokenBucket => {
                let limiter = self.token_bucket.as_ref()?;
                let rate = limit as f64 / window.as_secs_f64();
                let burst = if tier.burst > 0 { tier.burst } else { limit };
                Some(limiter.allow(key, rate, burst).await.map(|mut decision| {
                    decision.limit = limit;
                    decision
                }))
            }
        }
    }
}

/// Select `(tier, key)` for a request.
///
/// Api patterns win over the user tier, which wins over the ip tier. The api
/// key is built from the pattern, not the concrete path: every client hitting
/// the same route family shares one counter.
fn resolve_tier<'c>(
    config: &'c RateLimitConfig,
    request: &RequestInfo<'_>,
) -> (&'c TierConfig, String) {
    if let Some((pattern, tier)) = resolve_pattern(&config.api, request.path) {
        return (tier, build_key(KeyType::Api, "", pattern));
    }

    if let Some(user_id) = request.user_id.filter(|id| !id.is_empty()) {
        return (&config.user, build_key(KeyType::User, user_id, ""));
    }

    (&config.ip, build_key(KeyType::Ip, request.client_ip, ""))
}

/// Policy when the store errors and local fallback is off: strict deployments
/// fail closed, everything else fails open so an infrastructure fault never
/// amplifies into an outage.
pub(crate) fn store_failure_decision(
    strict_errors: bool,
    limit: u32,
    window: Duration,
) -> RateLimitDecision {
    let reset = epoch_secs() + window.as_secs() as i64;
    if strict_errors {
        RateLimitDecision {
            allowed: false,
            limit,
            remaining: 0,
            reset,
            retry_after: Some(1),
        }
    } else {
        RateLimitDecision {
            allowed: true,
            limit,
            remaining: limit,
            reset,
            retry_after: None,
        }
    }
}
