//! Redis-backed token bucket counter

use super::types::{epoch_millis, RateLimitDecision};
use crate::storage::redis::{scripts, RedisPool};
use crate::utils::error::{Result, ServiceError};
use redis::Script;

/// Token bucket with continuous refill, one hash per key.
///
/// Refill, admission and persistence run as one server-side script; see
/// [`super::SlidingWindowLimiter`] for the same atomicity argument.
pub struct TokenBucketLimiter {
    pool: RedisPool,
    script: Script,
}

impl TokenBucketLimiter {
    pub fn new(pool: RedisPool) -> Self {
        Self {
            pool,
            script: scripts::token_bucket(),
        }
    }

    /// Atomically take one token from the bucket for `key`.
    ///
    /// `rate` is tokens per second, `burst` the bucket ceiling. The key
    /// expires once a full refill cycle has certainly passed.
    pub async fn allow(&self, key: &str, rate: f64, burst: u32) -> Result<RateLimitDecision> {
        let now_secs = epoch_millis() as f64 / 1000.0;

        let mut conn = self.pool.connection();
        let reply: Vec<i64> = self
            .script
            .key(key)
            .arg(rate)
            .arg(burst)
            .arg(now_secs)
            .invoke_async(&mut conn)
            .await?;

        if reply.len() != 2 {
            return Err(ServiceError::Script(format!(
                "token bucket returned {} values, expected 2",
                reply.len()
            )));
        }

        let allowed = reply[0] == 1;
        let reset = (now_secs + burst as f64 / rate) as i64;

        Ok(RateLimitDecision {
            allowed,
            limit: burst,
            remaining: reply[1].max(0) as u32,
            reset,
            retry_after: None,
        })
    }
}
