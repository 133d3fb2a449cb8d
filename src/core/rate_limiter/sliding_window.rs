//! Redis-backed sliding window counter

use super::types::{epoch_millis, RateLimitDecision};
use crate::storage::redis::{scripts, RedisPool};
use crate::utils::error::{Result, ServiceError};
use rand::Rng;
use redis::Script;
use std::time::Duration;

/// Sliding-window counter over a sorted set per key.
///
/// Purge, count, insert and expiry run as one server-side script, so two
/// concurrent callers can never both observe a free slot and both take it.
pub struct SlidingWindowLimiter {
    pool: RedisPool,
    script: Script,
}

impl SlidingWindowLimiter {
    pub fn new(pool: RedisPool) -> Self {
        Self {
            pool,
            script: scripts::sliding_window(),
        }
    }

    /// Atomically admit or reject one request on `key`.
    pub async fn allow(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
    ) -> Result<RateLimitDecision> {
        let now_ms = epoch_millis();
        let window_ms = window.as_millis() as i64;
        let window_start = now_ms - window_ms;
        // Distinct member even when two insertions share a millisecond
        let member_suffix: u64 = rand::thread_rng().gen();

        let mut conn = self.pool.connection();
        let reply: Vec<i64> = self
            .script
            .key(key)
            .arg(now_ms)
            .arg(window_start)
            .arg(limit as i64)
            .arg(window_ms)
            .arg(member_suffix)
            .invoke_async(&mut conn)
            .await?;

        if reply.len() != 3 {
            return Err(ServiceError::Script(format!(
                "sliding window returned {} values, expected 3",
                reply.len()
            )));
        }

        let allowed = reply[0] == 1;
        let reset = (now_ms + window_ms) / 1000;

        Ok(RateLimitDecision {
            allowed,
            limit,
            remaining: reply[1].max(0) as u32,
            reset,
            retry_after: if allowed {
                None
            } else {
                Some(reply[2].max(0) as u64)
            },
        })
    }

    /// Current request count inside the window, without admitting anything.
    pub async fn current_count(&self, key: &str, window: Duration) -> Result<i64> {
        let now_ms = epoch_millis();
        let window_start = now_ms - window.as_millis() as i64;

        let mut conn = self.pool.connection();
        let count: i64 = redis::cmd("ZCOUNT")
            .arg(key)
            .arg(window_start)
            .arg(now_ms)
            .query_async(&mut conn)
            .await?;
        Ok(count)
    }
}
