//! In-process fallback counter
//!
//! A fixed-window counter used while the shared store is unreachable. It is
//! deliberately simpler than the distributed sliding window: boundary bursts
//! are an accepted trade for keeping traffic bounded during an outage.

use super::types::RateLimitDecision;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

struct LocalCounter {
    count: u32,
    reset_at: SystemTime,
}

/// Mutex-guarded map of fixed-window counters.
#[derive(Default)]
pub struct LocalLimiter {
    counters: Mutex<HashMap<String, LocalCounter>>,
}

impl LocalLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check and count one request under a fixed window.
    pub fn allow(&self, key: &str, limit: u32, window: Duration) -> RateLimitDecision {
        let now = SystemTime::now();
        let mut counters = self.counters.lock();

        if let Some(counter) = counters.get_mut(key) {
            if now <= counter.reset_at {
                if counter.count >= limit {
                    return RateLimitDecision {
                        allowed: false,
                        limit,
                        remaining: 0,
                        reset: unix_secs(counter.reset_at),
                        retry_after: None,
                    };
                }
                counter.count += 1;
                return RateLimitDecision {
                    allowed: true,
                    limit,
                    remaining: limit - counter.count,
                    reset: unix_secs(counter.reset_at),
                    retry_after: None,
                };
            }
        }

        // First touch, or the previous window expired
        let reset_at = now + window;
        counters.insert(
            key.to_string(),
            LocalCounter {
                count: 1,
                reset_at,
            },
        );
        RateLimitDecision {
            allowed: true,
            limit,
            remaining: limit.saturating_sub(1),
            reset: unix_secs(reset_at),
            retry_after: None,
        }
    }

    /// Drop windows that have already expired. Not needed for correctness,
    /// only to bound memory during long degraded periods.
    pub fn purge_expired(&self) {
        let now = SystemTime::now();
        self.counters.lock().retain(|_, counter| now <= counter.reset_at);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.counters.lock().len()
    }
}

fn unix_secs(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i64
}
