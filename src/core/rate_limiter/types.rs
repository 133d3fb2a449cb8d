//! Rate limiter types and data structures

use std::time::{SystemTime, UNIX_EPOCH};

/// The tier a counter key belongs to.
///
/// The enumeration makes an unknown tier unrepresentable; the canonical
/// lowercase names below are the only strings that reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// One shared counter for all traffic
    Global,
    /// Per authenticated user
    User,
    /// Per client IP
    Ip,
    /// Per API route family
    Api,
}

impl KeyType {
    /// Canonical lowercase name used inside counter keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Global => "global",
            KeyType::User => "user",
            KeyType::Ip => "ip",
            KeyType::Api => "api",
        }
    }
}

/// Outcome of a single rate limit check.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitDecision {
    /// Whether the request is admitted
    pub allowed: bool,
    /// Maximum requests in the window
    pub limit: u32,
    /// Requests remaining after this one (zero on denial)
    pub remaining: u32,
    /// Epoch second when the window rolls over or the bucket refills
    pub reset: i64,
    /// Seconds to wait before retrying, set on denial
    pub retry_after: Option<u64>,
}

/// Authenticated user id, inserted into request extensions by the embedding
/// service's auth middleware. An absent or empty value means unauthenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

/// Wall clock in epoch milliseconds.
pub(crate) fn epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Wall clock in epoch seconds.
pub(crate) fn epoch_secs() -> i64 {
    epoch_millis() / 1000
}
