//! In-process request metrics
//!
//! A small aggregating recorder shared via `Arc` with every middleware. The
//! export pipeline is the embedding service's concern; this keeps the counts
//! the middleware needs to report and the introspection endpoint serves.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Counter key: method, route pattern, status code.
type RequestKey = (String, String, u16);

/// Aggregated request counters.
#[derive(Debug, Default)]
pub struct Metrics {
    storage: RwLock<MetricsStorage>,
}

/// All counters behind a single lock to keep write sections short.
#[derive(Debug, Default)]
struct MetricsStorage {
    total_requests: u64,
    rate_limited: u64,
    requests: HashMap<RequestKey, u64>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one finished (or rejected) HTTP request.
    pub fn record_http_request(&self, method: &str, route: &str, status: u16, user_id: &str) {
        {
            let mut storage = self.storage.write();
            storage.total_requests += 1;
            if status == 429 {
                storage.rate_limited += 1;
            }
            *storage
                .requests
                .entry((method.to_string(), route.to_string(), status))
                .or_default() += 1;
        }

        debug!(method, route, status, user_id, "http request recorded");
    }

    /// Snapshot for introspection endpoints.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let storage = self.storage.read();

        let mut by_status: BTreeMap<u16, u64> = BTreeMap::new();
        for ((_, _, status), count) in &storage.requests {
            *by_status.entry(*status).or_default() += count;
        }

        MetricsSnapshot {
            total_requests: storage.total_requests,
            rate_limited: storage.rate_limited,
            by_status,
        }
    }
}

/// Point-in-time view of the request counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Requests recorded since startup
    pub total_requests: u64,
    /// Requests rejected with 429
    pub rate_limited: u64,
    /// Request counts per status code
    pub by_status: BTreeMap<u16, u64>,
}
