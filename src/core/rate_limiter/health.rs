//! Store health tracking and recovery probing
//!
//! A single flag decides whether decisions come from the shared store or the
//! local counter. The flag flips to local on a store error and flips back
//! once a background probe sees the store answer a PING again.

use crate::storage::redis::RedisPool;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Interval between liveness probes while degraded.
pub(crate) const PROBE_INTERVAL: Duration = Duration::from_secs(30);

/// Tracks whether the shared store is usable.
pub struct StoreHealth {
    /// Read on every request, written only on failure/recovery transitions
    use_local: RwLock<bool>,
    /// Guards against arming more than one probe task
    probe_inflight: AtomicBool,
    pool: Option<RedisPool>,
}

impl StoreHealth {
    /// With no pool the watcher starts (and stays) in local mode.
    pub fn new(pool: Option<RedisPool>) -> Self {
        Self {
            use_local: RwLock::new(pool.is_none()),
            probe_inflight: AtomicBool::new(false),
            pool,
        }
    }

    /// True while decisions should come from the local counter.
    pub fn use_local(&self) -> bool {
        *self.use_local.read()
    }

    /// Record a store failure: flip to degraded mode and arm one recovery
    /// probe. Calling this while already degraded is a no-op.
    pub fn on_store_error(self: &Arc<Self>) {
        {
            let mut use_local = self.use_local.write();
            if *use_local {
                return;
            }
            *use_local = true;
        }

        warn!("shared store unavailable, falling back to local rate limiting");
        self.schedule_probe();
    }

    fn schedule_probe(self: &Arc<Self>) {
        if self.probe_inflight.swap(true, Ordering::SeqCst) {
            return;
        }

        let health = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(PROBE_INTERVAL).await;

                let Some(pool) = health.pool.as_ref() else {
                    health.probe_inflight.store(false, Ordering::SeqCst);
                    return;
                };

                match pool.health_check().await {
                    Ok(()) => {
                        // Release the probe slot before flipping back, so a
                        // failure racing this transition can arm a new probe
                        health.probe_inflight.store(false, Ordering::SeqCst);
                        *health.use_local.write() = false;
                        info!("shared store recovered, resuming distributed rate limiting");
                        return;
                    }
                    Err(e) => {
                        warn!(error = %e, "store probe failed, staying in local mode");
                    }
                }
            }
        });
    }

    #[cfg(test)]
    pub(crate) fn probe_armed(&self) -> bool {
        self.probe_inflight.load(Ordering::SeqCst)
    }
}
