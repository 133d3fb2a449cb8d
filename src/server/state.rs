//! Application state shared across HTTP handlers

use crate::config::Config;
use crate::core::rate_limiter::RateLimitEngine;
use crate::features::FeatureFlags;
use crate::monitoring::Metrics;
use std::sync::Arc;

/// Shared resources handed to every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration (read-only after startup)
    pub config: Arc<Config>,
    /// Rate limiting engine
    pub engine: Arc<RateLimitEngine>,
    /// Feature flag registry
    pub features: Arc<FeatureFlags>,
    /// Request metrics recorder
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        config: Config,
        engine: RateLimitEngine,
        features: FeatureFlags,
        metrics: Metrics,
    ) -> Self {
        Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
            features: Arc::new(features),
            metrics: Arc::new(metrics),
        }
    }
}
