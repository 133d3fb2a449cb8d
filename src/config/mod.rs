//! Configuration management
//!
//! YAML configuration with environment variable overrides. Configuration is
//! loaded once at startup; the rate-limit section can later be republished
//! through `RateLimitEngine::set_config`.

pub mod loader;
pub mod models;

pub use loader::load;
pub use models::*;

use crate::utils::error::{Result, ServiceError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Top-level service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,
    /// Shared-store connection settings
    pub redis: RedisConfig,
    /// Tiered quota settings
    pub rate_limits: RateLimitConfig,
    /// Feature flags by configuration name
    pub features: BTreeMap<String, bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            redis: RedisConfig::default(),
            rate_limits: RateLimitConfig::default(),
            features: default_features(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ServiceError::Config(format!("failed to read config file: {}", e)))?;

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ServiceError::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate invariants the type system cannot express.
    ///
    /// A tier with zero effective limit is reported but not rejected: the
    /// dispatcher forwards such traffic unlimited at runtime, which is an
    /// operator mistake worth a log line, not a crash.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(ServiceError::Config("server.port must be non-zero".to_string()));
        }
        if self.redis.enabled && self.redis.url.is_empty() {
            return Err(ServiceError::Config(
                "redis.url must be set when redis.enabled is true".to_string(),
            ));
        }

        if self.rate_limits.enabled {
            let named = [
                ("global", &self.rate_limits.global),
                ("user", &self.rate_limits.user),
                ("ip", &self.rate_limits.ip),
            ];
            for (name, tier) in named {
                if tier.effective_limit() == 0 {
                    warn!(tier = name, "tier has no effective limit and will not throttle");
                }
            }
            for (pattern, tier) in &self.rate_limits.api {
                if tier.effective_limit() == 0 {
                    warn!(pattern = %pattern, "api tier has no effective limit and will not throttle");
                }
            }
        }

        Ok(())
    }
}
