//! Configuration loading
//!
//! File resolution and environment variable overrides. Environment values
//! take precedence over the file; a missing file falls back to defaults so
//! the service always starts.

use super::Config;
use crate::utils::error::{Result, ServiceError};
use std::env;
use tracing::{debug, warn};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "RATEGATE_CONFIG";
/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/rategate.yaml";

/// Load configuration with precedence: defaults, then file, then environment.
pub async fn load() -> Result<Config> {
    let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let mut config = match Config::from_file(&path).await {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path, error = %e, "config file not loaded, using defaults");
            Config::default()
        }
    };

    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Apply environment variable overrides (highest precedence).
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = env::var("RATEGATE_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("RATEGATE_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| ServiceError::Config(format!("invalid RATEGATE_PORT: {}", e)))?;
        }
        if let Ok(workers) = env::var("RATEGATE_WORKERS") {
            self.server.workers = Some(
                workers
                    .parse()
                    .map_err(|e| ServiceError::Config(format!("invalid RATEGATE_WORKERS: {}", e)))?,
            );
        }
        if let Ok(url) = env::var("REDIS_URL") {
            self.redis.url = url;
            self.redis.enabled = true;
        }
        if let Ok(enabled) = env::var("RATEGATE_RATE_LIMITS_ENABLED") {
            self.rate_limits.enabled = enabled.parse().map_err(|e| {
                ServiceError::Config(format!("invalid RATEGATE_RATE_LIMITS_ENABLED: {}", e))
            })?;
        }

        debug!("environment overrides applied");
        Ok(())
    }
}
