//! Redis configuration

use serde::{Deserialize, Serialize};

/// Shared-store connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Connection URL (`redis://[:password@]host:port[/db]`)
    pub url: String,
    /// When false the service runs on the in-process counter only
    pub enabled: bool,
    /// Connect timeout in seconds
    pub connection_timeout_secs: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            enabled: true,
            connection_timeout_secs: 5,
        }
    }
}
