//! Rate limiting configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Rate limit settings for one tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierConfig {
    /// Maximum requests per second
    pub requests_per_second: u32,
    /// Maximum requests per minute, used when `requests_per_second` is zero.
    /// When both are set, seconds win (see [`TierConfig::effective_limit`]).
    pub requests_per_minute: u32,
    /// Maximum burst size (token bucket ceiling)
    pub burst: u32,
    /// Explicit window override in seconds
    pub window_secs: u64,
    /// Concurrent connection cap, reserved for streaming transports
    pub connections_per_user: u32,
}

impl TierConfig {
    /// Effective limit per window. `requests_per_second` takes precedence
    /// over `requests_per_minute` when both are configured.
    pub fn effective_limit(&self) -> u32 {
        if self.requests_per_second > 0 {
            self.requests_per_second
        } else {
            self.requests_per_minute
        }
    }

    /// Effective time window: the explicit override if set, otherwise one
    /// second for per-second tiers and one minute for per-minute tiers.
    pub fn effective_window(&self) -> Duration {
        if self.window_secs > 0 {
            Duration::from_secs(self.window_secs)
        } else if self.requests_per_second > 0 {
            Duration::from_secs(1)
        } else {
            Duration::from_secs(60)
        }
    }
}

/// Shared-store counting strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitStrategy {
    /// Count requests inside a moving window (default)
    #[default]
    SlidingWindow,
    /// Continuously refilled token credit per key
    TokenBucket,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Master switch for the middleware
    pub enabled: bool,

    /// Global tier (all requests share one counter)
    pub global: TierConfig,

    /// Per-authenticated-user tier
    pub user: TierConfig,

    /// Per-client-IP tier (unauthenticated requests)
    pub ip: TierConfig,

    /// Route-family tiers keyed by path pattern. A `BTreeMap` keeps pattern
    /// iteration deterministic when several patterns overlap.
    pub api: BTreeMap<String, TierConfig>,

    /// Serve decisions from the in-process counter while the store is down
    pub fallback_to_local: bool,

    /// Fail closed instead of open when the store errors and
    /// `fallback_to_local` is off
    pub strict_errors: bool,

    /// Which shared-store counter to use
    pub strategy: RateLimitStrategy,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            global: TierConfig {
                requests_per_second: 1000,
                burst: 100,
                window_secs: 1,
                ..TierConfig::default()
            },
            user: TierConfig {
                requests_per_minute: 300,
                burst: 50,
                window_secs: 60,
                ..TierConfig::default()
            },
            ip: TierConfig {
                requests_per_minute: 60,
                burst: 10,
                window_secs: 60,
                ..TierConfig::default()
            },
            api: BTreeMap::new(),
            fallback_to_local: true,
            strict_errors: false,
            strategy: RateLimitStrategy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_limit_prefers_seconds() {
        let tier = TierConfig {
            requests_per_second: 100,
            requests_per_minute: 6000,
            ..TierConfig::default()
        };
        assert_eq!(tier.effective_limit(), 100);

        let tier = TierConfig {
            requests_per_minute: 300,
            ..TierConfig::default()
        };
        assert_eq!(tier.effective_limit(), 300);
    }

    #[test]
    fn test_effective_window() {
        let tier = TierConfig {
            window_secs: 5,
            ..TierConfig::default()
        };
        assert_eq!(tier.effective_window(), Duration::from_secs(5));

        let tier = TierConfig {
            requests_per_second: 100,
            ..TierConfig::default()
        };
        assert_eq!(tier.effective_window(), Duration::from_secs(1));

        let tier = TierConfig {
            requests_per_minute: 300,
            ..TierConfig::default()
        };
        assert_eq!(tier.effective_window(), Duration::from_secs(60));
    }

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert!(config.enabled);
        assert!(config.fallback_to_local);
        assert!(!config.strict_errors);
        assert_eq!(config.global.requests_per_second, 1000);
        assert_eq!(config.global.burst, 100);
        assert_eq!(config.user.requests_per_minute, 300);
        assert_eq!(config.ip.requests_per_minute, 60);
        assert!(config.api.is_empty());
        assert_eq!(config.strategy, RateLimitStrategy::SlidingWindow);
    }

    #[test]
    fn test_strategy_deserialization() {
        let strategy: RateLimitStrategy = serde_yaml::from_str("token_bucket").unwrap();
        assert_eq!(strategy, RateLimitStrategy::TokenBucket);

        let strategy: RateLimitStrategy = serde_yaml::from_str("sliding_window").unwrap();
        assert_eq!(strategy, RateLimitStrategy::SlidingWindow);
    }

    #[test]
    fn test_tier_deserialization_defaults() {
        let tier: TierConfig = serde_yaml::from_str("requests_per_minute: 120").unwrap();
        assert_eq!(tier.requests_per_minute, 120);
        assert_eq!(tier.requests_per_second, 0);
        assert_eq!(tier.burst, 0);
        assert_eq!(tier.effective_window(), Duration::from_secs(60));
    }
}
