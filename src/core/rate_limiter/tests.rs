//! Tests for the rate limiter core

use super::engine::{store_failure_decision, RateLimitEngine, RequestInfo};
use super::health::StoreHealth;
use super::key::build_key;
use super::local::LocalLimiter;
use super::path::{match_path, resolve_pattern, specificity};
use super::types::KeyType;
use crate::config::{RateLimitConfig, TierConfig};
use std::collections::BTreeMap;
use std::time::Duration;

fn tier(rps: u32, rpm: u32) -> TierConfig {
    TierConfig {
        requests_per_second: rps,
        requests_per_minute: rpm,
        ..TierConfig::default()
    }
}

// ==================== key building ====================

#[test]
fn test_build_key_forms() {
    assert_eq!(build_key(KeyType::Global, "", ""), "ratelimit:global");
    assert_eq!(
        build_key(KeyType::User, "user123", ""),
        "ratelimit:user:user123"
    );
    assert_eq!(
        build_key(KeyType::User, "u42", "/api/v1/x"),
        "ratelimit:user:u42:api:/api/v1/x"
    );
    assert_eq!(
        build_key(KeyType::Ip, "192.168.1.1", ""),
        "ratelimit:ip:192.168.1.1"
    );
    assert_eq!(
        build_key(KeyType::Api, "", "/api/v1/workflow"),
        "ratelimit:api:/api/v1/workflow"
    );
}

#[test]
fn test_keys_from_distinct_tiers_never_collide() {
    let keys = [
        build_key(KeyType::Global, "", ""),
        build_key(KeyType::User, "x", ""),
        build_key(KeyType::Ip, "x", ""),
        build_key(KeyType::Api, "", "x"),
        build_key(KeyType::User, "x", "x"),
    ];
    for (i, a) in keys.iter().enumerate() {
        for b in keys.iter().skip(i + 1) {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn test_key_type_names() {
    assert_eq!(KeyType::Global.as_str(), "global");
    assert_eq!(KeyType::User.as_str(), "user");
    assert_eq!(KeyType::Ip.as_str(), "ip");
    assert_eq!(KeyType::Api.as_str(), "api");
}

// ==================== path matching ====================

#[test]
fn test_match_path_forms() {
    let cases = [
        ("/api/v1/test", "/api/v1/test", true),
        ("/api/v1/test", "/api/v1/other", false),
        ("/api/v1/edge/*", "/api/v1/edge/device", true),
        ("/api/v1/edge/*", "/api/v1/edge/device/action", true),
        ("/api/v1/edge/*", "/api/v1/other/device", false),
        // the wildcard does not cover its own prefix
        ("/api/v1/edge/*", "/api/v1/edge", false),
        ("/api/v1/lab/:uuid", "/api/v1/lab/123", true),
        ("/api/v1/lab/:uuid", "/api/v1/lab/123/extra", false),
        // parameter segments must be non-empty
        ("/api/v1/lab/:uuid", "/api/v1/lab/", false),
        ("/api/v1/lab/:uuid/run", "/api/v1/lab/9/run", true),
    ];
    for (pattern, path, expected) in cases {
        assert_eq!(
            match_path(pattern, path),
            expected,
            "pattern {} vs path {}",
            pattern,
            path
        );
    }
}

#[test]
fn test_specificity_ranks_wildcards_below_params() {
    assert_eq!(specificity("/a/b"), (0, 0));
    assert_eq!(specificity("/a/:x/b"), (0, 1));
    assert_eq!(specificity("/a/*"), (1, 0));
    assert!(specificity("/a/:x/b") < specificity("/a/*"));
}

#[test]
fn test_resolve_pattern_prefers_fewer_wildcards() {
    let registry = BTreeMap::from([
        ("/a/*".to_string(), tier(1, 0)),
        ("/a/:x/b".to_string(), tier(2, 0)),
    ]);

    let (pattern, selected) = resolve_pattern(&registry, "/a/c/b").unwrap();
    assert_eq!(pattern, "/a/:x/b");
    assert_eq!(selected.requests_per_second, 2);

    // only the wildcard matches deeper paths
    let (pattern, _) = resolve_pattern(&registry, "/a/c/d").unwrap();
    assert_eq!(pattern, "/a/*");
}

#[test]
fn test_resolve_pattern_exact_beats_everything() {
    let registry = BTreeMap::from([
        ("/a/*".to_string(), tier(1, 0)),
        ("/a/c/b".to_string(), tier(3, 0)),
        ("/a/:x/b".to_string(), tier(2, 0)),
    ]);

    let (pattern, _) = resolve_pattern(&registry, "/a/c/b").unwrap();
    assert_eq!(pattern, "/a/c/b");
}

#[test]
fn test_resolve_pattern_none_when_nothing_matches() {
    let registry = BTreeMap::from([("/a/*".to_string(), tier(1, 0))]);
    assert!(resolve_pattern(&registry, "/b/c").is_none());
}

// ==================== local counter ====================

#[test]
fn test_local_limiter_counts_down_then_denies() {
    let limiter = LocalLimiter::new();

    let first = limiter.allow("test:key", 5, Duration::from_secs(60));
    assert!(first.allowed);
    assert_eq!(first.remaining, 4);

    let mut last_remaining = first.remaining;
    for _ in 0..4 {
        let decision = limiter.allow("test:key", 5, Duration::from_secs(60));
        assert!(decision.allowed);
        assert!(decision.remaining < last_remaining || decision.remaining == 0);
        last_remaining = decision.remaining;
    }
    assert_eq!(last_remaining, 0);

    let denied = limiter.allow("test:key", 5, Duration::from_secs(60));
    assert!(!denied.allowed);
    assert_eq!(denied.remaining, 0);
    assert!(denied.reset > 0);
}

#[test]
fn test_local_limiter_keys_are_independent() {
    let limiter = LocalLimiter::new();
    limiter.allow("key1", 1, Duration::from_secs(60));

    let denied = limiter.allow("key1", 1, Duration::from_secs(60));
    assert!(!denied.allowed);

    let other = limiter.allow("key2", 1, Duration::from_secs(60));
    assert!(other.allowed);
}

#[test]
fn test_local_limiter_window_reset() {
    let limiter = LocalLimiter::new();
    let window = Duration::from_millis(50);

    limiter.allow("reset:key", 1, window);
    assert!(!limiter.allow("reset:key", 1, window).allowed);

    std::thread::sleep(Duration::from_millis(80));

    let after = limiter.allow("reset:key", 1, window);
    assert!(after.allowed);
    assert_eq!(after.remaining, 0);
}

#[test]
fn test_local_limiter_purge_expired() {
    let limiter = LocalLimiter::new();
    limiter.allow("short", 5, Duration::from_millis(10));
    limiter.allow("long", 5, Duration::from_secs(60));
    assert_eq!(limiter.len(), 2);

    std::thread::sleep(Duration::from_millis(30));
    limiter.purge_expired();
    assert_eq!(limiter.len(), 1);
}

// ==================== engine ====================

fn local_engine(config: RateLimitConfig) -> RateLimitEngine {
    RateLimitEngine::new(None, config)
}

fn ip_request(ip: &str) -> RequestInfo<'_> {
    RequestInfo {
        path: "/anything",
        user_id: None,
        client_ip: ip,
    }
}

#[tokio::test]
async fn test_engine_disabled_never_decides() {
    let config = RateLimitConfig {
        enabled: false,
        ..RateLimitConfig::default()
    };
    let engine = local_engine(config);

    for _ in 0..100 {
        assert!(engine.check(&ip_request("203.0.113.9")).await.is_none());
    }
}

#[tokio::test]
async fn test_engine_unauthenticated_hits_ip_tier() {
    let mut config = RateLimitConfig::default();
    config.ip = tier(0, 60);
    let engine = local_engine(config);

    let decision = engine.check(&ip_request("203.0.113.9")).await.unwrap();
    assert!(decision.allowed);
    assert_eq!(decision.limit, 60);
    assert_eq!(decision.remaining, 59);
}

#[tokio::test]
async fn test_engine_authenticated_hits_user_tier() {
    let engine = local_engine(RateLimitConfig::default());

    let request = RequestInfo {
        path: "/anything",
        user_id: Some("u42"),
        client_ip: "203.0.113.9",
    };
    let decision = engine.check(&request).await.unwrap();
    assert_eq!(decision.limit, 300);
}

#[tokio::test]
async fn test_engine_empty_user_id_falls_through_to_ip() {
    let engine = local_engine(RateLimitConfig::default());

    let request = RequestInfo {
        path: "/anything",
        user_id: Some(""),
        client_ip: "203.0.113.9",
    };
    let decision = engine.check(&request).await.unwrap();
    assert_eq!(decision.limit, 60);
}

#[tokio::test]
async fn test_engine_api_pattern_is_shared_across_clients() {
    let mut config = RateLimitConfig::default();
    config
        .api
        .insert("/api/v1/edge/*".to_string(), tier(0, 2));
    let engine = local_engine(config);

    let first = RequestInfo {
        path: "/api/v1/edge/device/1",
        user_id: Some("alice"),
        client_ip: "10.0.0.1",
    };
    let second = RequestInfo {
        path: "/api/v1/edge/device/2",
        user_id: Some("bob"),
        client_ip: "10.0.0.2",
    };

    // Different users and paths inside the family drain the same counter
    assert!(engine.check(&first).await.unwrap().allowed);
    assert!(engine.check(&second).await.unwrap().allowed);
    let third = engine.check(&first).await.unwrap();
    assert!(!third.allowed);
}

#[tokio::test]
async fn test_engine_zero_limit_tier_forwards() {
    let mut config = RateLimitConfig::default();
    config.ip = tier(0, 0);
    let engine = local_engine(config);

    assert!(engine.check(&ip_request("203.0.113.9")).await.is_none());
}

#[tokio::test]
async fn test_engine_set_config_publishes_atomically() {
    let engine = local_engine(RateLimitConfig::default());

    let before = engine.check(&ip_request("198.51.100.1")).await.unwrap();
    assert_eq!(before.limit, 60);

    let mut updated = RateLimitConfig::default();
    updated.ip = tier(0, 10);
    engine.set_config(updated);

    let after = engine.check(&ip_request("198.51.100.2")).await.unwrap();
    assert_eq!(after.limit, 10);
}

#[tokio::test]
async fn test_engine_without_pool_serves_locally() {
    let engine = local_engine(RateLimitConfig::default());
    assert!(engine.is_using_local_fallback());

    let decision = engine.check(&ip_request("203.0.113.9")).await.unwrap();
    assert!(decision.allowed);
}

// ==================== failure policy ====================

#[test]
fn test_store_failure_fails_open_by_default() {
    let decision = store_failure_decision(false, 40, Duration::from_secs(60));
    assert!(decision.allowed);
    assert_eq!(decision.remaining, 40);
    assert!(decision.retry_after.is_none());
}

#[test]
fn test_store_failure_strict_fails_closed() {
    let decision = store_failure_decision(true, 40, Duration::from_secs(60));
    assert!(!decision.allowed);
    assert_eq!(decision.remaining, 0);
    assert_eq!(decision.retry_after, Some(1));
}

// ==================== health watcher ====================

#[test]
fn test_health_without_pool_starts_local() {
    let health = StoreHealth::new(None);
    assert!(health.use_local());
    assert!(!health.probe_armed());
}
