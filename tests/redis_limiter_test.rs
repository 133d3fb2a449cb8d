//! End-to-end counter tests against a live Redis.
//!
//! Ignored by default; run with a reachable instance:
//! `REDIS_URL=redis://127.0.0.1:6379 cargo test -- --ignored`

use rategate::config::RedisConfig;
use rategate::core::rate_limiter::{SlidingWindowLimiter, TokenBucketLimiter};
use rategate::storage::redis::RedisPool;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn test_key(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("ratelimit:test:{}:{}", prefix, nanos)
}

async fn pool() -> RedisPool {
    let url =
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    let config = RedisConfig {
        url,
        enabled: true,
        connection_timeout_secs: 5,
    };
    RedisPool::new(&config).await.expect("redis reachable")
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn sliding_window_respects_limit() {
    let limiter = SlidingWindowLimiter::new(pool().await);
    let key = test_key("sw");
    let window = Duration::from_secs(60);

    for expected_remaining in [2u32, 1, 0] {
        let decision = limiter.allow(&key, 3, window).await.unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.remaining, expected_remaining);
        assert!(decision.retry_after.is_none());
    }

    let denied = limiter.allow(&key, 3, window).await.unwrap();
    assert!(!denied.allowed);
    assert_eq!(denied.remaining, 0);
    let retry_after = denied.retry_after.unwrap();
    assert!(retry_after >= 1 && retry_after <= 60);

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;
    assert!(denied.reset > now);
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn sliding_window_counts_and_expires() {
    let pool = pool().await;
    let limiter = SlidingWindowLimiter::new(pool.clone());
    let key = test_key("count");
    let window = Duration::from_secs(60);

    limiter.allow(&key, 10, window).await.unwrap();
    limiter.allow(&key, 10, window).await.unwrap();

    let count = limiter.current_count(&key, window).await.unwrap();
    assert_eq!(count, 2);

    // the key carries a TTL at least as long as the window
    let mut conn = pool.connection();
    let ttl: i64 = redis::cmd("PTTL")
        .arg(&key)
        .query_async(&mut conn)
        .await
        .unwrap();
    assert!(ttl > 0 && ttl <= 60_000);
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn sliding_window_frees_a_slot_after_the_window() {
    let limiter = SlidingWindowLimiter::new(pool().await);
    let key = test_key("roll");
    let window = Duration::from_millis(500);

    assert!(limiter.allow(&key, 1, window).await.unwrap().allowed);
    assert!(!limiter.allow(&key, 1, window).await.unwrap().allowed);

    tokio::time::sleep(Duration::from_millis(700)).await;

    assert!(limiter.allow(&key, 1, window).await.unwrap().allowed);
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn token_bucket_burst_then_refill() {
    let limiter = TokenBucketLimiter::new(pool().await);
    let key = test_key("tb");

    // burst of 2 drains immediately
    let first = limiter.allow(&key, 1.0, 2).await.unwrap();
    assert!(first.allowed);
    assert_eq!(first.remaining, 1);

    let second = limiter.allow(&key, 1.0, 2).await.unwrap();
    assert!(second.allowed);
    assert_eq!(second.remaining, 0);

    let third = limiter.allow(&key, 1.0, 2).await.unwrap();
    assert!(!third.allowed);
    assert_eq!(third.remaining, 0);

    // 1.5s of idleness at 1 token/s buys one admission
    tokio::time::sleep(Duration::from_millis(1500)).await;

    let fourth = limiter.allow(&key, 1.0, 2).await.unwrap();
    assert!(fourth.allowed);
    assert_eq!(fourth.remaining, 0);
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn token_bucket_never_exceeds_burst() {
    let limiter = TokenBucketLimiter::new(pool().await);
    let key = test_key("cap");

    // after long idleness the bucket still only holds `burst` tokens
    let first = limiter.allow(&key, 100.0, 3).await.unwrap();
    assert!(first.allowed);
    assert_eq!(first.remaining, 2);
}
