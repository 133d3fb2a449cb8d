//! Configuration models

pub mod features;
pub mod rate_limit;
pub mod redis;
pub mod server;

pub use features::default_features;
pub use rate_limit::{RateLimitConfig, RateLimitStrategy, TierConfig};
pub use redis::RedisConfig;
pub use server::ServerConfig;
