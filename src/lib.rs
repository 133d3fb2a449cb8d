//! # rategate
//!
//! Distributed multi-tier rate limiting middleware for actix-web services.
//!
//! Every inbound request is admitted or rejected against per-tier quotas
//! (global, per-authenticated-user, per-client-IP, per-API-route-family).
//! The authoritative counters live in Redis and are updated through atomic
//! server-side scripts; when Redis is unreachable the middleware degrades to
//! an in-process counter and probes for recovery, so the service never
//! fails closed on an infrastructure fault.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use actix_web::{web, App, HttpServer};
//! use rategate::config::Config;
//! use rategate::core::rate_limiter::RateLimitEngine;
//! use rategate::features::FeatureFlags;
//! use rategate::monitoring::Metrics;
//! use rategate::server::middleware::RateLimitMiddleware;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let config = Config::default();
//!     let engine = Arc::new(RateLimitEngine::new(None, config.rate_limits.clone()));
//!     let features = Arc::new(FeatureFlags::from_config(&config.features));
//!     let metrics = Arc::new(Metrics::new());
//!
//!     HttpServer::new(move || {
//!         App::new()
//!             .wrap(RateLimitMiddleware::new(
//!                 Arc::clone(&engine),
//!                 Arc::clone(&features),
//!                 Arc::clone(&metrics),
//!             ))
//!             .route("/", web::get().to(|| async { "hello" }))
//!     })
//!     .bind(("127.0.0.1", 8080))?
//!     .run()
//!     .await
//! }
//! ```

pub mod config;
pub mod core;
pub mod features;
pub mod monitoring;
pub mod server;
pub mod storage;
pub mod utils;

// Re-export main types
pub use config::{Config, RateLimitConfig, RateLimitStrategy, TierConfig};
pub use core::rate_limiter::{
    build_key, KeyType, RateLimitDecision, RateLimitEngine, RequestInfo, UserId,
};
pub use server::middleware::RateLimitMiddleware;
pub use utils::error::{Result, ServiceError};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
