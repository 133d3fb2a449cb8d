//! HTTP server wiring
//!
//! Builds the Redis pool, the rate limit engine, and the actix-web
//! application the middleware is mounted on.

pub mod middleware;
pub mod state;

pub use state::AppState;

use crate::config::Config;
use crate::core::rate_limiter::RateLimitEngine;
use crate::features::FeatureFlags;
use crate::monitoring::Metrics;
use crate::storage::redis::RedisPool;
use crate::utils::error::{Result, ServiceError};
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer as ActixHttpServer};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// HTTP server
pub struct HttpServer {
    config: crate::config::ServerConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server from configuration.
    ///
    /// A missing or unreachable Redis is not fatal: the engine starts in
    /// local mode and the embedding service stays available.
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Creating HTTP server");

        let pool = if config.redis.enabled {
            match RedisPool::new(&config.redis).await {
                Ok(pool) => Some(pool),
                Err(e) => {
                    warn!(error = %e, "Redis unavailable, starting with local rate limiting");
                    None
                }
            }
        } else {
            info!("Redis disabled, rate limiting is process-local");
            None
        };

        let engine = RateLimitEngine::new(pool, config.rate_limits.clone());
        let features = FeatureFlags::from_config(&config.features);
        let metrics = Metrics::new();
        let state = AppState::new(config.clone(), engine, features, metrics);

        Ok(Self {
            config: config.server.clone(),
            state,
        })
    }

    /// Start the HTTP server.
    pub async fn start(self) -> Result<()> {
        let bind_addr = format!("{}:{}", self.config.host, self.config.port);
        info!("Starting HTTP server on {}", bind_addr);

        let state = self.state;
        let workers = self.config.workers;

        let mut server = ActixHttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(state.clone()))
                .wrap(middleware::RateLimitMiddleware::new(
                    Arc::clone(&state.engine),
                    Arc::clone(&state.features),
                    Arc::clone(&state.metrics),
                ))
                .wrap(Logger::default())
                .route("/health", web::get().to(health_check))
                .route("/metrics", web::get().to(metrics_snapshot))
        })
        .bind(&bind_addr)
        .map_err(|e| ServiceError::Server(format!("failed to bind {}: {}", bind_addr, e)))?;

        if let Some(workers) = workers {
            server = server.workers(workers);
        }

        server
            .run()
            .await
            .map_err(|e| ServiceError::Server(format!("server error: {}", e)))?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Run the server with automatic configuration loading.
pub async fn run_server() -> Result<()> {
    let config = crate::config::load().await?;
    let server = HttpServer::new(&config).await?;
    server.start().await
}

async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "degraded": state.engine.is_using_local_fallback(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn metrics_snapshot(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.metrics.snapshot())
}
