//! Error handling for rategate
//!
//! This module defines the crate-wide error type and result alias.

use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Result type alias for rategate
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Redis transport or protocol errors
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A server-side script returned an unexpected reply shape
    #[error("Script error: {0}")]
    Script(String),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Rate limiting errors
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// HTTP server errors
    #[error("Server error: {0}")]
    Server(String),
}

impl ServiceError {
    /// True when the shared store cannot serve counter decisions.
    ///
    /// Script-shape errors count as unavailability: a half-working store is
    /// not a store the limiter can trust.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(
            self,
            ServiceError::Redis(_) | ServiceError::Script(_) | ServiceError::Timeout(_)
        )
    }
}

impl ResponseError for ServiceError {
    fn error_response(&self) -> HttpResponse {
        let (status, code) = match self {
            ServiceError::RateLimit(_) => (
                actix_web::http::StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMIT_EXCEEDED",
            ),
            ServiceError::Config(_) | ServiceError::Yaml(_) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR",
            ),
            ServiceError::Redis(_) | ServiceError::Script(_) | ServiceError::Timeout(_) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
            ),
            _ => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        };

        HttpResponse::build(status).json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_unavailable_classification() {
        assert!(ServiceError::Script("bad reply".to_string()).is_store_unavailable());
        assert!(ServiceError::Timeout("connect".to_string()).is_store_unavailable());
        assert!(!ServiceError::Config("oops".to_string()).is_store_unavailable());
        assert!(!ServiceError::RateLimit("ip".to_string()).is_store_unavailable());
    }

    #[test]
    fn test_rate_limit_response_status() {
        let err = ServiceError::RateLimit("user tier".to_string());
        let response = err.error_response();
        assert_eq!(response.status(), actix_web::http::StatusCode::TOO_MANY_REQUESTS);
    }
}
