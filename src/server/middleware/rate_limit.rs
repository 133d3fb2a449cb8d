//! Rate limiting middleware
//!
//! Applies the tiered quotas to every request: resolves the applicable tier,
//! consults the distributed (or fallback) counter, emits the `X-RateLimit-*`
//! headers, and rejects over-quota requests with 429 before the inner
//! service runs.

use crate::core::rate_limiter::{
    epoch_secs, RateLimitDecision, RateLimitEngine, RequestInfo, UserId,
};
use crate::features::{Feature, FeatureFlags};
use crate::monitoring::Metrics;
use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue, RETRY_AFTER};
use actix_web::{HttpMessage, HttpResponse};
use futures::future::{ready, Ready};
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;

/// Header carrying the tier's maximum request count.
pub const HEADER_LIMIT: &str = "x-ratelimit-limit";
/// Header carrying the requests remaining in the window.
pub const HEADER_REMAINING: &str = "x-ratelimit-remaining";
/// Header carrying the epoch second the window resets.
pub const HEADER_RESET: &str = "x-ratelimit-reset";

/// Rate limit middleware for Actix-web.
pub struct RateLimitMiddleware {
    engine: Arc<RateLimitEngine>,
    features: Arc<FeatureFlags>,
    metrics: Arc<Metrics>,
}

impl RateLimitMiddleware {
    pub fn new(
        engine: Arc<RateLimitEngine>,
        features: Arc<FeatureFlags>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            engine,
            features,
            metrics,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = RateLimitMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
            engine: Arc::clone(&self.engine),
            features: Arc::clone(&self.features),
            metrics: Arc::clone(&self.metrics),
        }))
    }
}

/// Service implementation for the rate limit middleware.
pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    engine: Arc<RateLimitEngine>,
    features: Arc<FeatureFlags>,
    metrics: Arc<Metrics>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let engine = Arc::clone(&self.engine);
        let features = Arc::clone(&self.features);
        let metrics = Arc::clone(&self.metrics);

        Box::pin(async move {
            if !features.is_enabled(Feature::RateLimiting) {
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            }

            let path = req.path().to_string();
            let route = req.match_pattern().unwrap_or_else(|| path.clone());
            let method = req.method().to_string();
            let user_id = req.extensions().get::<UserId>().map(|u| u.0.clone());
            let client_ip = client_ip(&req);

            let info = RequestInfo {
                path: &path,
                user_id: user_id.as_deref(),
                client_ip: &client_ip,
            };

            // None: disabled, or no usable tier; either way the request
            // passes through without headers
            let Some(decision) = engine.check(&info).await else {
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            };

            if decision.allowed {
                let mut res = service.call(req).await?;
                insert_rate_limit_headers(res.headers_mut(), &decision);
                return Ok(res.map_into_left_body());
            }

            let retry_after = (decision.reset - epoch_secs()).max(1);
            debug!(route = %route, client_ip = %client_ip, "rate limit exceeded");
            metrics.record_http_request(&method, &route, 429, user_id.as_deref().unwrap_or(""));

            let mut response = HttpResponse::TooManyRequests();
            response
                .insert_header((HEADER_LIMIT, decision.limit.to_string()))
                .insert_header((HEADER_REMAINING, "0"))
                .insert_header((HEADER_RESET, decision.reset.to_string()))
                .insert_header((RETRY_AFTER, retry_after.to_string()));

            let response = response.json(json!({
                "error": "Rate limit exceeded",
                "retry_after": retry_after,
            }));

            Ok(req.into_response(response).map_into_right_body())
        })
    }
}

fn insert_rate_limit_headers(
    headers: &mut actix_web::http::header::HeaderMap,
    decision: &RateLimitDecision,
) {
    headers.insert(
        HeaderName::from_static(HEADER_LIMIT),
        HeaderValue::from(decision.limit),
    );
    headers.insert(
        HeaderName::from_static(HEADER_REMAINING),
        HeaderValue::from(decision.remaining),
    );
    headers.insert(
        HeaderName::from_static(HEADER_RESET),
        HeaderValue::from(decision.reset),
    );
}

/// Client IP as the framework resolves it (reverse-proxy aware), with any
/// port stripped so logically identical clients share one counter key.
fn client_ip(req: &ServiceRequest) -> String {
    let info = req.connection_info();
    let addr = info.realip_remote_addr().unwrap_or("unknown");
    match addr.parse::<SocketAddr>() {
        Ok(socket) => socket.ip().to_string(),
        Err(_) => addr.to_string(),
    }
}
