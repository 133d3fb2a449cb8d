//! Core rate limiting logic

pub mod rate_limiter;
