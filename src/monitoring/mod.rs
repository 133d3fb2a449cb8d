//! Request metrics recording

pub mod metrics;

pub use metrics::{Metrics, MetricsSnapshot};
