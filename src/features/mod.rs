//! Boolean feature-flag registry
//!
//! Flags are seeded from configuration at startup and injected wherever they
//! are consulted; the string names exist only at the configuration boundary.

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// Known feature flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Tiered request rate limiting
    RateLimiting,
    /// Request payload validation
    RequestValidation,
    /// High-cardinality trace attributes
    EnhancedTracing,
    /// Business-level metric recording
    BusinessMetrics,
}

impl Feature {
    /// Configuration-file name of the flag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::RateLimiting => "rate_limiting",
            Feature::RequestValidation => "request_validation",
            Feature::EnhancedTracing => "enhanced_tracing",
            Feature::BusinessMetrics => "business_metrics",
        }
    }

    /// All known flags.
    pub fn all() -> &'static [Feature] {
        &[
            Feature::RateLimiting,
            Feature::RequestValidation,
            Feature::EnhancedTracing,
            Feature::BusinessMetrics,
        ]
    }

    /// Value used when the configuration does not mention the flag.
    pub(crate) fn default_value(&self) -> bool {
        true
    }
}

/// Feature-flag registry.
///
/// Read-heavy: flags are checked on every request, so values live in a
/// read/write-locked cache refreshed only on configuration changes.
pub struct FeatureFlags {
    cache: RwLock<HashMap<Feature, bool>>,
}

impl FeatureFlags {
    /// Build the registry from the configured flag map.
    pub fn from_config(configured: &BTreeMap<String, bool>) -> Self {
        let flags = Self {
            cache: RwLock::new(HashMap::new()),
        };
        flags.refresh(configured);
        flags
    }

    /// Check whether a feature is enabled.
    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.cache
            .read()
            .get(&feature)
            .copied()
            .unwrap_or_else(|| feature.default_value())
    }

    /// Override a single flag (operational toggles and tests).
    pub fn set(&self, feature: Feature, enabled: bool) {
        self.cache.write().insert(feature, enabled);
    }

    /// Reload all flags from a configuration map.
    pub fn refresh(&self, configured: &BTreeMap<String, bool>) {
        let mut cache = self.cache.write();
        cache.clear();
        for feature in Feature::all() {
            let value = configured
                .get(feature.as_str())
                .copied()
                .unwrap_or_else(|| feature.default_value());
            cache.insert(*feature, value);
        }
    }

    /// Snapshot of all flags keyed by configuration name.
    pub fn all(&self) -> BTreeMap<&'static str, bool> {
        let cache = self.cache.read();
        Feature::all()
            .iter()
            .map(|feature| {
                let value = cache
                    .get(feature)
                    .copied()
                    .unwrap_or_else(|| feature.default_value());
                (feature.as_str(), value)
            })
            .collect()
    }
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self::from_config(&BTreeMap::new())
    }
}
