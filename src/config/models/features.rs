//! Feature flag configuration defaults

use crate::features::Feature;
use std::collections::BTreeMap;

/// Default feature flag map used when the configuration omits `features`.
pub fn default_features() -> BTreeMap<String, bool> {
    Feature::all()
        .iter()
        .map(|feature| (feature.as_str().to_string(), feature.default_value()))
        .collect()
}
