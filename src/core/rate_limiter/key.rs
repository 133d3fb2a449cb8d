//! Counter key construction

use super::types::KeyType;

/// Namespace prefix shared by every counter key.
pub const KEY_PREFIX: &str = "ratelimit:";

/// Build the namespaced counter key for a tier.
///
/// Identifiers are inserted verbatim; callers normalize IP addresses before
/// passing them. The `api` sub-suffix is produced only for user+path pairs
/// and the bare api tier, so distinct tiers never collide.
pub fn build_key(key_type: KeyType, identifier: &str, path: &str) -> String {
    match key_type {
        KeyType::Global => format!("{}global", KEY_PREFIX),
        KeyType::User => {
            if path.is_empty() {
                format!("{}user:{}", KEY_PREFIX, identifier)
            } else {
                format!("{}user:{}:api:{}", KEY_PREFIX, identifier, path)
            }
        }
        KeyType::Ip => format!("{}ip:{}", KEY_PREFIX, identifier),
        KeyType::Api => format!("{}api:{}", KEY_PREFIX, path),
    }
}
