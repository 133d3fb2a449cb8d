//! Path pattern matching
//!
//! Three pattern forms, checked in order: exact literal, trailing `/*`
//! wildcard, and `:param` segments. No regex, no brace expansion.

use crate::config::TierConfig;
use std::collections::BTreeMap;

/// Check whether a request path matches a registered pattern.
pub fn match_path(pattern: &str, path: &str) -> bool {
    if pattern == path {
        return true;
    }

    // Trailing wildcard covers strictly deeper paths, not the prefix itself
    if let Some(prefix) = pattern.strip_suffix("/*") {
        return path
            .strip_prefix(prefix)
            .map_or(false, |rest| rest.len() > 1 && rest.starts_with('/'));
    }

    // Parameter segments: equal segment count, `:x` matches any non-empty one
    if pattern.contains(':') {
        let pattern_parts: Vec<&str> = pattern.split('/').collect();
        let path_parts: Vec<&str> = path.split('/').collect();

        if pattern_parts.len() != path_parts.len() {
            return false;
        }

        return pattern_parts
            .iter()
            .zip(&path_parts)
            .all(|(pat, part)| {
                if pat.starts_with(':') {
                    !part.is_empty()
                } else {
                    pat == part
                }
            });
    }

    false
}

/// Specificity rank for overlap resolution: fewer wildcard segments wins,
/// then fewer parameter segments. Lower is more specific.
pub(crate) fn specificity(pattern: &str) -> (usize, usize) {
    let wildcards = pattern.split('/').filter(|segment| *segment == "*").count();
    let params = pattern
        .split('/')
        .filter(|segment| segment.starts_with(':'))
        .count();
    (wildcards, params)
}

/// Find the registered pattern matching `path`.
///
/// Among several matching patterns the most specific wins; equally specific
/// patterns resolve in map order, which `BTreeMap` keeps lexicographic, so
/// overlapping rules behave the same on every run.
pub fn resolve_pattern<'a>(
    registry: &'a BTreeMap<String, TierConfig>,
    path: &str,
) -> Option<(&'a str, &'a TierConfig)> {
    registry
        .iter()
        .filter(|(pattern, _)| match_path(pattern, path))
        .min_by_key(|(pattern, _)| specificity(pattern))
        .map(|(pattern, tier)| (pattern.as_str(), tier))
}
