//! Fuzzy entity-name resolution
//!
//! Maps a raw, possibly mis-cased or mistyped entity-set name onto a canonical
//! registry entry. Scoring is Jaro-Winkler over a normalized form (lowercase,
//! ASCII alphanumerics only). The best candidate must clear
//! [`MATCH_THRESHOLD`]; ties go to the shortest name, then lexicographic order.

use crate::catalog::registry::EntityRegistry;
use std::cmp::Ordering;
use std::sync::Arc;

/// Minimum Jaro-Winkler similarity for a candidate to be accepted.
///
/// Below this, names sharing only a prefix with a registry entry
/// (`ProjectsV2` vs `ProductsV2`, `Sales` vs `SalesOrderLines`) would be
/// redirected to a different collection.
pub const MATCH_THRESHOLD: f64 = 0.92;

/// A successful resolution
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMatch {
    /// Canonical registry name
    pub name: String,
    /// Similarity score in `[0, 1]`
    pub score: f64,
}

impl EntityMatch {
    /// Whether the canonical name differs from what the caller typed
    pub fn is_correction(&self, requested: &str) -> bool {
        self.name != requested
    }
}

/// Resolves raw names against an injected, read-only registry
#[derive(Debug, Clone)]
pub struct EntityMatcher {
    registry: Arc<EntityRegistry>,
}

impl EntityMatcher {
    /// Create a matcher over `registry`
    pub fn new(registry: Arc<EntityRegistry>) -> Self {
        Self { registry }
    }

    /// Resolve `raw` to a canonical entity-set name.
    ///
    /// Returns `None` when nothing clears the threshold. Never panics.
    pub fn resolve(&self, raw: &str) -> Option<EntityMatch> {
        if self.registry.contains(raw) {
            return Some(EntityMatch {
                name: raw.to_string(),
                score: 1.0,
            });
        }

        let needle = normalize(raw);
        if needle.is_empty() {
            return None;
        }

        let best = self
            .registry
            .iter()
            .map(|candidate| (candidate, similarity(&needle, &normalize(candidate))))
            .filter(|(_, score)| *score >= MATCH_THRESHOLD)
            .min_by(|a, b| rank(a, b))?;

        tracing::debug!(
            requested = %raw,
            resolved = %best.0,
            score = best.1,
            "Resolved entity name"
        );

        Some(EntityMatch {
            name: best.0.to_string(),
            score: best.1,
        })
    }
}

/// Lowercase and keep only ASCII alphanumerics, so `sales_order lines`
/// and `SalesOrderLines` compare equal.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn similarity(needle: &str, candidate: &str) -> f64 {
    if needle == candidate {
        1.0
    } else {
        strsim::jaro_winkler(needle, candidate)
    }
}

// Orders best-first: higher score, then shorter name, then lexicographic.
fn rank(a: &(&str, f64), b: &(&str, f64)) -> Ordering {
    b.1.partial_cmp(&a.1)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.0.len().cmp(&b.0.len()))
        .then_with(|| a.0.cmp(b.0))
}
