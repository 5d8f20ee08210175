//! String similarity over identity slugs.

/// Jaro-Winkler score at or above which two identity slugs are treated as
/// the same brand, both for canonical fuzzy matching and own-brand matching.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Similarity in `[0.0, 1.0]` between two identity slugs.
///
/// Identical slugs score `1.0`; an empty slug never matches anything.
#[must_use]
pub fn slug_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    strsim::jaro_winkler(a, b)
}

/// True when `slug_similarity(a, b) >= threshold`.
#[must_use]
pub fn slugs_match(a: &str, b: &str, threshold: f64) -> bool {
    slug_similarity(a, b) >= threshold
}
