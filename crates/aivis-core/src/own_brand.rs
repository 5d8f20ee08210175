//! Own-brand matching: does a mention refer to the tracked business itself?

use crate::normalize::normalize_brand_name;
use crate::similarity::slugs_match;
use crate::tracked::TrackedBrand;

/// Decide, per name, whether it refers to the tracked brand.
///
/// Each name is normalized and compared against the tracked brand's own
/// identity slug and every alias slug. An exact slug match or a fuzzy match
/// at or above `threshold` counts. Output has the same length and order as
/// `names`; names that normalize to nothing are never own-brand.
#[must_use]
pub fn match_own_brand_batch<S: AsRef<str>>(
    tracked: &TrackedBrand,
    names: &[S],
    threshold: f64,
) -> Vec<bool> {
    let identity_slugs: Vec<String> = std::iter::once(tracked.name.as_str())
        .chain(tracked.aliases.iter().map(String::as_str))
        .map(normalize_brand_name)
        .filter(|slug| !slug.is_empty())
        .collect();

    names
        .iter()
        .map(|name| {
            let slug = normalize_brand_name(name.as_ref());
            !slug.is_empty()
                && identity_slugs
                    .iter()
                    .any(|own| slugs_match(&slug, own, threshold))
        })
        .collect()
}
