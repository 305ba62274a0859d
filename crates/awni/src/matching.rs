//! Volunteer matching for new requests.
//!
//! Pure selection logic; the request lifecycle controller applies the
//! resulting assignment. A request's coarse geographic key is its region
//! token: the substring of the location before the first comma, trimmed.

use crate::volunteer::Volunteer;

/// Extract the region token from a free-text location.
#[must_use]
pub fn region_token(location: &str) -> &str {
    location
        .split(',')
        .next()
        .unwrap_or(location)
        .trim()
}

/// Select a volunteer for a request at the given location.
///
/// Picks the first volunteer in `verified` whose city equals the region
/// token exactly; ties break on list order as returned by the gateway, with
/// no secondary ranking. When no city matches and `fallback_to_first` is
/// set, the first verified volunteer is selected regardless of location
/// relevance — a deliberate "better than nothing" policy. Returns `None`
/// when `verified` is empty, or when no city matches and the fallback is
/// disabled.
#[must_use]
pub fn select_volunteer<'a>(
    location: &str,
    verified: &'a [Volunteer],
    fallback_to_first: bool,
) -> Option<&'a Volunteer> {
    let region = region_token(location);

    verified
        .iter()
        .find(|v| v.city.trim() == region)
        .or_else(|| fallback_to_first.then(|| verified.first()).flatten())
}
