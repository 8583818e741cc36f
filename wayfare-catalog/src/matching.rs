//! Identifier resolution rules, tried in order until one hits.
//!
//! Call sites hand us ids in whatever shape they had lying around: vendor
//! numbers rendered as text, namespaced ids, or the 1-based position the old
//! listing pages used. Each rule covers one of those shapes.

use serde::Serialize;
use wayfare_core::catalog::{CatalogEntry, HotelId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchRule {
    Exact,
    Normalized,
    Substring,
    Position,
}

pub type Matcher = fn(&[CatalogEntry], &HotelId) -> Option<usize>;

pub const MATCHERS: &[(MatchRule, Matcher)] = &[
    (MatchRule::Exact, match_exact),
    (MatchRule::Normalized, match_normalized),
    (MatchRule::Substring, match_substring),
    (MatchRule::Position, match_position),
];

/// Index of the first hotel matched by the earliest rule that matches at all.
pub fn find_match(hotels: &[CatalogEntry], wanted: &HotelId) -> Option<(MatchRule, usize)> {
    MATCHERS
        .iter()
        .find_map(|(rule, matcher)| matcher(hotels, wanted).map(|idx| (*rule, idx)))
}

pub fn match_exact(hotels: &[CatalogEntry], wanted: &HotelId) -> Option<usize> {
    hotels.iter().position(|h| &h.id == wanted)
}

/// Equal once both sides are rendered as text, so `7788` finds `"7788"`.
/// Case and whitespace are significant.
pub fn match_normalized(hotels: &[CatalogEntry], wanted: &HotelId) -> Option<usize> {
    let wanted = wanted.to_string();
    if wanted.is_empty() {
        return None;
    }
    hotels.iter().position(|h| h.id.to_string() == wanted)
}

/// Either id contains the other, case-sensitively. Empty ids never match.
pub fn match_substring(hotels: &[CatalogEntry], wanted: &HotelId) -> Option<usize> {
    let wanted = wanted.to_string();
    if wanted.is_empty() {
        return None;
    }
    hotels.iter().position(|h| {
        let stored = h.id.to_string();
        !stored.is_empty() && (stored.contains(&wanted) || wanted.contains(&stored))
    })
}

pub fn match_position(hotels: &[CatalogEntry], wanted: &HotelId) -> Option<usize> {
    wanted
        .as_positive_index()
        .filter(|n| *n <= hotels.len())
        .map(|n| n - 1)
}
