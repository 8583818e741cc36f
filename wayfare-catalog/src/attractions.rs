//! Pulls "what's around" sentences out of free-text hotel descriptions.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn tag_pattern() -> &'static Regex {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    TAGS.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid regex"))
}

// A sentence ends at punctuation followed by whitespace or the end of the
// text, so decimals like "3.5 km" stay in one piece.
fn sentence_pattern() -> &'static Regex {
    static SENTENCES: OnceLock<Regex> = OnceLock::new();
    SENTENCES.get_or_init(|| {
        Regex::new(r"[^\n]+?(?:[.!?](?:\s+|$)|\n|$)").expect("valid regex")
    })
}

fn proximity_pattern() -> &'static Regex {
    static PROXIMITY: OnceLock<Regex> = OnceLock::new();
    PROXIMITY.get_or_init(|| {
        Regex::new(
            r"(?i)\b(nearby|near|close to|walking distance|steps (?:away )?from|minutes? (?:walk |drive )?from|within \d+(?:\.\d+)?\s*(?:km|kilomet(?:er|re)s?|miles?|mi|met(?:er|re)s?|m|minutes?|mins?))\b",
        )
        .expect("valid regex")
    })
}

/// Drop HTML tags and the handful of entities vendors actually send, then
/// collapse whitespace.
pub fn strip_markup(text: &str) -> String {
    let without_tags = tag_pattern().replace_all(text, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Sentences that talk about proximity to something, in original order,
/// without duplicates, at most `limit` of them.
pub fn nearby_attractions(description: &str, limit: usize) -> Vec<String> {
    let plain = strip_markup(description);
    let mut seen = HashSet::new();

    sentence_pattern()
        .find_iter(&plain)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty() && proximity_pattern().is_match(s))
        .filter(|s| seen.insert(s.to_lowercase()))
        .take(limit)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_markup() {
        let html = "<p>Rooms&nbsp;with <b>sea</b> views &amp; balconies.</p>";
        assert_eq!(strip_markup(html), "Rooms with sea views & balconies.");
    }

    #[test]
    fn test_extracts_only_proximity_sentences() {
        let description = "<p>A boutique stay in the old town. The souk is a 5 minutes walk from the lobby. \
            Free WiFi throughout!</p><p>Dubai Mall is within 3 km. Guests love the rooftop pool. \
            The beach is nearby.</p>";
        let found = nearby_attractions(description, 5);
        assert_eq!(
            found,
            vec![
                "The souk is a 5 minutes walk from the lobby.",
                "Dubai Mall is within 3 km.",
                "The beach is nearby.",
            ]
        );
    }

    #[test]
    fn test_deduplicates_and_limits() {
        let description =
            "Close to the metro. close to the metro. Near the marina. Steps from the beach.";
        let found = nearby_attractions(description, 2);
        assert_eq!(found, vec!["Close to the metro.", "Near the marina."]);
    }

    #[test]
    fn test_no_false_positives_inside_words() {
        // "nearly" and "clearance" must not count.
        let found =
            nearby_attractions("Nearly every room was renovated. Ample clearance for cars.", 5);
        assert!(found.is_empty());
    }

    #[test]
    fn test_decimal_distances_stay_in_one_sentence() {
        let description = "Rooms were refurbished in 2.0 style. The airport is within 3.5 km. \
            Old Town is 1.2 miles away!Breakfast is served daily";
        let found = nearby_attractions(description, 5);
        assert_eq!(found, vec!["The airport is within 3.5 km."]);

        let tail = nearby_attractions("Quiet garden rooms. The marina is within 0.8 km", 5);
        assert_eq!(tail, vec!["The marina is within 0.8 km"]);
    }
}
