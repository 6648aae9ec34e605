//! Slug derivation shared by artwork ids, collection ids, and tag words.
//!
//! Every identifier the catalog invents is a slug of some human-entered text.
//! The same rule applies everywhere so an artwork without an explicit `ID`
//! column and a collection referenced only by name land on the same key:
//!
//! - `"Black Swan"` → `black-swan`
//! - `"  Nocturne No. 3  "` → `nocturne-no-3`
//! - `"Été à Paris"` → `t-paris`
//! - `""` → `uncategorized`

/// Identifier used when a slug would otherwise be empty.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Derive a URL/key-safe slug from free text.
///
/// - Lowercases ASCII letters
/// - Replaces every character outside `[a-z0-9]` with a dash
/// - Collapses consecutive dashes into one
/// - Strips leading and trailing dashes
/// - Returns [`UNCATEGORIZED`] when nothing survives
///
/// The result always matches `[a-z0-9]+(-[a-z0-9]+)*`.
pub fn slug(text: &str) -> String {
    let mut collapsed = String::with_capacity(text.len());
    let mut prev_dash = false;
    for c in text.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            collapsed.push(c);
            prev_dash = false;
        } else if !prev_dash {
            collapsed.push('-');
            prev_dash = true;
        }
    }

    let trimmed = collapsed.trim_matches('-');
    if trimmed.is_empty() {
        UNCATEGORIZED.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Split a title into lowercase words made of alphanumeric characters.
///
/// Punctuation separates words: `"Dusk, over the Marsh"` →
/// `["dusk", "over", "the", "marsh"]`.
pub fn title_words(title: &str) -> Vec<String> {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}
