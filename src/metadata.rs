//! Artwork metadata derivation.
//!
//! Inventory rows are free text typed into a spreadsheet. Every derived field
//! goes through an explicit parse function here, each with a documented
//! result for absent or unrecognised input, instead of ad hoc truthiness
//! checks scattered through the builder.
//!
//! | Field | Source | Absent / unrecognised |
//! |---|---|---|
//! | `id` | `ID` column → slug of `Title` | `uncategorized` |
//! | `price` | first `$` amount in `Pricing` | raw pricing text (may be empty) |
//! | `available` | `Pricing` non-empty and not the sold marker | `false` |
//! | `featured` | marker column equals the flag exactly | `false` |
//! | `tags` | title words + description keywords | empty |
//! | `imageRef` | `Image` column → `images.pattern` | pattern with the id |

use crate::naming::{slug, title_words};

/// Title words that never become tags.
const STOPWORDS: &[&str] = &[
    "about", "after", "against", "along", "among", "before", "from", "into", "over", "their",
    "there", "these", "this", "those", "through", "under", "untitled", "upon", "what", "when",
    "where", "which", "while", "with", "within", "without",
];

/// Minimum title word length (exclusive) for a word to become a tag.
const MIN_TAG_WORD_LEN: usize = 3;

/// Resolve a field from multiple sources.
///
/// Takes a list of optional values in priority order and returns the first
/// non-None, non-empty value, trimmed.
///
/// ```text
/// id:    resolve(&[id_column, slug_of_title])
/// title: resolve(&[title_column, id_column])
/// ```
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}

/// Artwork id: the explicit identifier when present, else the slug of the title.
pub fn artwork_id(explicit: Option<&str>, title: &str) -> String {
    resolve(&[explicit]).unwrap_or_else(|| slug(title))
}

/// Display price for a pricing field.
///
/// Returns the first currency amount (`$` followed by digits and thousands
/// separators, with optional cents), or the trimmed pricing text verbatim when
/// no amount is present. Empty pricing yields an empty string.
///
/// - `"$1,200 framed"` → `"$1,200"`
/// - `"Price on request"` → `"Price on request"`
pub fn parse_price(pricing: &str) -> String {
    let pricing = pricing.trim();
    find_currency_amount(pricing)
        .unwrap_or(pricing)
        .to_string()
}

fn find_currency_amount(text: &str) -> Option<&str> {
    for (start, _) in text.match_indices('$') {
        let rest = &text[start + 1..];
        let len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == ','))
            .unwrap_or(rest.len());
        let amount = rest[..len].trim_end_matches(',');
        if !amount.starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }

        let mut end = start + 1 + amount.len();
        if let Some(cents) = text[end..].strip_prefix('.') {
            let digits = cents.chars().take_while(char::is_ascii_digit).count();
            if digits > 0 {
                end += 1 + digits;
            }
        }
        return Some(&text[start..end]);
    }
    None
}

/// Whether an artwork can still be bought.
///
/// `true` iff the pricing field is non-empty and is not exactly `sold_marker`.
pub fn parse_availability(pricing: &str, sold_marker: &str) -> bool {
    let pricing = pricing.trim();
    !pricing.is_empty() && pricing != sold_marker
}

/// Whether the featured marker column holds exactly the flag value.
pub fn parse_featured(marker: &str, flag: &str) -> bool {
    marker == flag
}

/// Derive tags from the title and description.
///
/// Title words longer than three characters (minus stopwords) come first,
/// followed by every keyword found as a case-insensitive substring of the
/// description. The result is ordered and free of duplicates.
pub fn derive_tags(title: &str, description: &str, keywords: &[String]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();

    for word in title_words(title) {
        if word.chars().count() > MIN_TAG_WORD_LEN
            && !STOPWORDS.contains(&word.as_str())
            && !tags.contains(&word)
        {
            tags.push(word);
        }
    }

    let description = description.to_lowercase();
    for keyword in keywords {
        let keyword = keyword.trim().to_lowercase();
        if !keyword.is_empty() && description.contains(&keyword) && !tags.contains(&keyword) {
            tags.push(keyword);
        }
    }

    tags
}

/// Substitute the artwork id into an image reference pattern.
pub fn image_reference(pattern: &str, id: &str) -> String {
    pattern.replace("{id}", id)
}
