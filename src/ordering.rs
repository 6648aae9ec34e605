//! Ordering policies for collections and artworks.
//!
//! The same three policies apply independently at two levels: the order of
//! collections in the catalog and the order of artworks inside each
//! collection.
//!
//! - `source_order`: the order rows appear in the inventory table. Builders
//!   push items in that order, so this policy leaves slices untouched.
//! - `alphabetical`: compares a collation key that ignores case and folds
//!   common Latin diacritics (`"Élan"` sorts with `"elan"`). Ties keep source
//!   order.
//! - `random`: Fisher–Yates shuffle driven by a SHA-256 counter stream keyed
//!   by the seed and a per-slice label.

use crate::config::OrderPolicy;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Reorder `items` according to `policy`.
///
/// `name` extracts the text compared by [`OrderPolicy::Alphabetical`].
/// `label` namespaces the shuffle stream for [`OrderPolicy::Random`].
pub fn apply_order<T>(
    items: &mut [T],
    policy: OrderPolicy,
    name: impl Fn(&T) -> &str,
    seed: u64,
    label: &str,
) {
    match policy {
        OrderPolicy::SourceOrder => {}
        OrderPolicy::Alphabetical => items.sort_by_cached_key(|item| collation_key(name(item))),
        OrderPolicy::Random => shuffle(items, &mut ShuffleStream::new(seed, label)),
    }
}

/// Seed for random ordering: the configured seed, else the build timestamp.
pub fn resolve_seed(configured: Option<u64>, generated_at: DateTime<Utc>) -> u64 {
    configured.unwrap_or_else(|| generated_at.timestamp_millis().unsigned_abs())
}

/// Case- and accent-insensitive comparison key.
pub fn collation_key(text: &str) -> String {
    let mut key = String::with_capacity(text.len());
    for c in text.trim().chars().flat_map(char::to_lowercase) {
        match fold_diacritic(c) {
            Some(folded) => key.push_str(folded),
            None => key.push(c),
        }
    }
    key
}

fn fold_diacritic(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => "a",
        'æ' => "ae",
        'ç' | 'č' | 'ć' => "c",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'ī' => "i",
        'ñ' | 'ń' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => "o",
        'œ' => "oe",
        'ß' => "ss",
        'š' | 'ś' => "s",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' => "u",
        'ý' | 'ÿ' => "y",
        'ž' | 'ź' | 'ż' => "z",
        'ł' => "l",
        _ => return None,
    };
    Some(folded)
}

/// Deterministic stream of uniformly distributed integers.
///
/// Block `n` is `SHA-256(key ‖ n)`, where `key = SHA-256(seed ‖ label)`.
#[derive(Debug, Clone)]
pub struct ShuffleStream {
    key: [u8; 32],
    counter: u64,
}

impl ShuffleStream {
    pub fn new(seed: u64, label: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(seed.to_le_bytes());
        hasher.update(label.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&hasher.finalize());
        Self { key, counter: 0 }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(self.key);
        hasher.update(self.counter.to_le_bytes());
        self.counter += 1;
        let block = hasher.finalize();
        u64::from_le_bytes(std::array::from_fn(|i| block[i]))
    }

    /// Uniform integer in `0..n`. Returns 0 when `n` is 0.
    pub fn below(&mut self, n: u64) -> u64 {
        if n == 0 {
            return 0;
        }
        // Largest multiple of n representable; values at or above it would bias the modulo.
        let limit = u64::MAX - u64::MAX % n;
        loop {
            let value = self.next_u64();
            if value < limit {
                return value % n;
            }
        }
    }
}

/// In-place Fisher–Yates shuffle.
pub fn shuffle<T>(items: &mut [T], stream: &mut ShuffleStream) {
    for i in (1..items.len()).rev() {
        let j = stream.below(i as u64 + 1) as usize;
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    // =========================================================================
    // collation_key() tests
    // =========================================================================

    #[test]
    fn collation_ignores_case_and_accents() {
        assert_eq!(collation_key("Élan"), "elan");
        assert_eq!(collation_key("  Über Straße "), "uber strasse");
        assert_eq!(collation_key("Œuvre"), "oeuvre");
    }

    #[test]
    fn collation_keeps_unmapped_characters() {
        assert_eq!(collation_key("日本 3"), "日本 3");
    }

    // =========================================================================
    // apply_order() tests
    // =========================================================================

    #[test]
    fn source_order_leaves_items() {
        let mut items = names(&["b", "a", "c"]);
        apply_order(&mut items, OrderPolicy::SourceOrder, |s| s.as_str(), 1, "t");
        assert_eq!(items, names(&["b", "a", "c"]));
    }

    #[test]
    fn alphabetical_is_locale_friendly() {
        let mut items = names(&["Zebra", "élan", "Apple", "eagle"]);
        apply_order(&mut items, OrderPolicy::Alphabetical, |s| s.as_str(), 1, "t");
        assert_eq!(items, names(&["Apple", "eagle", "élan", "Zebra"]));
    }

    #[test]
    fn alphabetical_ties_keep_source_order() {
        let mut items = vec![("Swan", 0), ("apple", 1), ("swan", 2), ("SWAN", 3)];
        apply_order(&mut items, OrderPolicy::Alphabetical, |(n, _)| *n, 1, "t");
        let order: Vec<usize> = items.iter().map(|(_, i)| *i).collect();
        assert_eq!(order, vec![1, 0, 2, 3]);
    }

    #[test]
    fn random_is_reproducible_for_seed() {
        let original: Vec<String> = (0..20).map(|i| format!("item-{i}")).collect();
        let mut a = original.clone();
        let mut b = original.clone();
        apply_order(&mut a, OrderPolicy::Random, |s| s.as_str(), 42, "collections");
        apply_order(&mut b, OrderPolicy::Random, |s| s.as_str(), 42, "collections");
        assert_eq!(a, b);

        let mut sorted = a.clone();
        sorted.sort();
        let mut expected = original.clone();
        expected.sort();
        assert_eq!(sorted, expected, "shuffle must be a permutation");
    }

    #[test]
    fn random_labels_give_independent_orders() {
        let original: Vec<u32> = (0..20).collect();
        let mut a = original.clone();
        let mut b = original.clone();
        shuffle(&mut a, &mut ShuffleStream::new(7, "artworks:one"));
        shuffle(&mut b, &mut ShuffleStream::new(7, "artworks:two"));
        assert_ne!(a, b);
    }

    // =========================================================================
    // ShuffleStream tests
    // =========================================================================

    #[test]
    fn below_stays_in_range() {
        let mut stream = ShuffleStream::new(3, "range");
        for n in 1..50 {
            assert!(stream.below(n) < n);
        }
        assert_eq!(stream.below(0), 0);
        assert_eq!(stream.below(1), 0);
    }

    #[test]
    fn shuffle_first_position_is_roughly_uniform() {
        let mut counts = [0usize; 3];
        for seed in 0..3000 {
            let mut items = [0usize, 1, 2];
            shuffle(&mut items, &mut ShuffleStream::new(seed, "uniform"));
            counts[items[0]] += 1;
        }
        for count in counts {
            assert!((800..1200).contains(&count), "skewed counts: {counts:?}");
        }
    }

    #[test]
    fn shuffle_handles_tiny_slices() {
        let mut empty: [u8; 0] = [];
        shuffle(&mut empty, &mut ShuffleStream::new(1, "x"));
        let mut one = [9];
        shuffle(&mut one, &mut ShuffleStream::new(1, "x"));
        assert_eq!(one, [9]);
    }

    #[test]
    fn seed_prefers_configured_value() {
        let at = DateTime::<Utc>::UNIX_EPOCH;
        assert_eq!(resolve_seed(Some(42), at), 42);
        assert_eq!(resolve_seed(None, at), 0);
    }
}
