//! Combination generation.
//!
//! A combination keeps the first character of the target word and any
//! order-preserving subset of the remaining characters, as long as the result
//! is at least [`MIN_COMBO_LEN`] characters long. The number of combinations
//! for a word of length `L` is `sum(k = 3..=L) C(L - 1, k - 1)`, which grows as
//! `2^(L - 1)`, so words are checked against a length ceiling first.

use tracing::{debug, warn};

use crate::errors::{SearchError, SearchResult};
use crate::set::Set;

/// Shortest combination that is ever generated
pub const MIN_COMBO_LEN: usize = 3;

/// Words longer than this expand to 2^15+ combinations; still allowed, but noisy
pub const WARN_WORD_LEN: usize = 16;

/// Default hard ceiling on word length
pub const DEFAULT_MAX_WORD_LEN: usize = 20;

/// Refuses words whose expansion would be unreasonably large.
pub fn check_word_length(word: &str, max: usize) -> SearchResult<()> {
    let len = word.chars().count();
    if len > max {
        return Err(SearchError::word_too_long(len, max));
    }
    if len > WARN_WORD_LEN {
        warn!(
            "Word '{}' has {} characters and expands to {} combinations",
            word,
            len,
            expected_count(len)
        );
    }
    Ok(())
}

/// Number of combinations a word of `len` characters expands to, before
/// exclusions are applied.
pub fn expected_count(len: usize) -> u128 {
    if len < MIN_COMBO_LEN {
        return 0;
    }
    (MIN_COMBO_LEN..=len)
        .map(|k| binomial((len - 1) as u128, (k - 1) as u128))
        .fold(0, u128::saturating_add)
}

/// Saturates at `u128::MAX` instead of overflowing
fn binomial(n: u128, k: u128) -> u128 {
    let k = k.min(n - k);
    (0..k)
        .try_fold(1u128, |acc, i| Some(acc.checked_mul(n - i)? / (i + 1)))
        .unwrap_or(u128::MAX)
}

/// Generates every combination of `word`, longest first, skipping anything in
/// `excluded`. Exclusions are compared case-insensitively.
///
/// Words shorter than three characters yield no combinations at all. Words
/// with repeated letters may yield the same string more than once; the
/// writer's identity dedup absorbs the duplicate hits.
pub fn generate_combinations(word: &str, excluded: &Set<String>) -> Vec<String> {
    let chars: Vec<char> = word.chars().flat_map(char::to_lowercase).collect();
    if chars.len() < MIN_COMBO_LEN {
        warn!(
            "Word '{}' is shorter than {} characters; nothing to search for",
            word, MIN_COMBO_LEN
        );
        return Vec::new();
    }

    let excluded: Set<String> = excluded.iter().map(|c| c.to_lowercase()).collect();
    let (first, rest) = (chars[0], &chars[1..]);
    let mut results = Vec::new();
    let mut path = Vec::with_capacity(chars.len());
    path.push(first);

    for k in (MIN_COMBO_LEN..=chars.len()).rev() {
        combine(rest, 0, k, &mut path, &excluded, &mut results);
    }

    debug!(
        "Generated {} combinations for '{}' ({} excluded entries)",
        results.len(),
        word,
        excluded.len()
    );
    results
}

fn combine(
    rest: &[char],
    start: usize,
    k: usize,
    path: &mut Vec<char>,
    excluded: &Set<String>,
    results: &mut Vec<String>,
) {
    if path.len() == k {
        let combo: String = path.iter().collect();
        if !excluded.contains_str(&combo) {
            results.push(combo);
        }
        return;
    }

    // Not enough characters left to reach length k
    let needed = k - path.len();
    if rest.len() < start + needed {
        return;
    }

    for i in start..rest.len() {
        path.push(rest[i]);
        combine(rest, i + 1, k, path, excluded, results);
        path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn excluded(items: &[&str]) -> Set<String> {
        items.iter().map(|s| s.to_lowercase()).collect()
    }

    #[test]
    fn test_count_matches_closed_form() {
        for word in ["cat", "cats", "abcdef", "longerword"] {
            let combos = generate_combinations(word, &Set::new());
            assert_eq!(
                combos.len() as u128,
                expected_count(word.chars().count()),
                "count mismatch for {}",
                word
            );
        }
    }

    #[test]
    fn test_expected_count_small_values() {
        assert_eq!(expected_count(2), 0);
        assert_eq!(expected_count(3), 1);
        // C(3,2) + C(3,3)
        assert_eq!(expected_count(4), 4);
        // C(4,2) + C(4,3) + C(4,4)
        assert_eq!(expected_count(5), 11);
    }

    #[test]
    fn test_order_longest_first() {
        let combos = generate_combinations("Cats", &Set::new());
        assert_eq!(combos, vec!["cats", "cat", "cas", "cts"]);
    }

    #[test]
    fn test_all_anchored_and_long_enough() {
        let combos = generate_combinations("Investigate", &Set::new());
        assert!(!combos.is_empty());
        for combo in &combos {
            assert!(combo.starts_with('i'), "{} not anchored", combo);
            assert!(combo.chars().count() >= MIN_COMBO_LEN);
            assert_eq!(combo, &combo.to_lowercase());
        }
    }

    #[test]
    fn test_exclusions_are_honoured() {
        let ex = excluded(&["CAT", "cts"]);
        let combos = generate_combinations("cats", &ex);
        assert_eq!(combos, vec!["cats", "cas"]);
        assert!(combos.iter().all(|c| !ex.contains_str(c)));
    }

    #[test]
    fn test_exclusions_are_case_insensitive() {
        let mut ex = Set::new();
        ex.insert("CAT".to_string());
        assert!(generate_combinations("cat", &ex).is_empty());

        let ex: Set<String> = ["Cas", "cTS"].iter().map(|s| s.to_string()).collect();
        assert_eq!(generate_combinations("Cats", &ex), vec!["cats", "cat"]);
    }

    #[test]
    fn test_expected_count_saturates_for_huge_words() {
        assert_eq!(expected_count(200), u128::MAX);
        assert!(check_word_length(&"a".repeat(200), 20).is_err());
        assert!(check_word_length(&"a".repeat(200), 500).is_ok());
    }

    #[test]
    fn test_excluding_only_combo_yields_nothing() {
        let combos = generate_combinations("cat", &excluded(&["cat"]));
        assert!(combos.is_empty());
    }

    #[test]
    fn test_short_words_yield_nothing() {
        assert!(generate_combinations("ab", &Set::new()).is_empty());
        assert!(generate_combinations("a", &Set::new()).is_empty());
    }

    #[test]
    fn test_repeated_letters_produce_duplicates() {
        let combos = generate_combinations("caat", &Set::new());
        assert_eq!(combos.iter().filter(|c| c.as_str() == "cat").count(), 2);
    }

    #[test]
    fn test_non_ascii_word() {
        let combos = generate_combinations("Ärger", &Set::new());
        assert_eq!(combos.len() as u128, expected_count(5));
        assert!(combos.iter().all(|c| c.starts_with('ä')));
    }

    #[test]
    fn test_word_length_guard() {
        assert!(check_word_length("short", DEFAULT_MAX_WORD_LEN).is_ok());
        let long = "a".repeat(DEFAULT_MAX_WORD_LEN + 1);
        let err = check_word_length(&long, DEFAULT_MAX_WORD_LEN).unwrap_err();
        assert!(matches!(err, SearchError::WordTooLong { len: 21, max: 20 }));
    }
}
