use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;

/// A presence set used for excluded combinations, seen match identities and
/// the separator characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
#[serde(bound(
    serialize = "T: Serialize + Eq + Hash",
    deserialize = "T: Deserialize<'de> + Eq + Hash"
))]
pub struct Set<T: Eq + Hash> {
    items: HashSet<T>,
}

impl<T: Eq + Hash> Set<T> {
    pub fn new() -> Self {
        Self {
            items: HashSet::new(),
        }
    }

    /// Adds `item`, returning `true` if it was not present before
    pub fn insert(&mut self, item: T) -> bool {
        self.items.insert(item)
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl Set<String> {
    /// Looks up a string key without allocating
    pub fn contains_str(&self, item: &str) -> bool {
        self.items.contains(item)
    }
}

impl<T: Eq + Hash> Default for Set<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq + Hash> FromIterator<T> for Set<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T: Eq + Hash> Extend<T> for Set<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_reports_first_sighting() {
        let mut set = Set::new();
        assert!(set.insert("a:1:1".to_string()));
        assert!(!set.insert("a:1:1".to_string()));
        assert!(set.insert("a:1:2".to_string()));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_contains_str() {
        let set: Set<String> = ["cat", "cot"].iter().map(|s| s.to_string()).collect();
        assert!(set.contains_str("cat"));
        assert!(!set.contains_str("cut"));
    }

    #[test]
    fn test_char_set() {
        let set: Set<char> = ".,;".chars().collect();
        assert!(set.contains(&','));
        assert!(!set.contains(&'a'));
        assert!(!set.is_empty());
    }
}
