use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::{Deserialize, Serialize};

/// Length bounds, in characters, a key must satisfy to be counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBounds {
    pub min: usize,
    pub max: usize,
}

impl KeyBounds {
    /// Words: at least 2 and at most 99 characters.
    pub const WORD: KeyBounds = KeyBounds { min: 2, max: 99 };
    /// Category labels: non-empty, at most 199 characters.
    pub const LABEL: KeyBounds = KeyBounds { min: 1, max: 199 };

    pub fn admits(&self, key: &str) -> bool {
        // a key never has more chars than bytes
        if key.len() < self.min {
            return false;
        }
        (self.min..=self.max).contains(&key.chars().count())
    }
}

/// Key to count mapping that only ever grows during a run.
///
/// Iteration follows first-insertion order. Equality is key-by-key and
/// ignores that order, so two tables built from the same records in a
/// different sequence compare equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrequencyTable {
    bounds: KeyBounds,
    counts: IndexMap<String, u64>,
}

impl FrequencyTable {
    pub fn new(bounds: KeyBounds) -> Self {
        Self {
            bounds,
            counts: IndexMap::new(),
        }
    }

    pub fn words() -> Self {
        Self::new(KeyBounds::WORD)
    }

    pub fn labels() -> Self {
        Self::new(KeyBounds::LABEL)
    }

    pub fn bounds(&self) -> KeyBounds {
        self.bounds
    }

    /// Count one occurrence of `key`. Keys outside the table bounds are ignored.
    pub fn increment(&mut self, key: &str) {
        if !self.bounds.admits(key) {
            return;
        }
        // get_mut first so the common hit path does not allocate
        if let Some(count) = self.counts.get_mut(key) {
            *count += 1;
        } else {
            self.counts.insert(key.to_owned(), 1);
        }
    }

    /// Fold `other` into `self`, summing counts of shared keys. Keys new to
    /// `self` are appended in `other`'s iteration order.
    pub fn merge(&mut self, other: FrequencyTable) {
        self.counts.reserve(other.counts.len());
        for (key, count) in other.counts {
            match self.counts.entry(key) {
                Entry::Occupied(mut slot) => *slot.get_mut() += count,
                Entry::Vacant(slot) => {
                    slot.insert(count);
                }
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.counts.get(key).copied()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(key, count)| (key.as_str(), *count))
    }
}

impl PartialEq for FrequencyTable {
    fn eq(&self, other: &Self) -> bool {
        self.bounds == other.bounds && self.counts == other.counts
    }
}

impl Eq for FrequencyTable {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn table_of(keys: &[&str]) -> FrequencyTable {
        let mut table = FrequencyTable::words();
        for key in keys {
            table.increment(key);
        }
        table
    }

    #[test]
    fn increment_inserts_then_counts() {
        let table = table_of(&["rock", "pop", "rock"]);
        assert_eq!(table.get("rock"), Some(2));
        assert_eq!(table.get("pop"), Some(1));
        assert_eq!(table.len(), 2);
        assert_eq!(table.total(), 3);
    }

    #[test]
    fn increment_ignores_out_of_bounds_keys() {
        let mut words = FrequencyTable::words();
        words.increment("a");
        words.increment(&"w".repeat(100));
        words.increment(&"w".repeat(99));
        assert_eq!(words.len(), 1);

        let mut labels = FrequencyTable::labels();
        labels.increment("");
        labels.increment(&"c".repeat(200));
        labels.increment("X");
        assert_eq!(labels.iter().collect::<Vec<_>>(), vec![("X", 1)]);
    }

    #[test]
    fn bounds_count_characters_not_bytes() {
        let mut words = FrequencyTable::words();
        words.increment("é");
        words.increment(&"ç".repeat(99));
        words.increment(&"ç".repeat(100));
        assert_eq!(words.len(), 1);
        assert_eq!(words.get(&"ç".repeat(99)), Some(1));

        let mut labels = FrequencyTable::labels();
        labels.increment("Ñ");
        labels.increment(&"ü".repeat(199));
        assert_eq!(labels.len(), 2);
    }

    #[test]
    fn iteration_follows_first_insertion() {
        let table = table_of(&["zeta", "alpha", "zeta", "mid"]);
        let keys: Vec<_> = table.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn merge_with_empty_is_identity() {
        let mut table = table_of(&["love", "love", "peace"]);
        let before = table.clone();
        table.merge(FrequencyTable::words());
        assert_eq!(table, before);

        let mut empty = FrequencyTable::words();
        empty.merge(before.clone());
        assert_eq!(empty, before);
    }

    #[test]
    fn merge_with_self_doubles() {
        let mut table = table_of(&["love", "love", "peace"]);
        table.merge(table.clone());
        assert_eq!(table.get("love"), Some(4));
        assert_eq!(table.get("peace"), Some(2));
    }

    #[test]
    fn merge_appends_new_keys_in_other_order() {
        let mut left = table_of(&["bb", "aa"]);
        left.merge(table_of(&["dd", "aa", "cc"]));
        let keys: Vec<_> = left.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["bb", "aa", "dd", "cc"]);
        assert_eq!(left.get("aa"), Some(2));
    }

    fn key_strategy() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["rock", "pop", "jazz", "blues", "soul", "funk"])
            .prop_map(str::to_string)
    }

    fn table_strategy() -> impl Strategy<Value = FrequencyTable> {
        prop::collection::vec(key_strategy(), 0..20).prop_map(|keys| {
            let mut table = FrequencyTable::words();
            for key in &keys {
                table.increment(key);
            }
            table
        })
    }

    proptest! {
        #[test]
        fn merge_is_commutative(a in table_strategy(), b in table_strategy()) {
            let mut ab = a.clone();
            ab.merge(b.clone());
            let mut ba = b;
            ba.merge(a);
            prop_assert_eq!(ab, ba);
        }

        #[test]
        fn merge_is_associative(
            a in table_strategy(),
            b in table_strategy(),
            c in table_strategy(),
        ) {
            let mut left = a.clone();
            left.merge(b.clone());
            left.merge(c.clone());

            let mut bc = b;
            bc.merge(c);
            let mut right = a;
            right.merge(bc);

            prop_assert_eq!(left, right);
        }

        #[test]
        fn single_record_tables_merge_in_any_order(
            keys in prop::collection::vec(key_strategy(), 1..30),
            seed in any::<u64>(),
        ) {
            use rand::SeedableRng;
            use rand::seq::SliceRandom;

            let singles: Vec<FrequencyTable> = keys.iter().map(|k| table_of(&[k.as_str()])).collect();

            let mut fixed = FrequencyTable::words();
            for table in singles.iter().cloned() {
                fixed.merge(table);
            }

            let mut shuffled = singles;
            shuffled.shuffle(&mut rand::rngs::StdRng::seed_from_u64(seed));
            let mut any_order = FrequencyTable::words();
            for table in shuffled {
                any_order.merge(table);
            }

            prop_assert_eq!(fixed.len(), any_order.len());
            prop_assert_eq!(fixed, any_order);
        }
    }
}
