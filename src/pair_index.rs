use ahash::RandomState;
use alloc::string::String;
use hashbrown::{Equivalent, HashMap};

/// A hashed, reference-counted set of `(primary, secondary)` string pairs.
///
/// The directory uses it to answer "is this brand+model listed at all?"
/// without walking the tree. Each pair counts how many records share it and
/// disappears when the last one is removed.
#[derive(Debug, Clone)]
pub struct PairIndex {
    /// Maps each pair to the number of records carrying it
    counts: HashMap<(String, String), usize, RandomState>,
}

impl Default for PairIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl PairIndex {
    /// Creates an empty index with a fresh random hasher state
    pub fn new() -> Self {
        Self {
            counts: HashMap::with_hasher(RandomState::default()),
        }
    }

    /// Number of distinct pairs
    #[inline]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns true if no pair is indexed
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Registers one more record for the pair
    ///
    /// # Returns
    ///
    /// * `bool` - True if the pair was not indexed before
    pub fn insert(&mut self, primary: &str, secondary: &str) -> bool {
        if let Some(count) = self.counts.get_mut(&PairRef(primary, secondary)) {
            *count += 1;
            return false;
        }
        self.counts
            .insert((String::from(primary), String::from(secondary)), 1);
        true
    }

    /// Releases one record for the pair, dropping it once no record remains
    ///
    /// # Returns
    ///
    /// * `bool` - True if the pair was indexed
    pub fn remove(&mut self, primary: &str, secondary: &str) -> bool {
        let key = PairRef(primary, secondary);
        let Some(count) = self.counts.get_mut(&key) else {
            return false;
        };
        *count -= 1;
        if *count == 0 {
            self.counts.remove(&key);
        }
        true
    }

    /// Returns true if at least one record carries the pair
    pub fn contains(&self, primary: &str, secondary: &str) -> bool {
        self.counts.contains_key(&PairRef(primary, secondary))
    }

    /// Number of records carrying the pair
    pub fn count(&self, primary: &str, secondary: &str) -> usize {
        self.counts
            .get(&PairRef(primary, secondary))
            .copied()
            .unwrap_or(0)
    }

    /// Forgets every pair
    pub fn clear(&mut self) {
        self.counts.clear();
    }
}

/// Borrowed form of a stored pair; hashes exactly like `(String, String)`
#[derive(Hash)]
struct PairRef<'a>(&'a str, &'a str);

impl Equivalent<(String, String)> for PairRef<'_> {
    fn equivalent(&self, key: &(String, String)) -> bool {
        self.0 == key.0 && self.1 == key.1
    }
}

#[cfg(test)]
mod tests {
    use super::PairIndex;

    #[test]
    fn test_new_is_empty() {
        let index = PairIndex::new();
        assert!(index.is_empty());
        assert!(!index.contains("Toyota", "Corolla"));
        assert_eq!(index.count("Toyota", "Corolla"), 0);
    }

    #[test]
    fn test_insert_and_contains() {
        let mut index = PairIndex::new();
        assert!(index.insert("Toyota", "Corolla"));
        assert!(index.insert("Toyota", "Camry"));

        assert!(index.contains("Toyota", "Corolla"));
        assert!(index.contains("Toyota", "Camry"));
        assert!(!index.contains("Honda", "Corolla"));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_pair_boundaries_are_kept() {
        let mut index = PairIndex::new();
        index.insert("AB", "C");

        // Plain concatenation would confuse these
        assert!(!index.contains("A", "BC"));
        assert!(index.contains("AB", "C"));
    }

    #[test]
    fn test_reference_counting() {
        let mut index = PairIndex::new();
        assert!(index.insert("Lada", "Niva"));
        assert!(!index.insert("Lada", "Niva"));
        assert_eq!(index.count("Lada", "Niva"), 2);
        assert_eq!(index.len(), 1);

        assert!(index.remove("Lada", "Niva"));
        assert!(index.contains("Lada", "Niva"));

        assert!(index.remove("Lada", "Niva"));
        assert!(!index.contains("Lada", "Niva"));
        assert!(index.is_empty());

        assert!(!index.remove("Lada", "Niva"));
    }

    #[test]
    fn test_clear() {
        let mut index = PairIndex::new();
        index.insert("a", "b");
        index.insert("c", "d");
        index.clear();
        assert!(index.is_empty());
        assert!(!index.contains("a", "b"));
    }
}
