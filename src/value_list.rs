use alloc::vec::Vec;

use core::ops::Deref;

/// An ordered list of distinct values attached to a single tree key.
///
/// Values keep their insertion order and are compared with `PartialEq`,
/// so two equal values can never sit in the same list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueList<V> {
    /// The values in insertion order
    items: Vec<V>,
}

impl<V> Default for ValueList<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> ValueList<V> {
    /// Creates an empty list.
    #[inline]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Returns the number of values in the list
    ///
    /// # Returns
    ///
    /// * `usize` - The number of distinct values
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the list holds no values
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the values as a slice in insertion order
    #[inline]
    pub fn as_slice(&self) -> &[V] {
        &self.items
    }

    /// Returns the oldest value, if any
    #[inline]
    pub fn first(&self) -> Option<&V> {
        self.items.first()
    }

    /// Returns the newest value, if any
    #[inline]
    pub fn last(&self) -> Option<&V> {
        self.items.last()
    }

    /// Iterates the values in insertion order
    pub fn iter(&self) -> core::slice::Iter<'_, V> {
        self.items.iter()
    }
}

impl<V: PartialEq> ValueList<V> {
    /// Creates a list holding a single value
    pub fn with_value(value: V) -> Self {
        let mut items = Vec::with_capacity(1);
        items.push(value);
        Self { items }
    }

    /// Returns true if an equal value is already stored
    #[inline]
    pub fn contains(&self, value: &V) -> bool {
        self.items.iter().any(|v| v == value)
    }

    /// Appends a value unless an equal one is already present
    ///
    /// # Arguments
    ///
    /// * `value` - The value to append
    ///
    /// # Returns
    ///
    /// * `bool` - True if the value was appended
    pub fn push_back(&mut self, value: V) -> bool {
        if self.contains(&value) {
            return false;
        }
        self.items.push(value);
        true
    }

    /// Removes the value equal to `value`, keeping the order of the rest
    ///
    /// # Returns
    ///
    /// * `Option<V>` - The removed value, or `None` if it was absent
    pub fn remove(&mut self, value: &V) -> Option<V> {
        let pos = self.items.iter().position(|v| v == value)?;
        Some(self.items.remove(pos))
    }
}

impl<V> Deref for ValueList<V> {
    type Target = [V];

    fn deref(&self) -> &[V] {
        &self.items
    }
}

impl<V> IntoIterator for ValueList<V> {
    type Item = V;
    type IntoIter = alloc::vec::IntoIter<V>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, V> IntoIterator for &'a ValueList<V> {
    type Item = &'a V;
    type IntoIter = core::slice::Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<V: PartialEq> FromIterator<V> for ValueList<V> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let mut list = Self::new();
        for value in iter {
            list.push_back(value);
        }
        list
    }
}
