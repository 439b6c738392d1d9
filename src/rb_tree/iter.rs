use alloc::vec::Vec;
use core::iter::FusedIterator;

use super::{NIL, NodeRef, RbTree};

/// Ascending in-order traversal over the nodes of an [`RbTree`].
///
/// Walks with an explicit stack: push the left spine, yield the top, then
/// continue with its right subtree.
pub struct Iter<'a, K, V> {
    tree: &'a RbTree<K, V>,
    /// Ancestors whose left subtree is being visited
    stack: Vec<usize>,
    /// Next subtree to descend into
    current: usize,
    /// Nodes not yet yielded
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(super) fn new(tree: &'a RbTree<K, V>) -> Self {
        Self {
            tree,
            stack: Vec::new(),
            current: tree.root,
            remaining: tree.len,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = NodeRef<'a, K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.current != NIL {
            self.stack.push(self.current);
            self.current = self.tree.node(self.current).left;
        }

        let idx = self.stack.pop()?;
        self.current = self.tree.node(idx).right;
        self.remaining = self.remaining.saturating_sub(1);
        Some(self.tree.node_ref(idx))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Destination for the flattened rows produced by [`RbTree::write_rows`].
///
/// Rows arrive with keys ascending. Within a key, values arrive in the
/// order they were added.
pub trait RowSink<K, V> {
    /// Accepts one `(key, value)` row
    fn push_row(&mut self, key: &K, value: &V);
}

impl<K: Clone, V: Clone> RowSink<K, V> for Vec<(K, V)> {
    fn push_row(&mut self, key: &K, value: &V) {
        self.push((key.clone(), value.clone()));
    }
}
