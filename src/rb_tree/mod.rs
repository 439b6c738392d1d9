use alloc::vec::Vec;
use core::{borrow::Borrow, cmp::Ordering, fmt, mem};

use log::{debug, trace};

use crate::value_list::ValueList;

mod iter;
mod validate;

pub use iter::{Iter, RowSink};

/// Sentinel slot index standing in for an absent node
pub(crate) const NIL: usize = usize::MAX;

/// Red-Black tree node colors used to maintain tree balance properties.
///
/// Red-Black trees maintain balance by ensuring:
/// - Red nodes have black children
/// - All paths from a node to its leaves have equal black node counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Color {
    Red,
    Black,
}

/// Side of a parent a child hangs on, also used as a rotation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Left,
    Right,
}

impl Direction {
    #[inline]
    const fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// A node in the Red-Black tree: one key and every distinct value stored under it.
#[derive(Debug, Clone)]
pub(crate) struct Node<K, V> {
    /// The key ordering this node within the tree
    pub(crate) key: K,

    /// Distinct values stored under `key`, never empty while the node is reachable
    pub(crate) values: ValueList<V>,

    /// Slot of the parent node (NIL if this is root). Never owns anything.
    pub(crate) parent: usize,

    /// Slot of the left child (NIL if no left child)
    pub(crate) left: usize,

    /// Slot of the right child (NIL if no right child)
    pub(crate) right: usize,

    /// Color of this node used for Red-Black tree balancing
    pub(crate) color: Color,
}

/// An ordered multi-map backed by a Red-Black tree.
///
/// Each key owns a [`ValueList`] of distinct values. Adding a value under an
/// existing key appends to that key's list; removing the last value of a key
/// removes the key from the tree in the same call.
///
/// Nodes live in an arena addressed by slot index, and freed slots are
/// recycled through a free list. Parent links are plain indices.
///
/// Keys must implement a consistent total order. An `Ord` implementation that
/// contradicts itself does not cause memory unsafety, but it silently breaks
/// the search order, after which lookups may miss keys that are present.
///
/// # Example
///
/// ```
/// use car_directory::RbTree;
///
/// let mut tree = RbTree::new();
/// tree.insert("Toyota", "Corolla");
/// tree.insert("Toyota", "Camry");
/// tree.insert("Honda", "Civic");
///
/// assert_eq!(tree.get_values("Toyota"), &["Corolla", "Camry"]);
/// assert!(tree.contains("Honda", &"Civic"));
/// assert!(!tree.contains("Honda", &"Accord"));
/// ```
#[derive(Clone)]
pub struct RbTree<K, V> {
    /// Node arena; `None` marks a slot waiting on the free list
    nodes: Vec<Option<Node<K, V>>>,

    /// Stack of vacant slots available for reuse
    free_list: Vec<usize>,

    /// Slot of the root node, NIL when the tree is empty
    root: usize,

    /// Number of distinct keys currently stored
    len: usize,

    /// Number of values across all keys
    total_values: usize,
}

/// A borrowed view of one tree node.
///
/// Holding a `NodeRef` keeps the tree borrowed, so the tree cannot be
/// mutated while a view or a traversal is alive.
pub struct NodeRef<'a, K, V> {
    id: usize,
    node: &'a Node<K, V>,
}

impl<K, V> Clone for NodeRef<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for NodeRef<'_, K, V> {}

impl<'a, K, V> NodeRef<'a, K, V> {
    /// The key of this node
    #[inline]
    pub fn key(&self) -> &'a K {
        &self.node.key
    }

    /// The distinct values stored under this key, in insertion order
    #[inline]
    pub fn values(&self) -> &'a ValueList<V> {
        &self.node.values
    }

    /// The arena slot holding this node.
    ///
    /// Stable for as long as the node's slot is live. Removing a key with two
    /// children moves the key into another node's slot, so ids identify
    /// physical nodes rather than keys.
    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for NodeRef<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("key", &self.node.key)
            .field("values", &self.node.values)
            .finish()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for RbTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|n| (n.key(), n.values().as_slice())))
            .finish()
    }
}

impl<K, V> Default for RbTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> RbTree<K, V> {
    /// Creates an empty tree. Does not allocate.
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free_list: Vec::new(),
            root: NIL,
            len: 0,
            total_values: 0,
        }
    }

    /// Creates an empty tree with room for `capacity` keys before reallocating
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            root: NIL,
            len: 0,
            total_values: 0,
        }
    }

    /// Number of distinct keys
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Number of values across all keys
    #[inline]
    pub const fn total_values(&self) -> usize {
        self.total_values
    }

    /// Returns true if the tree holds no keys
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.root == NIL
    }

    /// Drops every node and releases the arena.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free_list.clear();
        self.root = NIL;
        self.len = 0;
        self.total_values = 0;
    }

    /// The node with the smallest key, or `None` if the tree is empty
    pub fn first(&self) -> Option<NodeRef<'_, K, V>> {
        if self.root == NIL {
            return None;
        }
        Some(self.node_ref(self.find_minimum(self.root)))
    }

    /// The node with the largest key, or `None` if the tree is empty
    pub fn last(&self) -> Option<NodeRef<'_, K, V>> {
        if self.root == NIL {
            return None;
        }
        Some(self.node_ref(self.find_maximum(self.root)))
    }

    /// Number of nodes on the longest root-to-leaf path (0 when empty)
    pub fn height(&self) -> usize {
        if self.root == NIL {
            return 0;
        }

        let mut max_depth = 0;
        let mut stack = alloc::vec![(self.root, 1usize)];
        while let Some((idx, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            let node = self.node(idx);
            if node.left != NIL {
                stack.push((node.left, depth + 1));
            }
            if node.right != NIL {
                stack.push((node.right, depth + 1));
            }
        }
        max_depth
    }

    /// Ascending in-order traversal over the nodes.
    ///
    /// Every call starts a fresh traversal.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self)
    }

    /// Writes one row per (key, value) pair into `sink`, keys ascending and
    /// values in insertion order within a key.
    pub fn write_rows<S: RowSink<K, V> + ?Sized>(&self, sink: &mut S) {
        for node in self.iter() {
            for value in node.values() {
                sink.push_row(node.key(), value);
            }
        }
    }

    #[inline]
    pub(crate) fn node(&self, idx: usize) -> &Node<K, V> {
        match self.nodes.get(idx) {
            Some(Some(node)) => node,
            _ => unreachable!("slot {idx} does not hold a live node"),
        }
    }

    #[inline]
    fn node_mut(&mut self, idx: usize) -> &mut Node<K, V> {
        match self.nodes.get_mut(idx) {
            Some(Some(node)) => node,
            _ => unreachable!("slot {idx} does not hold a live node"),
        }
    }

    #[inline]
    fn node_ref(&self, idx: usize) -> NodeRef<'_, K, V> {
        NodeRef {
            id: idx,
            node: self.node(idx),
        }
    }

    fn allocate_node(&mut self, key: K, values: ValueList<V>, parent: usize) -> usize {
        let node = Node {
            key,
            values,
            parent,
            left: NIL,
            right: NIL,
            color: Color::Red,
        };

        match self.free_list.pop() {
            Some(idx) => {
                self.nodes[idx] = Some(node);
                idx
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    /// Vacates a slot and hands back the key and values it held
    fn deallocate_node(&mut self, idx: usize) -> (K, ValueList<V>) {
        match self.nodes.get_mut(idx).and_then(Option::take) {
            Some(node) => {
                self.free_list.push(idx);
                (node.key, node.values)
            }
            None => unreachable!("slot {idx} freed twice"),
        }
    }

    /// Exchanges key and values of two distinct nodes, leaving links and colors alone
    fn swap_contents(&mut self, a: usize, b: usize) {
        debug_assert_ne!(a, b);
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.nodes.split_at_mut(hi);
        match (&mut head[lo], &mut tail[0]) {
            (Some(x), Some(y)) => {
                mem::swap(&mut x.key, &mut y.key);
                mem::swap(&mut x.values, &mut y.values);
            }
            _ => unreachable!("content swap between slots {a} and {b} hit a vacant slot"),
        }
    }

    fn find_minimum(&self, mut node: usize) -> usize {
        while node != NIL {
            let left = self.node(node).left;
            if left == NIL {
                break;
            }
            node = left;
        }
        node
    }

    fn find_maximum(&self, mut node: usize) -> usize {
        while node != NIL {
            let right = self.node(node).right;
            if right == NIL {
                break;
            }
            node = right;
        }
        node
    }

    #[inline]
    fn get_color(&self, idx: usize) -> Color {
        if idx == NIL {
            Color::Black
        } else {
            self.node(idx).color
        }
    }

    #[inline]
    fn set_color(&mut self, idx: usize, color: Color) {
        if idx != NIL {
            self.node_mut(idx).color = color;
        }
    }

    #[inline]
    fn is_red(&self, idx: usize) -> bool {
        self.get_color(idx) == Color::Red
    }

    #[inline]
    fn is_black(&self, idx: usize) -> bool {
        self.get_color(idx) == Color::Black
    }

    #[inline]
    fn get_parent(&self, idx: usize) -> usize {
        if idx == NIL { NIL } else { self.node(idx).parent }
    }

    #[inline]
    fn get_child(&self, idx: usize, dir: Direction) -> usize {
        if idx == NIL {
            return NIL;
        }
        let node = self.node(idx);
        match dir {
            Direction::Left => node.left,
            Direction::Right => node.right,
        }
    }

    #[inline]
    fn set_child(&mut self, idx: usize, dir: Direction, child: usize) {
        let node = self.node_mut(idx);
        match dir {
            Direction::Left => node.left = child,
            Direction::Right => node.right = child,
        }
    }

    /// Which side of its parent `idx` hangs on. Must not be called on root.
    #[inline]
    fn side_of(&self, idx: usize) -> Direction {
        if self.get_child(self.get_parent(idx), Direction::Left) == idx {
            Direction::Left
        } else {
            Direction::Right
        }
    }

    #[inline]
    fn sibling(&self, idx: usize) -> usize {
        let parent = self.get_parent(idx);
        if parent == NIL {
            return NIL;
        }
        self.get_child(parent, self.side_of(idx).opposite())
    }

    #[inline]
    fn has_red_child(&self, idx: usize) -> bool {
        self.is_red(self.get_child(idx, Direction::Left))
            || self.is_red(self.get_child(idx, Direction::Right))
    }

    /// Puts `new_node` into the slot of `old_node`'s parent (or the root)
    fn replace_in_parent(&mut self, old_node: usize, new_node: usize) {
        let parent = self.get_parent(old_node);
        if parent == NIL {
            self.root = new_node;
        } else {
            let side = self.side_of(old_node);
            self.set_child(parent, side, new_node);
        }
        if new_node != NIL {
            self.node_mut(new_node).parent = parent;
        }
    }

    /// Rotates the subtree at `x` in direction `dir`.
    ///
    /// A left rotation lifts `x`'s right child into `x`'s place; a right
    /// rotation lifts the left child. Colors are untouched.
    fn rotate(&mut self, x: usize, dir: Direction) {
        let y = self.get_child(x, dir.opposite());
        if x == NIL || y == NIL {
            return;
        }
        trace!("rotate {dir:?} at slot {x}");

        let inner = self.get_child(y, dir);
        self.set_child(x, dir.opposite(), inner);
        if inner != NIL {
            self.node_mut(inner).parent = x;
        }

        self.replace_in_parent(x, y);

        self.set_child(y, dir, x);
        self.node_mut(x).parent = y;
    }

    fn fix_insertion_violations(&mut self, mut node: usize) {
        while node != self.root && self.is_red(node) && self.is_red(self.get_parent(node)) {
            let mut parent = self.get_parent(node);
            let grandparent = self.get_parent(parent);
            let side = self.side_of(parent);
            let uncle = self.get_child(grandparent, side.opposite());

            if self.is_red(uncle) {
                trace!("insert fixup: recolor at grandparent slot {grandparent}");
                self.set_color(grandparent, Color::Red);
                self.set_color(parent, Color::Black);
                self.set_color(uncle, Color::Black);
                node = grandparent;
            } else {
                if node == self.get_child(parent, side.opposite()) {
                    self.rotate(parent, side);
                    node = parent;
                    parent = self.get_parent(node);
                }
                self.rotate(grandparent, side.opposite());

                let parent_color = self.get_color(parent);
                let grandparent_color = self.get_color(grandparent);
                self.set_color(parent, grandparent_color);
                self.set_color(grandparent, parent_color);
                node = parent;
            }
        }
        let root = self.root;
        self.set_color(root, Color::Black);
    }

    /// Structurally removes node `v` and returns the key and values it held.
    ///
    /// A node with two children trades contents with the largest node of its
    /// left subtree, and that node is removed instead.
    fn delete_node(&mut self, mut v: usize) -> (K, ValueList<V>) {
        let left = self.node(v).left;
        if left != NIL && self.node(v).right != NIL {
            let predecessor = self.find_maximum(left);
            self.swap_contents(v, predecessor);
            v = predecessor;
        }

        let u = {
            let node = self.node(v);
            if node.left != NIL { node.left } else { node.right }
        };
        let both_black = self.is_black(u) && self.is_black(v);

        if u == NIL {
            if v == self.root {
                self.root = NIL;
            } else {
                if both_black {
                    self.fix_double_black(v);
                } else {
                    let sibling = self.sibling(v);
                    self.set_color(sibling, Color::Red);
                }
                let parent = self.get_parent(v);
                let side = self.side_of(v);
                self.set_child(parent, side, NIL);
            }
            debug!("released leaf slot {v}");
            return self.deallocate_node(v);
        }

        if v == self.root {
            // The only child of a black root is a red leaf.
            debug_assert!(self.node(u).left == NIL && self.node(u).right == NIL);
            self.swap_contents(v, u);
            let root = self.node_mut(v);
            root.left = NIL;
            root.right = NIL;
            debug!("collapsed root child slot {u} into root");
            return self.deallocate_node(u);
        }

        self.replace_in_parent(v, u);
        if both_black {
            self.fix_double_black(u);
        } else {
            self.set_color(u, Color::Black);
        }
        debug!("spliced out slot {v}");
        self.deallocate_node(v)
    }

    /// Repairs a missing unit of black height on the path through `x`.
    fn fix_double_black(&mut self, mut x: usize) {
        loop {
            if x == self.root {
                return;
            }

            let parent = self.get_parent(x);
            let sibling = self.sibling(x);
            if sibling == NIL {
                x = parent;
                continue;
            }

            let sibling_side = self.side_of(sibling);

            if self.is_red(sibling) {
                trace!("double black at slot {x}: red sibling {sibling}");
                self.set_color(parent, Color::Red);
                self.set_color(sibling, Color::Black);
                self.rotate(parent, sibling_side.opposite());
                continue;
            }

            if self.has_red_child(sibling) {
                trace!("double black at slot {x}: sibling {sibling} has a red child");
                let left_red = self.is_red(self.get_child(sibling, Direction::Left));
                let outer_red = match sibling_side {
                    Direction::Left => left_red,
                    Direction::Right => !left_red,
                };

                let parent_color = self.get_color(parent);
                if outer_red {
                    let outer = self.get_child(sibling, sibling_side);
                    let sibling_color = self.get_color(sibling);
                    self.set_color(outer, sibling_color);
                    self.set_color(sibling, parent_color);
                    self.rotate(parent, sibling_side.opposite());
                } else {
                    let inner = self.get_child(sibling, sibling_side.opposite());
                    self.set_color(inner, parent_color);
                    self.rotate(sibling, sibling_side);
                    self.rotate(parent, sibling_side.opposite());
                }
                self.set_color(parent, Color::Black);
                return;
            }

            self.set_color(sibling, Color::Red);
            if self.is_black(parent) {
                x = parent;
            } else {
                self.set_color(parent, Color::Black);
                return;
            }
        }
    }
}

impl<K: Ord, V: PartialEq> RbTree<K, V> {
    /// Adds `value` under `key`.
    ///
    /// A new key gets a new node; an existing key gets `value` appended to its
    /// list unless an equal value is already there.
    ///
    /// # Returns
    ///
    /// * `bool` - True if the value was stored, false if it was already present
    pub fn insert(&mut self, key: K, value: V) -> bool {
        if self.root == NIL {
            let idx = self.allocate_node(key, ValueList::with_value(value), NIL);
            self.node_mut(idx).color = Color::Black;
            self.root = idx;
            self.len = 1;
            self.total_values = 1;
            debug!("created root in slot {idx}");
            return true;
        }

        let mut current = self.root;
        let (parent, side) = loop {
            let node = self.node(current);
            let (ordering, left, right) = (key.cmp(&node.key), node.left, node.right);
            match ordering {
                Ordering::Equal => {
                    let added = self.node_mut(current).values.push_back(value);
                    if added {
                        self.total_values += 1;
                    }
                    return added;
                }
                Ordering::Less if left == NIL => break (current, Direction::Left),
                Ordering::Less => current = left,
                Ordering::Greater if right == NIL => break (current, Direction::Right),
                Ordering::Greater => current = right,
            }
        };

        let idx = self.allocate_node(key, ValueList::with_value(value), parent);
        self.set_child(parent, side, idx);
        self.len += 1;
        self.total_values += 1;
        debug!("created node in slot {idx} under slot {parent}");

        self.fix_insertion_violations(idx);

        #[cfg(debug_assertions)]
        debug_assert!(
            self.validate().is_ok(),
            "RB tree invariants violated after insertion"
        );

        true
    }

    /// Removes `value` from the list under `key`, dropping the key once its
    /// list is empty.
    ///
    /// # Returns
    ///
    /// * `bool` - True if the value was found and removed
    pub fn remove<Q>(&mut self, key: &Q, value: &V) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let Some(idx) = self.find_node(key) else {
            return false;
        };
        if self.node_mut(idx).values.remove(value).is_none() {
            return false;
        }
        self.total_values -= 1;

        if self.node(idx).values.is_empty() {
            self.delete_node(idx);
            self.len -= 1;
        }

        #[cfg(debug_assertions)]
        debug_assert!(
            self.validate().is_ok(),
            "RB tree invariants violated after removal"
        );

        true
    }

    /// Removes `key` together with all of its values.
    ///
    /// # Returns
    ///
    /// * `Option<ValueList<V>>` - The detached values, or `None` if the key was absent
    pub fn remove_key<Q>(&mut self, key: &Q) -> Option<ValueList<V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let idx = self.find_node(key)?;
        let (_, values) = self.delete_node(idx);
        self.len -= 1;
        self.total_values -= values.len();

        #[cfg(debug_assertions)]
        debug_assert!(
            self.validate().is_ok(),
            "RB tree invariants violated after key removal"
        );

        Some(values)
    }

    /// Returns true if `key` is present
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_node(key).is_some()
    }

    /// Returns true if `value` is stored under `key`
    pub fn contains<Q>(&self, key: &Q, value: &V) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_value(key, value).is_some()
    }

    /// Looks up the node for `key`
    pub fn find<Q>(&self, key: &Q) -> Option<NodeRef<'_, K, V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_node(key).map(|idx| self.node_ref(idx))
    }

    /// Looks up the node for `key`, counting one comparison step per node
    /// visited, the terminating step included.
    pub fn find_counted<Q>(&self, key: &Q) -> (Option<NodeRef<'_, K, V>>, usize)
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let (found, steps) = self.find_node_counted(key);
        (found.map(|idx| self.node_ref(idx)), steps)
    }

    /// Looks up the node for `key`, then scans its values for `value`
    pub fn find_value<Q>(&self, key: &Q, value: &V) -> Option<NodeRef<'_, K, V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).filter(|node| node.values().contains(value))
    }

    /// The value list under `key`, if the key is present
    pub fn get<Q>(&self, key: &Q) -> Option<&ValueList<V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).map(|node| node.values())
    }

    /// The values under `key`; empty if the key is absent
    pub fn get_values<Q>(&self, key: &Q) -> &[V]
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).map_or(&[], ValueList::as_slice)
    }

    /// Same as [`get_values`](Self::get_values), also returning the number of
    /// nodes visited during the descent
    pub fn get_values_counted<Q>(&self, key: &Q) -> (&[V], usize)
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let (found, steps) = self.find_counted(key);
        (found.map_or(&[], |node| node.values().as_slice()), steps)
    }

    fn find_node<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_node_counted(key).0
    }

    fn find_node_counted<Q>(&self, key: &Q) -> (Option<usize>, usize)
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root;
        let mut steps = 0;

        while current != NIL {
            steps += 1;
            let node = self.node(current);
            match key.cmp(node.key.borrow()) {
                Ordering::Equal => return (Some(current), steps),
                Ordering::Less => current = node.left,
                Ordering::Greater => current = node.right,
            }
        }
        (None, steps)
    }
}

impl<K: Ord, V: PartialEq> Extend<(K, V)> for RbTree<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V: PartialEq> FromIterator<(K, V)> for RbTree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<'a, K, V> IntoIterator for &'a RbTree<K, V> {
    type Item = NodeRef<'a, K, V>;
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
