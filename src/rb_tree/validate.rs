use super::{NIL, RbTree};
use crate::errors::InvariantViolation;

impl<K: Ord, V: PartialEq> RbTree<K, V> {
    /// Walks the whole tree and checks every structural invariant.
    ///
    /// Checks search order, parent links, root color, red-red edges, black
    /// height, value list contents and the cached counters. O(n).
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        if self.root == NIL {
            return self.verify_counts(0, 0);
        }

        if self.is_red(self.root) {
            return Err(InvariantViolation::RedRoot { slot: self.root });
        }
        if self.node(self.root).parent != NIL {
            return Err(InvariantViolation::BrokenParentLink {
                slot: self.root,
                expected: NIL,
            });
        }

        self.verify_black_height(self.root)?;

        let mut nodes = 0;
        let mut values = 0;
        let mut previous: Option<&K> = None;
        for node in self.iter() {
            if previous.is_some_and(|prev| prev >= node.key()) {
                return Err(InvariantViolation::OutOfOrder { slot: node.id() });
            }
            previous = Some(node.key());

            let list = node.values();
            if list.is_empty() {
                return Err(InvariantViolation::EmptyValueList { slot: node.id() });
            }
            for (i, value) in list.iter().enumerate() {
                if list[i + 1..].contains(value) {
                    return Err(InvariantViolation::DuplicateValue { slot: node.id() });
                }
            }

            nodes += 1;
            values += list.len();
        }

        self.verify_counts(nodes, values)
    }

    fn verify_counts(&self, nodes: usize, values: usize) -> Result<(), InvariantViolation> {
        if nodes != self.len {
            return Err(InvariantViolation::LengthMismatch {
                what: "keys",
                expected: self.len,
                found: nodes,
            });
        }
        if values != self.total_values {
            return Err(InvariantViolation::LengthMismatch {
                what: "values",
                expected: self.total_values,
                found: values,
            });
        }
        Ok(())
    }

    /// Returns the black height of the subtree at `idx`, counting the empty leaf
    fn verify_black_height(&self, idx: usize) -> Result<usize, InvariantViolation> {
        if idx == NIL {
            return Ok(1);
        }

        let node = self.node(idx);

        for child in [node.left, node.right] {
            if child == NIL {
                continue;
            }
            if self.node(child).parent != idx {
                return Err(InvariantViolation::BrokenParentLink {
                    slot: child,
                    expected: idx,
                });
            }
            if self.is_red(idx) && self.is_red(child) {
                return Err(InvariantViolation::RedRedEdge { parent: idx, child });
            }
        }

        let left = self.verify_black_height(node.left)?;
        let right = self.verify_black_height(node.right)?;

        if left != right {
            return Err(InvariantViolation::BlackHeightMismatch {
                slot: idx,
                left,
                right,
            });
        }

        if self.is_black(idx) {
            Ok(left + 1)
        } else {
            Ok(left)
        }
    }
}
