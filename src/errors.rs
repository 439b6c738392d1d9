//! Error types for tree validation and directory updates.

use thiserror::Error;

/// A broken red-black or multi-map invariant found by [`RbTree::validate`].
///
/// Slots are arena indices, usable with [`NodeRef::id`] for diagnostics.
///
/// [`RbTree::validate`]: crate::RbTree::validate
/// [`NodeRef::id`]: crate::NodeRef::id
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// The root node is colored red
    #[error("root node in slot {slot} is red")]
    RedRoot {
        /// Arena slot of the root
        slot: usize,
    },

    /// A red node has a red child
    #[error("red node in slot {parent} has red child in slot {child}")]
    RedRedEdge {
        /// Slot of the red parent
        parent: usize,
        /// Slot of its red child
        child: usize,
    },

    /// Two paths below a node reach leaves through different black counts
    #[error("black height mismatch below slot {slot}: left {left}, right {right}")]
    BlackHeightMismatch {
        /// Slot of the unbalanced node
        slot: usize,
        /// Black height of the left subtree
        left: usize,
        /// Black height of the right subtree
        right: usize,
    },

    /// In-order keys are not strictly ascending
    #[error("key in slot {slot} is not greater than its in-order predecessor")]
    OutOfOrder {
        /// Slot of the misplaced node
        slot: usize,
    },

    /// A child does not point back at its parent
    #[error("node in slot {slot} does not point back at parent slot {expected}")]
    BrokenParentLink {
        /// Slot of the child
        slot: usize,
        /// Slot its parent link should hold
        expected: usize,
    },

    /// A reachable node holds no values
    #[error("node in slot {slot} has an empty value list")]
    EmptyValueList {
        /// Slot of the empty node
        slot: usize,
    },

    /// A value list holds two equal values
    #[error("node in slot {slot} holds a duplicate value")]
    DuplicateValue {
        /// Slot of the offending node
        slot: usize,
    },

    /// Cached counters disagree with the reachable nodes
    #[error("tree reports {expected} {what} but {found} are reachable")]
    LengthMismatch {
        /// Which counter disagrees, `"keys"` or `"values"`
        what: &'static str,
        /// Value of the cached counter
        expected: usize,
        /// Number actually reachable from the root
        found: usize,
    },
}

/// Reasons a car is rejected by [`Directory::insert`].
///
/// [`Directory::insert`]: crate::Directory::insert
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// A production year falls outside the configured window
    #[error("year {year} is outside the accepted range {min}..={max}")]
    YearOutOfRange {
        /// The rejected year
        year: u16,
        /// Earliest accepted year
        min: u16,
        /// Latest accepted year
        max: u16,
    },

    /// Production ends before it starts
    #[error("production end {end} precedes start {start}")]
    EndBeforeStart {
        /// First production year
        start: u16,
        /// Last production year
        end: u16,
    },

    /// The exact same car is already listed
    #[error("car is already listed in the directory")]
    Duplicate,

    /// Another generation of the same brand and model covers these years
    #[error("production years overlap the generation listed from {start}")]
    OverlappingGeneration {
        /// Start year of the listed generation
        start: u16,
    },
}

impl DirectoryError {
    /// Check if this error is caused by the production years
    pub fn is_year_error(&self) -> bool {
        matches!(
            self,
            DirectoryError::YearOutOfRange { .. }
                | DirectoryError::EndBeforeStart { .. }
                | DirectoryError::OverlappingGeneration { .. }
        )
    }
}
