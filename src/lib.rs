#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), no_std)]
#![deny(
    unsafe_code,
    unused_imports,
    unused_variables,
    unused_must_use,
    missing_docs,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented
)]
#![allow(clippy::len_without_is_empty)]

extern crate alloc;

mod errors;
pub use errors::{DirectoryError, InvariantViolation};

mod value_list;
pub use value_list::ValueList;

mod rb_tree;
pub use rb_tree::{Iter, NodeRef, RbTree, RowSink};

mod pair_index;
pub use pair_index::PairIndex;

mod directory;
pub use directory::{Car, Directory, DirectoryConfig};

#[cfg(test)]
mod proptests;
