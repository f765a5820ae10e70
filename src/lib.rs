//! Package implement a partially persistent ordered set of integer keys.
//!
//! The set is organized as a red-black tree mutated with the
//! node-copying technique of Driscoll-Sarnak-Sleator-Tarjan: every
//! pointer and color assignment is tagged with a version instead of
//! being overwritten in place. Each mutation, [rbt::Index::insert] or
//! [rbt::Index::remove], advances a version counter by one. Read
//! operations accept a version argument and observe the tree exactly
//! as it stood when that version's mutation completed; version ZERO
//! is the empty tree and versions beyond the newest mutation clamp to
//! the latest state.
//!
//! Updates to historical versions, concurrent access and non-integer
//! keys are out of scope.

#[macro_use]
mod error;

pub mod rbt;
pub mod util;

pub use crate::error::Error;

/// Type alias for Result returned by functions of this package.
pub type Result<T> = std::result::Result<T, Error>;
