//! Module implement the version registry: a monotone counter and the
//! ordered log of roots the tree has had over its mutation history.

use crate::rbt::arena::NodeId;

pub(crate) struct Versions {
    cur: u64,
    // (version, root) pairs in non-decreasing version order. A version
    // can appear more than once, rotation at the top and node copying
    // both re-root within the same mutation, the newest entry wins.
    roots: Vec<(u64, Option<NodeId>)>,
}

impl Versions {
    pub(crate) fn new() -> Versions {
        Versions { cur: 0, roots: vec![(0, None)] }
    }

    #[inline]
    pub(crate) fn current(&self) -> u64 {
        self.cur
    }

    // called exactly once at the start of every mutation.
    #[inline]
    pub(crate) fn advance(&mut self) -> u64 {
        self.cur += 1;
        self.cur
    }

    /// Root of the tree as of `ver`. Versions newer than the counter
    /// clamp to the latest root.
    pub(crate) fn root_at(&self, ver: u64) -> Option<NodeId> {
        for (v, root) in self.roots.iter().rev() {
            if *v <= ver {
                return *root;
            }
        }
        None
    }

    pub(crate) fn set_root(&mut self, root: Option<NodeId>, ver: u64) {
        debug_assert!(ver >= self.roots.last().map(|(v, _)| *v).unwrap_or(0));
        self.roots.push((ver, root));
    }

    #[inline]
    pub(crate) fn n_roots(&self) -> usize {
        self.roots.len()
    }
}

#[cfg(test)]
#[path = "versions_test.rs"]
mod versions_test;
