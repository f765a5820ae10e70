//! Module implement an append-only arena of tree nodes.
//!
//! Nodes are never freed: the whole mutation history of the tree stays
//! reachable through the version registry, so reclaiming a node would
//! tear a hole into some older version. Handles are plain indexes into
//! the arena, which keeps the cyclic parent/child graph free of
//! ownership puzzles.

use std::fmt;

use crate::rbt::node::Node;

/// Handle to a node. Handles are only meaningful together with the
/// [Index](crate::rbt::Index) instance that issued them.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "n{}", self.0)
    }
}

pub(crate) struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    pub(crate) fn new() -> Arena {
        Arena { nodes: Vec::default() }
    }

    pub(crate) fn alloc(&mut self, node: Node) -> NodeId {
        debug_assert!(self.nodes.len() < (u32::MAX as usize));
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }
}
