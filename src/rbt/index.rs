// Module ``index`` implement the partially persistent red-black tree.
//
// [Index] is a plain owned type: mutations take `&mut self`, reads take
// `&self` and a version. Reads are pure and can be made at any version
// between ZERO (the empty tree) and the newest mutation; newer versions
// clamp to the newest state.
//
// Internally every pointer and color assignment goes through
// [Index::set_field], which tags the assignment with the current
// version and appends it to the target node's modification log. When a
// log fills up the node is copied out: a replacement is allocated with
// the node's newest field values as its baseline and the neighbours
// that reference the node are re-pointed at the replacement, see
// [Index::copy_out]. Old copies stay in the arena and keep answering
// reads for the versions they cover.

use tracing::{debug, trace};

use std::{io, mem};

use crate::{
    rbt::arena::{Arena, NodeId},
    rbt::depth::Depth,
    rbt::node::{Color, Field, Mod, Node, Snap, Value},
    rbt::stats::Stats,
    rbt::versions::Versions,
    Result,
};

pub const MAX_TREE_DEPTH: usize = 100;

/// Index type for a partially persistent ordered set of `i32` keys.
///
/// Mutations are serialized behind `&mut self` and each advances the
/// version counter exactly once. `i32::MAX` is reserved as the
/// no-successor sentinel and must not be inserted.
pub struct Index {
    name: String,

    arena: Arena,
    versions: Versions,
    n_count: usize,
}

// construction and maintenance.
impl Index {
    pub fn new(name: &str) -> Index {
        Index {
            name: name.to_string(),
            arena: Arena::new(),
            versions: Versions::new(),
            n_count: 0,
        }
    }

    /// Return name of this index instance.
    #[inline]
    pub fn to_name(&self) -> String {
        self.name.clone()
    }

    /// Return number of keys present in the newest version.
    #[inline]
    pub fn len(&self) -> usize {
        self.n_count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n_count == 0
    }

    /// Return the version of the newest completed mutation, ZERO when
    /// no mutation has happened yet.
    #[inline]
    pub fn current_version(&self) -> u64 {
        self.versions.current()
    }

    /// Quick statistics. Black-height and depth statistics are only
    /// available from [Index::validate].
    pub fn to_stats(&self) -> Stats {
        let mut stats = Stats::new(&self.name);
        stats.node_size = mem::size_of::<Node>();
        stats.n_count = self.n_count;
        stats.n_nodes = self.arena.len();
        stats.n_versions = self.versions.current();
        stats.n_roots = self.versions.n_roots();
        stats
    }
}

// write operations.
impl Index {
    /// Insert `key` into the set. Inserting a key that is already
    /// present is a precondition violation and fails without touching
    /// the version counter. Return the version of the mutation.
    pub fn insert(&mut self, key: i32) -> Result<u64> {
        // descend to the attach point, rejecting duplicates before the
        // version counter moves.
        let mut parent = None;
        let mut cur = self.versions.root_at(u64::MAX).map(|id| self.resolve(id));
        while let Some(id) = cur {
            if self.arena.node(id).key == key {
                return err_at!(InvalidInput, msg: "duplicate key {}", key);
            }
            parent = Some(id);
            cur = if key < self.arena.node(id).key {
                self.cur_left(id)
            } else {
                self.cur_right(id)
            };
        }

        let ver = self.versions.advance();
        debug!(key, ver, "insert");

        let node = self.arena.alloc(Node::new(key));
        match parent {
            None => self.versions.set_root(Some(node), ver),
            Some(p) if key < self.arena.node(p).key => {
                self.set_link(p, Field::Left, Some(node))?
            }
            Some(p) => self.set_link(p, Field::Right, Some(node))?,
        }
        self.set_link(node, Field::Parent, parent)?;

        self.insert_fixup(node)?;
        self.n_count += 1;

        Ok(ver)
    }

    /// Remove `key` from the set. Removing an absent key is a no-op
    /// and does not advance the version; the version of the mutation
    /// is returned otherwise.
    pub fn remove(&mut self, key: i32) -> Result<Option<u64>> {
        let node = match self.search(key, u64::MAX) {
            Some(id) => self.resolve(id),
            None => return Ok(None),
        };

        let ver = self.versions.advance();
        debug!(key, ver, "remove");

        let left = self.cur_left(node);
        let right = self.cur_right(node);

        let (moved, deleted_black) = if left.is_none() || right.is_none() {
            let black = self.color_at(node, u64::MAX) == Color::Black;
            (self.unlink_single(node)?, black)
        } else {
            let right = match right {
                Some(right) => right,
                None => return err_at!(Fatal, msg: "two-child case without right child"),
            };
            let subst = self.minimum_cur(right);

            // make sure the substitute has a right child to move up,
            // spawning a transient nil marker when it has none.
            if self.cur_right(subst).is_none() {
                let nil = self.arena.alloc(Node::new_nil());
                self.set_link(subst, Field::Right, Some(nil))?;
                self.set_link(nil, Field::Parent, Some(subst))?;
            }
            let moved = match self.cur_right(subst) {
                Some(moved) => moved,
                None => return err_at!(Fatal, msg: "substitute without right child"),
            };

            if self.resolve(subst) != self.resolve(right) {
                // detach the substitute, then take over the right arm.
                let subst_parent = self.cur_parent(subst);
                self.swap_parents_child(subst_parent, subst, Some(moved))?;
                let node_right = match self.cur_right(node) {
                    Some(r) => r,
                    None => return err_at!(Fatal, msg: "lost right arm while detaching"),
                };
                self.set_link(subst, Field::Right, Some(node_right))?;
                self.set_link(node_right, Field::Parent, Some(subst))?;
            }

            // splice the substitute into the removed node's slot, take
            // over the left arm and the color.
            let black = self.color_at(subst, u64::MAX) == Color::Black;
            let node_color = self.color_at(node, u64::MAX);
            let node_parent = self.cur_parent(node);
            self.swap_parents_child(node_parent, node, Some(subst))?;
            let node_left = match self.cur_left(node) {
                Some(l) => l,
                None => return err_at!(Fatal, msg: "lost left arm while splicing"),
            };
            self.set_link(subst, Field::Left, Some(node_left))?;
            self.set_link(node_left, Field::Parent, Some(subst))?;
            self.set_color(subst, node_color)?;

            (Some(moved), black)
        };

        if deleted_black {
            match moved {
                Some(x) => self.remove_fixup(x)?,
                None => return err_at!(Fatal, msg: "black removal without moved-up node"),
            }
        }

        // nil markers only live for the duration of the fixup.
        if let Some(m) = moved {
            let m = self.resolve(m);
            if self.arena.node(m).is_nil() {
                let parent = self.cur_parent(m);
                self.swap_parents_child(parent, m, None)?;
            }
        }

        self.n_count -= 1;

        Ok(Some(ver))
    }

    // swap the node's only child, or a nil marker when a black node
    // has none, into its slot. Return the moved-up node.
    fn unlink_single(&mut self, node: NodeId) -> Result<Option<NodeId>> {
        let parent = self.cur_parent(node);
        if let Some(left) = self.cur_left(node) {
            self.swap_parents_child(parent, node, Some(left))?;
            Ok(Some(left))
        } else if let Some(right) = self.cur_right(node) {
            self.swap_parents_child(parent, node, Some(right))?;
            Ok(Some(right))
        } else if self.color_at(node, u64::MAX) == Color::Black {
            let nil = self.arena.alloc(Node::new_nil());
            self.swap_parents_child(parent, node, Some(nil))?;
            Ok(Some(nil))
        } else {
            self.swap_parents_child(parent, node, None)?;
            Ok(None)
        }
    }

    fn insert_fixup(&mut self, node: NodeId) -> Result<()> {
        let mut parent = match self.cur_parent(node) {
            None => return self.set_color(node, Color::Black),
            Some(parent) => parent,
        };
        if self.color_at(parent, u64::MAX) == Color::Black {
            return Ok(());
        }
        let grand = match self.cur_parent(parent) {
            None => return self.set_color(parent, Color::Black),
            Some(grand) => grand,
        };

        match self.uncle(parent, grand) {
            Some(uncle) if self.color_at(uncle, u64::MAX) == Color::Red => {
                self.set_color(parent, Color::Black)?;
                self.set_color(grand, Color::Red)?;
                self.set_color(uncle, Color::Black)?;
                self.insert_fixup(grand)
            }
            _ if self.is_left_child(parent, grand) => {
                if self.is_right_child(node, parent) {
                    self.rotate_left(parent)?;
                    parent = node;
                }
                self.rotate_right(grand)?;
                self.set_color(parent, Color::Black)?;
                self.set_color(grand, Color::Red)
            }
            _ => {
                if self.is_left_child(node, parent) {
                    self.rotate_right(parent)?;
                    parent = node;
                }
                self.rotate_left(grand)?;
                self.set_color(parent, Color::Black)?;
                self.set_color(grand, Color::Red)
            }
        }
    }

    // `node` carries double-black weight after a black node left the
    // tree; restore the black-height balance around it.
    fn remove_fixup(&mut self, node: NodeId) -> Result<()> {
        let node = self.resolve(node);
        let root = self.versions.root_at(u64::MAX).map(|id| self.resolve(id));
        if root == Some(node) {
            return self.set_color(node, Color::Black);
        }

        let mut sib = self.sibling(node)?;
        if self.color_at(sib, u64::MAX) == Color::Red {
            // demote the red sibling and rotate the parent toward us.
            let parent = self.strict_parent(node)?;
            self.set_color(sib, Color::Black)?;
            self.set_color(parent, Color::Red)?;
            if self.is_left_child(node, parent) {
                self.rotate_left(parent)?;
            } else {
                self.rotate_right(parent)?;
            }
            sib = self.sibling(node)?;
        }

        let sib_left = self.cur_left(sib);
        let sib_right = self.cur_right(sib);
        if self.is_black_at(sib_left, u64::MAX) && self.is_black_at(sib_right, u64::MAX) {
            self.set_color(sib, Color::Red)?;
            let parent = self.strict_parent(node)?;
            if self.color_at(parent, u64::MAX) == Color::Red {
                self.set_color(parent, Color::Black)
            } else {
                self.remove_fixup(parent)
            }
        } else {
            self.fix_red_nephew(node, sib)
        }
    }

    // black sibling with at least one red child; one or two rotations
    // settle the double-black weight.
    fn fix_red_nephew(&mut self, node: NodeId, mut sib: NodeId) -> Result<()> {
        let parent = self.strict_parent(node)?;
        let is_left = self.is_left_child(node, parent);

        if is_left && self.is_black_at(self.cur_right(sib), u64::MAX) {
            let sl = match self.cur_left(sib) {
                Some(sl) => sl,
                None => return err_at!(Fatal, msg: "sibling without red child"),
            };
            self.set_color(sl, Color::Black)?;
            self.set_color(sib, Color::Red)?;
            self.rotate_right(sib)?;
            let parent = self.strict_parent(node)?;
            sib = match self.cur_right(parent) {
                Some(sib) => sib,
                None => return err_at!(Fatal, msg: "sibling lost after rotation"),
            };
        } else if !is_left && self.is_black_at(self.cur_left(sib), u64::MAX) {
            let sr = match self.cur_right(sib) {
                Some(sr) => sr,
                None => return err_at!(Fatal, msg: "sibling without red child"),
            };
            self.set_color(sr, Color::Black)?;
            self.set_color(sib, Color::Red)?;
            self.rotate_left(sib)?;
            let parent = self.strict_parent(node)?;
            sib = match self.cur_left(parent) {
                Some(sib) => sib,
                None => return err_at!(Fatal, msg: "sibling lost after rotation"),
            };
        }

        let parent = self.strict_parent(node)?;
        let parent_color = self.color_at(parent, u64::MAX);
        self.set_color(sib, parent_color)?;
        self.set_color(parent, Color::Black)?;
        if is_left {
            let sr = match self.cur_right(sib) {
                Some(sr) => sr,
                None => return err_at!(Fatal, msg: "missing outer nephew"),
            };
            self.set_color(sr, Color::Black)?;
            self.rotate_left(parent)
        } else {
            let sl = match self.cur_left(sib) {
                Some(sl) => sl,
                None => return err_at!(Fatal, msg: "missing outer nephew"),
            };
            self.set_color(sl, Color::Black)?;
            self.rotate_right(parent)
        }
    }

    //              (p)                      (p)
    //               |                        |
    //              node                    right
    //              /  \                     /  \
    //           left  right     ==>      node  r-r
    //                 /  \               /  \
    //              r-l    r-r         left  r-l
    //
    fn rotate_left(&mut self, node: NodeId) -> Result<()> {
        let node = self.resolve(node);
        let parent = self.cur_parent(node);
        let right = match self.cur_right(node) {
            Some(right) => right,
            None => return err_at!(Fatal, msg: "rotate-left without right child"),
        };
        let right_left = self.cur_left(right);

        self.set_link(node, Field::Right, right_left)?;
        if let Some(rl) = right_left {
            self.set_link(rl, Field::Parent, Some(node))?;
        }
        self.set_link(right, Field::Left, Some(node))?;
        self.set_link(node, Field::Parent, Some(right))?;

        self.swap_parents_child(parent, node, Some(right))
    }

    //              (p)                      (p)
    //               |                        |
    //              node                     left
    //              /  \                     /  \
    //           left  right     ==>      l-l   node
    //           /  \                           /  \
    //        l-l    l-r                     l-r   right
    //
    fn rotate_right(&mut self, node: NodeId) -> Result<()> {
        let node = self.resolve(node);
        let parent = self.cur_parent(node);
        let left = match self.cur_left(node) {
            Some(left) => left,
            None => return err_at!(Fatal, msg: "rotate-right without left child"),
        };
        let left_right = self.cur_right(left);

        self.set_link(node, Field::Left, left_right)?;
        if let Some(lr) = left_right {
            self.set_link(lr, Field::Parent, Some(node))?;
        }
        self.set_link(left, Field::Right, Some(node))?;
        self.set_link(node, Field::Parent, Some(left))?;

        self.swap_parents_child(parent, node, Some(left))
    }

    // replace `old` with `new` in the parent's child slot, or re-root
    // the tree when there is no parent.
    fn swap_parents_child(
        &mut self,
        parent: Option<NodeId>,
        old: NodeId,
        new: Option<NodeId>,
    ) -> Result<()> {
        match parent {
            None => {
                let ver = self.versions.current();
                let root = new.map(|id| self.resolve(id));
                self.versions.set_root(root, ver);
            }
            Some(p) if self.is_left_child(old, p) => self.set_link(p, Field::Left, new)?,
            Some(p) if self.is_right_child(old, p) => self.set_link(p, Field::Right, new)?,
            Some(_) => return err_at!(Fatal, msg: "node is not a child of its parent"),
        }
        if let Some(new) = new {
            self.set_link(new, Field::Parent, parent)?;
        }
        Ok(())
    }
}

// versioned field access. All reads go through [Index::field_at], all
// writes through [Index::set_field].
impl Index {
    // chase replacement copies down to the live one.
    fn resolve(&self, mut id: NodeId) -> NodeId {
        while let Some(next) = self.arena.node(id).fwd {
            id = next;
        }
        id
    }

    // newest copy of the node whose log covers `ver`. Reads for
    // versions older than a copy's newest entry stay on that copy.
    fn read_head(&self, mut id: NodeId, ver: u64) -> NodeId {
        loop {
            let node = self.arena.node(id);
            match node.fwd {
                Some(next) if node.latest_ver() <= ver => id = next,
                _ => break id,
            }
        }
    }

    fn field_at(&self, id: NodeId, field: Field, ver: u64) -> Value {
        let id = self.read_head(id, ver);
        let node = self.arena.node(id);
        match node.lookup(field, ver) {
            Some(value) => value,
            None => match field {
                Field::Left => Value::Link(node.original.left),
                Field::Right => Value::Link(node.original.right),
                Field::Parent => Value::Link(node.original.parent),
                Field::Color => Value::Color(node.original.color),
            },
        }
    }

    fn link_at(&self, id: NodeId, field: Field, ver: u64) -> Option<NodeId> {
        match self.field_at(id, field, ver) {
            Value::Link(link) => link,
            Value::Color(_) => unreachable!(),
        }
    }

    fn color_at(&self, id: NodeId, ver: u64) -> Color {
        match self.field_at(id, Field::Color, ver) {
            Value::Color(color) => color,
            Value::Link(_) => unreachable!(),
        }
    }

    fn is_black_at(&self, node: Option<NodeId>, ver: u64) -> bool {
        node.map_or(true, |id| self.color_at(id, ver) == Color::Black)
    }

    fn is_red_at(&self, node: Option<NodeId>, ver: u64) -> bool {
        !self.is_black_at(node, ver)
    }

    // neighbours in the newest version, resolved to live copies.
    fn cur_left(&self, id: NodeId) -> Option<NodeId> {
        self.link_at(id, Field::Left, u64::MAX).map(|l| self.resolve(l))
    }

    fn cur_right(&self, id: NodeId) -> Option<NodeId> {
        self.link_at(id, Field::Right, u64::MAX).map(|r| self.resolve(r))
    }

    fn cur_parent(&self, id: NodeId) -> Option<NodeId> {
        self.link_at(id, Field::Parent, u64::MAX).map(|p| self.resolve(p))
    }

    fn strict_parent(&self, id: NodeId) -> Result<NodeId> {
        match self.cur_parent(id) {
            Some(parent) => Ok(parent),
            None => err_at!(Fatal, msg: "missing parent for {:?}", id),
        }
    }

    fn is_left_child(&self, node: NodeId, parent: NodeId) -> bool {
        self.cur_left(parent) == Some(self.resolve(node))
    }

    fn is_right_child(&self, node: NodeId, parent: NodeId) -> bool {
        self.cur_right(parent) == Some(self.resolve(node))
    }

    fn sibling(&self, node: NodeId) -> Result<NodeId> {
        let parent = self.strict_parent(node)?;
        let sib = if self.is_left_child(node, parent) {
            self.cur_right(parent)
        } else {
            self.cur_left(parent)
        };
        match sib {
            Some(sib) => Ok(sib),
            None => err_at!(Fatal, msg: "missing sibling for {:?}", node),
        }
    }

    fn uncle(&self, parent: NodeId, grand: NodeId) -> Option<NodeId> {
        if self.is_left_child(parent, grand) {
            self.cur_right(grand)
        } else {
            self.cur_left(grand)
        }
    }

    fn set_link(&mut self, id: NodeId, field: Field, to: Option<NodeId>) -> Result<()> {
        self.set_field(id, field, Value::Link(to))
    }

    fn set_color(&mut self, id: NodeId, color: Color) -> Result<()> {
        self.set_field(id, Field::Color, Value::Color(color))
    }

    // version-tagged write. Appends to the target's modification log,
    // keeps the neighbour links of both ends in sync, and copies the
    // node out when the log saturates.
    fn set_field(&mut self, id: NodeId, field: Field, value: Value) -> Result<()> {
        let id = self.resolve(id);
        let ver = self.versions.current();

        if self.arena.node(id).is_full() {
            return err_at!(Fatal, msg: "saturated log on {:?} at version {}", id, ver);
        }

        // the log always names live copies.
        let value = match value {
            Value::Link(Some(to)) => Value::Link(Some(self.resolve(to))),
            value => value,
        };
        self.arena.node_mut(id).push(Mod { ver, field, value });

        match (field, value) {
            (Field::Left, Value::Link(to)) => {
                self.arena.node_mut(id).ret_left = to;
                if let Some(to) = to {
                    self.arena.node_mut(to).ret_parent = Some(id);
                }
            }
            (Field::Right, Value::Link(to)) => {
                self.arena.node_mut(id).ret_right = to;
                if let Some(to) = to {
                    self.arena.node_mut(to).ret_parent = Some(id);
                }
            }
            (Field::Parent, Value::Link(to)) => {
                self.arena.node_mut(id).ret_parent = to;
                if let Some(parent) = to {
                    if self.cur_left(parent) == Some(id) {
                        self.arena.node_mut(parent).ret_left = Some(id);
                    } else if self.cur_right(parent) == Some(id) {
                        self.arena.node_mut(parent).ret_right = Some(id);
                    } else {
                        return err_at!(Fatal, msg: "{:?} not linked under {:?}", id, parent);
                    }
                }
            }
            (Field::Color, _) => (),
            (_, _) => return err_at!(Fatal, msg: "link field written with a color"),
        }

        if self.arena.node(id).is_full() {
            self.copy_out(id)?;
        }

        Ok(())
    }

    // the node's log just saturated: allocate a replacement whose
    // baseline is the node's newest state, re-point the neighbours that
    // reference the node, then leave a forwarding link behind. The
    // re-pointing writes are themselves version-tagged and can cascade
    // into further copies.
    fn copy_out(&mut self, id: NodeId) -> Result<()> {
        let ver = self.versions.current();
        let snap = Snap {
            left: self.cur_left(id),
            right: self.cur_right(id),
            parent: self.cur_parent(id),
            color: self.color_at(id, u64::MAX),
        };
        let copy = self.arena.node(id).copy_of(snap);
        let copy = self.arena.alloc(copy);
        trace!(old = ?id, new = ?copy, ver, "copy out");

        let (ret_left, ret_right, ret_parent) = {
            let node = self.arena.node(id);
            (node.ret_left, node.ret_right, node.ret_parent)
        };

        if let Some(child) = ret_left {
            self.set_link(child, Field::Parent, Some(copy))?;
        }
        if let Some(child) = ret_right {
            self.set_link(child, Field::Parent, Some(copy))?;
        }
        match ret_parent {
            Some(parent) => {
                let side = if self.cur_left(parent) == Some(id) {
                    Field::Left
                } else if self.cur_right(parent) == Some(id) {
                    Field::Right
                } else {
                    return err_at!(Fatal, msg: "{:?} not under {:?} while copying", id, parent);
                };
                self.set_link(parent, side, Some(copy))?;
            }
            None => self.versions.set_root(Some(copy), ver),
        }

        self.arena.node_mut(id).fwd = Some(copy);

        Ok(())
    }
}

// read operations.
impl Index {
    /// Search `key` in the tree as of `ver`. The returned handle can be
    /// fed to [Index::left_of], [Index::right_of], [Index::key_of] and
    /// friends with the same version.
    pub fn search(&self, key: i32, ver: u64) -> Option<NodeId> {
        let mut cur = self.versions.root_at(ver);
        while let Some(id) = cur {
            let id = self.read_head(id, ver);
            let node_key = self.arena.node(id).key;
            if node_key == key {
                return Some(id);
            }
            cur = if key < node_key {
                self.link_at(id, Field::Left, ver)
            } else {
                self.link_at(id, Field::Right, ver)
            };
        }
        None
    }

    /// In-order successor of `key` as of `ver`, with the semantics of
    /// the system this crate models: `i32::MAX` when `key` is absent,
    /// the minimum of the right subtree when there is one, and **the
    /// key itself** when the node has no right child. See
    /// [Index::in_order_successor] for the conventional behavior.
    pub fn successor(&self, key: i32, ver: u64) -> i32 {
        match self.search(key, ver) {
            None => i32::MAX,
            Some(id) => match self.link_at(id, Field::Right, ver) {
                Some(right) => {
                    let min = self.minimum_at(right, ver);
                    self.arena.node(min).key
                }
                None => self.arena.node(id).key,
            },
        }
    }

    /// Conventional in-order successor of `key` as of `ver`: walks up
    /// the versioned parent chain when the node has no right child.
    /// `None` when `key` is absent or is the maximum.
    pub fn in_order_successor(&self, key: i32, ver: u64) -> Option<i32> {
        let node = self.search(key, ver)?;
        if let Some(right) = self.link_at(node, Field::Right, ver) {
            let min = self.minimum_at(right, ver);
            return Some(self.arena.node(min).key);
        }
        let mut child = node;
        let mut parent = self.link_at(child, Field::Parent, ver);
        while let Some(p) = parent {
            let p = self.read_head(p, ver);
            let from_left = match self.link_at(p, Field::Left, ver) {
                Some(l) => self.read_head(l, ver) == child,
                None => false,
            };
            if from_left {
                return Some(self.arena.node(p).key);
            }
            child = p;
            parent = self.link_at(p, Field::Parent, ver);
        }
        None
    }

    fn minimum_at(&self, id: NodeId, ver: u64) -> NodeId {
        let mut cur = self.read_head(id, ver);
        while let Some(left) = self.link_at(cur, Field::Left, ver) {
            cur = self.read_head(left, ver);
        }
        cur
    }

    fn minimum_cur(&self, id: NodeId) -> NodeId {
        self.resolve(self.minimum_at(id, u64::MAX))
    }

    /// Iterate keys and colors in sort order, as of `ver`.
    pub fn iter(&self, ver: u64) -> Iter {
        let mut paths = Vec::default();
        build_iter(self, self.versions.root_at(ver), ver, &mut paths);
        Iter { index: self, ver, paths }
    }

    /// Serialize the tree as of `ver` into a single text line of
    /// in-order `key,depth,color` triples, `N` for black and `R` for
    /// red, depth ZERO at the root. An empty tree is a bare newline.
    pub fn dump<W>(&self, ver: u64, w: &mut W) -> Result<()>
    where
        W: io::Write,
    {
        let mut first = true;
        if let Some(root) = self.versions.root_at(ver) {
            self.dump_tree(root, ver, 0, &mut first, w)?;
        }
        err_at!(IOError, writeln!(w))
    }

    fn dump_tree<W>(
        &self,
        id: NodeId,
        ver: u64,
        depth: usize,
        first: &mut bool,
        w: &mut W,
    ) -> Result<()>
    where
        W: io::Write,
    {
        let id = self.read_head(id, ver);
        if let Some(left) = self.link_at(id, Field::Left, ver) {
            self.dump_tree(left, ver, depth + 1, first, w)?;
        }
        let glyph = match self.color_at(id, ver) {
            Color::Black => 'N',
            Color::Red => 'R',
        };
        let sep = if *first { "" } else { " " };
        *first = false;
        err_at!(IOError, write!(w, "{}{},{},{}", sep, self.arena.node(id).key, depth, glyph))?;
        if let Some(right) = self.link_at(id, Field::Right, ver) {
            self.dump_tree(right, ver, depth + 1, first, w)?;
        }
        Ok(())
    }
}

// tree-shape accessors, mainly for viewers and tests.
impl Index {
    /// Root of the tree as of `ver`, if any.
    pub fn root_at(&self, ver: u64) -> Option<NodeId> {
        self.versions.root_at(ver).map(|id| self.read_head(id, ver))
    }

    pub fn left_of(&self, id: NodeId, ver: u64) -> Option<NodeId> {
        self.link_at(id, Field::Left, ver).map(|l| self.read_head(l, ver))
    }

    pub fn right_of(&self, id: NodeId, ver: u64) -> Option<NodeId> {
        self.link_at(id, Field::Right, ver).map(|r| self.read_head(r, ver))
    }

    pub fn parent_of(&self, id: NodeId, ver: u64) -> Option<NodeId> {
        self.link_at(id, Field::Parent, ver).map(|p| self.read_head(p, ver))
    }

    pub fn key_of(&self, id: NodeId) -> i32 {
        self.arena.node(id).key
    }

    pub fn color_of(&self, id: NodeId, ver: u64) -> Color {
        self.color_at(id, ver)
    }
}

// validation.
impl Index {
    /// Validate the whole history of the tree, walking every version
    /// from ZERO to the newest and checking:
    ///
    /// * Root node is always black.
    /// * Sort order between keys, no duplicates.
    /// * No consecutive reds on any path.
    /// * Number of blacks is the same on every path.
    /// * No transient nil marker left reachable.
    /// * Maximum depth within MAX_TREE_DEPTH.
    /// * Modification logs within bounds and in version order.
    /// * Neighbour links of the newest version in sync both ways.
    ///
    /// Return full statistics, including black-height and the depth
    /// histogram of the newest version.
    pub fn validate(&self) -> Result<Stats> {
        let mut blacks = None;
        for ver in 0..=self.versions.current() {
            let root = self.versions.root_at(ver);
            if self.is_red_at(root, ver) {
                return err_at!(Fatal, msg: "root is red at version {}", ver);
            }
            let (b, count) = self.validate_tree(root, ver, false, None, None, 1)?;
            if ver == self.versions.current() {
                if count != self.n_count {
                    return err_at!(Fatal, msg: "n_count {} != {}", count, self.n_count);
                }
                blacks = Some(b);
            }
        }

        self.validate_logs()?;
        self.validate_neighbours(self.versions.root_at(u64::MAX))?;

        let mut depths = Depth::default();
        self.sample_depths(self.versions.root_at(u64::MAX), 0, &mut depths);

        let mut stats = self.to_stats();
        stats.blacks = blacks;
        stats.depths = Some(depths);
        Ok(stats)
    }

    fn validate_tree(
        &self,
        node: Option<NodeId>,
        ver: u64,
        fromred: bool,
        lo: Option<i32>,
        hi: Option<i32>,
        depth: usize,
    ) -> Result<(usize, usize)> {
        let id = match node {
            Some(id) => self.read_head(id, ver),
            None => return Ok((1, 0)),
        };

        if self.arena.node(id).is_nil() {
            return err_at!(Fatal, msg: "nil marker reachable at version {}", ver);
        }
        let red = self.color_at(id, ver) == Color::Red;
        if fromred && red {
            return err_at!(Fatal, msg: "consecutive reds at version {}", ver);
        }
        if depth > MAX_TREE_DEPTH {
            return err_at!(Fatal, msg: "tree exceeds max depth {}", depth);
        }

        let key = self.arena.node(id).key;
        if let Some(lo) = lo {
            if key <= lo {
                return err_at!(Fatal, msg: "sort order {} <= {} at version {}", key, lo, ver);
            }
        }
        if let Some(hi) = hi {
            if key >= hi {
                return err_at!(Fatal, msg: "sort order {} >= {} at version {}", key, hi, ver);
            }
        }

        let left = self.link_at(id, Field::Left, ver);
        let right = self.link_at(id, Field::Right, ver);
        let (lb, lc) = self.validate_tree(left, ver, red, lo, Some(key), depth + 1)?;
        let (rb, rc) = self.validate_tree(right, ver, red, Some(key), hi, depth + 1)?;
        if lb != rb {
            return err_at!(Fatal, msg: "unbalanced blacks l:{} r:{} at version {}", lb, rb, ver);
        }

        let blacks = lb + if red { 0 } else { 1 };
        Ok((blacks, lc + rc + 1))
    }

    fn validate_logs(&self) -> Result<()> {
        let newest = self.versions.current();
        for id in self.arena.ids() {
            let node = self.arena.node(id);
            let mut prev = 0;
            for m in node.log() {
                if m.ver < prev {
                    return err_at!(Fatal, msg: "log out of order on {:?}", id);
                }
                if m.ver > newest {
                    return err_at!(Fatal, msg: "log from the future on {:?}", id);
                }
                prev = m.ver;
            }
            if node.fwd.is_some() && !node.is_full() {
                return err_at!(Fatal, msg: "replaced node {:?} with spare log", id);
            }
        }
        Ok(())
    }

    // neighbour links describe the newest version, both ways.
    fn validate_neighbours(&self, node: Option<NodeId>) -> Result<()> {
        let id = match node {
            Some(id) => self.resolve(id),
            None => return Ok(()),
        };
        let left = self.cur_left(id);
        let right = self.cur_right(id);

        let n = self.arena.node(id);
        if n.ret_left.map(|x| self.resolve(x)) != left {
            return err_at!(Fatal, msg: "left neighbour out of sync on {:?}", id);
        }
        if n.ret_right.map(|x| self.resolve(x)) != right {
            return err_at!(Fatal, msg: "right neighbour out of sync on {:?}", id);
        }
        if n.ret_parent.map(|x| self.resolve(x)) != self.cur_parent(id) {
            return err_at!(Fatal, msg: "parent neighbour out of sync on {:?}", id);
        }

        if let Some(left) = left {
            if self.cur_parent(left) != Some(id) {
                return err_at!(Fatal, msg: "{:?} lost its parent {:?}", left, id);
            }
            self.validate_neighbours(Some(left))?;
        }
        if let Some(right) = right {
            if self.cur_parent(right) != Some(id) {
                return err_at!(Fatal, msg: "{:?} lost its parent {:?}", right, id);
            }
            self.validate_neighbours(Some(right))?;
        }
        Ok(())
    }

    fn sample_depths(&self, node: Option<NodeId>, depth: usize, depths: &mut Depth) {
        let id = match node {
            Some(id) => self.resolve(id),
            None => return,
        };
        let (left, right) = (self.cur_left(id), self.cur_right(id));
        if left.is_none() && right.is_none() {
            depths.sample(depth);
        }
        self.sample_depths(left, depth + 1, depths);
        self.sample_depths(right, depth + 1, depths);
    }
}

/// Iterator over `(key, color)` pairs in sort order, as of a fixed
/// version. Walks the tree with an explicit path stack, the way the
/// tree would be read by a concurrent snapshot reader.
pub struct Iter<'a> {
    index: &'a Index,
    ver: u64,
    paths: Vec<Fragment>,
}

struct Fragment {
    flag: IFlag,
    node: NodeId,
}

#[derive(Copy, Clone)]
enum IFlag {
    Left,   // left arm is done.
    Center, // this node is done.
    Right,  // right arm is being walked.
}

impl<'a> Iterator for Iter<'a> {
    type Item = (i32, Color);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let path = self.paths.last_mut()?;
            match path.flag {
                IFlag::Left => {
                    path.flag = IFlag::Center;
                    let node = path.node;
                    break Some((
                        self.index.key_of(node),
                        self.index.color_at(node, self.ver),
                    ));
                }
                IFlag::Center => {
                    path.flag = IFlag::Right;
                    let node = path.node;
                    let right = self.index.link_at(node, Field::Right, self.ver);
                    build_iter(self.index, right, self.ver, &mut self.paths);
                }
                IFlag::Right => {
                    self.paths.pop();
                }
            }
        }
    }
}

// push the left spine of `node` onto the path stack.
fn build_iter(index: &Index, node: Option<NodeId>, ver: u64, paths: &mut Vec<Fragment>) {
    if let Some(id) = node {
        let id = index.read_head(id, ver);
        paths.push(Fragment { flag: IFlag::Left, node: id });
        let left = index.link_at(id, Field::Left, ver);
        build_iter(index, left, ver, paths);
    }
}

#[cfg(test)]
#[path = "index_test.rs"]
mod index_test;
