use crate::rbt::arena::NodeId;

// Number of modifications a node can absorb before a copy is made.
// Four field kinds plus headroom, so that a short run of rebalancing
// can land on a node without copying it mid-operation.
pub(crate) const MOD_LIMIT: usize = 6;

/// Color of a node. New nodes start off [Color::Red] and are repainted
/// by the insert/remove fixups.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Color {
    Red,
    Black,
}

// Field selector for versioned reads and writes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Field {
    Left,
    Right,
    Parent,
    Color,
}

// Value recorded against a field in the modification log.
#[derive(Clone, Copy)]
pub(crate) enum Value {
    Link(Option<NodeId>),
    Color(Color),
}

// Single entry in a node's modification log.
#[derive(Clone, Copy)]
pub(crate) struct Mod {
    pub(crate) ver: u64,
    pub(crate) field: Field,
    pub(crate) value: Value,
}

// Pointer/color fields of a node, frozen at construction time.
#[derive(Clone, Copy)]
pub(crate) struct Snap {
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) color: Color,
}

// Node in the version-tagged tree. `original` and `key` never change;
// all later state lives in `mods`. Once the log is full the node is
// copied out and `fwd` names the replacement, after which reads for
// new-enough versions and all writes are routed to the replacement.
//
// `ret_left`, `ret_right` and `ret_parent` track the node's neighbours
// in the newest version of the tree, that is, the nodes whose fields
// reference this node and must be re-pointed when it is copied out.
pub(crate) struct Node {
    pub(crate) key: i32,
    pub(crate) nil: bool,
    pub(crate) original: Snap,
    mods: [Option<Mod>; MOD_LIMIT],
    n_mods: usize,
    pub(crate) fwd: Option<NodeId>,
    pub(crate) ret_left: Option<NodeId>,
    pub(crate) ret_right: Option<NodeId>,
    pub(crate) ret_parent: Option<NodeId>,
}

// construct node values.
impl Node {
    pub(crate) fn new(key: i32) -> Node {
        let original = Snap {
            left: None,
            right: None,
            parent: None,
            color: Color::Red,
        };
        Node {
            key,
            nil: false,
            original,
            mods: [None; MOD_LIMIT],
            n_mods: 0,
            fwd: None,
            ret_left: None,
            ret_right: None,
            ret_parent: None,
        }
    }

    // black placeholder spawned during remove to carry the double-black
    // weight, unlinked again before the same version completes. The key
    // is a placeholder, nil markers are matched by kind, never by key.
    pub(crate) fn new_nil() -> Node {
        let original = Snap {
            left: None,
            right: None,
            parent: None,
            color: Color::Black,
        };
        Node {
            key: 0,
            nil: true,
            original,
            mods: [None; MOD_LIMIT],
            n_mods: 0,
            fwd: None,
            ret_left: None,
            ret_right: None,
            ret_parent: None,
        }
    }

    // replacement node made when the log saturates, carrying the node's
    // identity and its newest field values as the fresh baseline.
    pub(crate) fn copy_of(&self, snap: Snap) -> Node {
        Node {
            key: self.key,
            nil: self.nil,
            original: snap,
            mods: [None; MOD_LIMIT],
            n_mods: 0,
            fwd: None,
            ret_left: self.ret_left,
            ret_right: self.ret_right,
            ret_parent: self.ret_parent,
        }
    }
}

// read methods.
impl Node {
    #[inline]
    pub(crate) fn is_nil(&self) -> bool {
        self.nil
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.n_mods == MOD_LIMIT
    }

    // version of the newest log entry, ZERO when the log is empty.
    pub(crate) fn latest_ver(&self) -> u64 {
        match self.n_mods {
            0 => 0,
            n => self.mods[n - 1].as_ref().map(|m| m.ver).unwrap_or(0),
        }
    }

    // newest entry for `field` whose version is not newer than `ver`,
    // None means the caller falls back to the original snapshot.
    pub(crate) fn lookup(&self, field: Field, ver: u64) -> Option<Value> {
        self.mods[..self.n_mods]
            .iter()
            .rev()
            .filter_map(|m| m.as_ref())
            .find(|m| m.field == field && m.ver <= ver)
            .map(|m| m.value)
    }

    pub(crate) fn push(&mut self, m: Mod) {
        debug_assert!(self.n_mods < MOD_LIMIT);
        self.mods[self.n_mods] = Some(m);
        self.n_mods += 1;
    }

    pub(crate) fn log(&self) -> impl Iterator<Item = &Mod> {
        self.mods[..self.n_mods].iter().filter_map(|m| m.as_ref())
    }
}

#[cfg(test)]
#[path = "node_test.rs"]
mod node_test;
