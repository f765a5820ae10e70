use super::*;
use crate::rbt::{arena::Arena, node::Node};

#[test]
fn test_versions() {
    let mut arena = Arena::new();
    let a = arena.alloc(Node::new(1));
    let b = arena.alloc(Node::new(2));

    let mut versions = Versions::new();
    assert_eq!(versions.current(), 0);
    assert_eq!(versions.root_at(0), None);
    assert_eq!(versions.root_at(99), None);

    assert_eq!(versions.advance(), 1);
    versions.set_root(Some(a), 1);
    assert_eq!(versions.advance(), 2);
    versions.set_root(Some(b), 2);
    // re-rooting within the same version, the newest entry wins.
    versions.set_root(Some(a), 2);

    assert_eq!(versions.current(), 2);
    assert_eq!(versions.root_at(0), None);
    assert_eq!(versions.root_at(1), Some(a));
    assert_eq!(versions.root_at(2), Some(a));
    // versions beyond the counter clamp to the newest root.
    assert_eq!(versions.root_at(99), Some(a));
    assert_eq!(versions.n_roots(), 4);
}

#[test]
fn test_versions_unroot() {
    let mut arena = Arena::new();
    let a = arena.alloc(Node::new(1));

    let mut versions = Versions::new();
    versions.advance();
    versions.set_root(Some(a), 1);
    versions.advance();
    versions.set_root(None, 2);

    assert_eq!(versions.root_at(1), Some(a));
    assert_eq!(versions.root_at(2), None);
    assert_eq!(versions.root_at(3), None);
}
