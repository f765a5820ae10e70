use super::*;
use crate::rbt::arena::Arena;

#[test]
fn test_node_log() {
    let mut arena = Arena::new();
    let a = arena.alloc(Node::new(10));
    let b = arena.alloc(Node::new(20));

    let mut node = Node::new(5);
    assert_eq!(node.key, 5);
    assert!(!node.is_nil());
    assert_eq!(node.latest_ver(), 0);
    assert!(node.lookup(Field::Left, u64::MAX).is_none());

    node.push(Mod { ver: 1, field: Field::Left, value: Value::Link(Some(a)) });
    node.push(Mod { ver: 3, field: Field::Left, value: Value::Link(Some(b)) });
    node.push(Mod { ver: 3, field: Field::Color, value: Value::Color(Color::Black) });

    assert_eq!(node.latest_ver(), 3);
    assert_eq!(node.log().count(), 3);

    // newest matching entry wins, older versions see older entries.
    match node.lookup(Field::Left, 1) {
        Some(Value::Link(Some(id))) => assert_eq!(id, a),
        _ => panic!("expected link to a"),
    }
    match node.lookup(Field::Left, 2) {
        Some(Value::Link(Some(id))) => assert_eq!(id, a),
        _ => panic!("expected link to a"),
    }
    match node.lookup(Field::Left, u64::MAX) {
        Some(Value::Link(Some(id))) => assert_eq!(id, b),
        _ => panic!("expected link to b"),
    }
    // nothing recorded for that field/version, fall back to original.
    assert!(node.lookup(Field::Left, 0).is_none());
    assert!(node.lookup(Field::Right, u64::MAX).is_none());
    assert!(node.lookup(Field::Color, 2).is_none());
    match node.lookup(Field::Color, 3) {
        Some(Value::Color(color)) => assert_eq!(color, Color::Black),
        _ => panic!("expected a color"),
    }

    assert!(!node.is_full());
    node.push(Mod { ver: 4, field: Field::Right, value: Value::Link(Some(a)) });
    node.push(Mod { ver: 4, field: Field::Parent, value: Value::Link(None) });
    node.push(Mod { ver: 5, field: Field::Color, value: Value::Color(Color::Red) });
    assert!(node.is_full());
}

#[test]
fn test_node_copy() {
    let mut arena = Arena::new();
    let a = arena.alloc(Node::new(10));
    let b = arena.alloc(Node::new(20));

    let mut node = Node::new(5);
    node.push(Mod { ver: 2, field: Field::Left, value: Value::Link(Some(a)) });
    node.ret_left = Some(a);
    node.ret_parent = Some(b);

    let snap = Snap {
        left: Some(a),
        right: None,
        parent: Some(b),
        color: Color::Black,
    };
    let copy = node.copy_of(snap);

    assert_eq!(copy.key, 5);
    assert!(!copy.is_nil());
    assert_eq!(copy.log().count(), 0);
    assert_eq!(copy.latest_ver(), 0);
    assert_eq!(copy.ret_left, Some(a));
    assert_eq!(copy.ret_right, None);
    assert_eq!(copy.ret_parent, Some(b));
    assert_eq!(copy.original.left, Some(a));
    assert_eq!(copy.original.color, Color::Black);
    assert!(copy.fwd.is_none());
}

#[test]
fn test_nil_marker() {
    let node = Node::new_nil();
    assert!(node.is_nil());
    assert_eq!(node.original.color, Color::Black);
    assert!(node.original.left.is_none());
    assert!(node.original.right.is_none());
}
