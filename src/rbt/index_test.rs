use arbitrary::{Arbitrary, Unstructured};
use rand::{prelude::random, rngs::SmallRng, seq::SliceRandom, Rng, SeedableRng};

use std::collections::BTreeSet;

use super::*;
use crate::Error;

fn dump_string(index: &Index, ver: u64) -> String {
    let mut buf: Vec<u8> = vec![];
    index.dump(ver, &mut buf).unwrap();
    String::from_utf8(buf).unwrap()
}

fn keys_at(index: &Index, ver: u64) -> Vec<i32> {
    index.iter(ver).map(|(key, _)| key).collect()
}

#[test]
fn test_empty_index() {
    let index = Index::new("test-empty");
    assert_eq!(index.to_name(), "test-empty".to_string());
    assert_eq!(index.current_version(), 0);
    assert_eq!(index.len(), 0);
    assert!(index.is_empty());
    assert!(index.search(10, 0).is_none());
    assert!(index.search(10, u64::MAX).is_none());
    assert_eq!(index.successor(10, 0), i32::MAX);
    assert_eq!(index.in_order_successor(10, 0), None);
    assert_eq!(dump_string(&index, 0), "\n");
    assert!(index.root_at(0).is_none());
    index.validate().unwrap();
}

#[test]
fn test_insert_and_history() {
    let mut index = Index::new("test-insert");
    assert_eq!(index.insert(10).unwrap(), 1);
    assert_eq!(index.insert(20).unwrap(), 2);
    assert_eq!(index.insert(5).unwrap(), 3);
    assert_eq!(index.len(), 3);

    assert_eq!(dump_string(&index, 0), "\n");
    assert_eq!(dump_string(&index, 1), "10,0,N\n");
    assert_eq!(dump_string(&index, 2), "10,0,N 20,1,R\n");
    assert_eq!(dump_string(&index, 3), "5,1,R 10,0,N 20,1,R\n");
    // versions beyond the newest mutation clamp to the newest state.
    assert_eq!(dump_string(&index, 99), "5,1,R 10,0,N 20,1,R\n");

    assert!(index.search(5, 1).is_none());
    assert!(index.search(5, 2).is_none());
    assert!(index.search(5, 3).is_some());
    assert!(index.search(20, 1).is_none());
    assert!(index.search(20, 2).is_some());

    index.validate().unwrap();
}

#[test]
fn test_sorted_inserts() {
    let mut index = Index::new("test-sorted");
    for key in 1..=7 {
        index.insert(key).unwrap();
    }
    assert_eq!(index.current_version(), 7);
    assert_eq!(keys_at(&index, 7), vec![1, 2, 3, 4, 5, 6, 7]);

    let root = index.root_at(7).unwrap();
    assert!([2, 4].contains(&index.key_of(root)));
    assert_eq!(index.color_of(root, 7), Color::Black);

    // every intermediate version holds its prefix, in order.
    for ver in 0..=7u64 {
        let want: Vec<i32> = (1..=ver as i32).collect();
        assert_eq!(keys_at(&index, ver), want);
    }

    index.validate().unwrap();
}

#[test]
fn test_successor_history() {
    let mut index = Index::new("test-successor");
    for key in [10, 20, 30, 40, 50].iter() {
        index.insert(*key).unwrap();
    }
    assert_eq!(index.successor(20, 5), 30);

    assert_eq!(index.remove(30).unwrap(), Some(6));
    // the removal is invisible to version 5 and visible to version 6.
    assert_eq!(index.successor(20, 5), 30);
    assert_eq!(index.successor(20, 6), 40);
    assert!(index.search(30, 5).is_some());
    assert!(index.search(30, 6).is_none());

    index.validate().unwrap();
}

#[test]
fn test_successor_self_return() {
    let mut index = Index::new("test-self-return");
    for key in [1, 2, 3].iter() {
        index.insert(*key).unwrap();
    }
    // a node with no right arm answers with the queried key itself,
    // even though 2 comes next in sort order.
    assert_eq!(index.successor(1, 3), 1);
    assert_eq!(index.successor(3, 3), 3);
    assert_eq!(index.successor(2, 3), 3);
    // the conventional variant climbs the parent chain instead.
    assert_eq!(index.in_order_successor(1, 3), Some(2));
    assert_eq!(index.in_order_successor(2, 3), Some(3));
    assert_eq!(index.in_order_successor(3, 3), None);

    assert_eq!(index.successor(99, 3), i32::MAX);
    assert_eq!(index.in_order_successor(99, 3), None);
}

#[test]
fn test_remove_absent_is_noop() {
    let mut index = Index::new("test-noop");
    index.insert(10).unwrap();
    index.insert(20).unwrap();

    let root = index.root_at(u64::MAX);
    assert_eq!(index.remove(99).unwrap(), None);
    assert_eq!(index.current_version(), 2);
    assert_eq!(index.root_at(u64::MAX), root);
    assert_eq!(index.len(), 2);

    index.validate().unwrap();
}

#[test]
fn test_duplicate_insert() {
    let mut index = Index::new("test-dup");
    index.insert(5).unwrap();
    match index.insert(5) {
        Err(Error::InvalidInput(_, _)) => (),
        res => panic!("expected precondition failure, got {:?}", res),
    }
    // the failed insert left no trace.
    assert_eq!(index.current_version(), 1);
    assert_eq!(index.len(), 1);
    index.validate().unwrap();
}

#[test]
fn test_remove_to_empty() {
    let mut index = Index::new("test-drain");
    index.insert(1).unwrap();
    index.insert(2).unwrap();
    index.remove(1).unwrap();
    index.remove(2).unwrap();

    assert_eq!(index.current_version(), 4);
    assert_eq!(index.len(), 0);
    assert_eq!(dump_string(&index, 2), "1,0,N 2,1,R\n");
    assert_eq!(dump_string(&index, 3), "2,0,N\n");
    assert_eq!(dump_string(&index, 4), "\n");
    assert!(index.root_at(4).is_none());
    assert!(index.root_at(2).is_some());

    index.validate().unwrap();
}

#[test]
fn test_random_churn() {
    let seed: u64 = random();
    println!("test_random_churn seed:{}", seed);
    let mut rng = SmallRng::seed_from_u64(seed);

    let mut index = Index::new("test-churn");
    let mut model: BTreeSet<i32> = BTreeSet::new();
    let mut history = vec![model.clone()];

    let mut keys: Vec<i32> = (1..=100).collect();
    keys.shuffle(&mut rng);
    for key in keys.iter() {
        index.insert(*key).unwrap();
        model.insert(*key);
        history.push(model.clone());
    }
    keys.shuffle(&mut rng);
    for key in keys.iter() {
        assert!(index.remove(*key).unwrap().is_some());
        model.remove(key);
        history.push(model.clone());
    }

    assert_eq!(index.current_version(), 200);
    assert_eq!(index.len(), 0);
    assert_eq!(dump_string(&index, 200), "\n");

    // every version matches the model snapshot taken at that version.
    for (ver, model) in history.iter().enumerate() {
        let want: Vec<i32> = model.iter().cloned().collect();
        assert_eq!(keys_at(&index, ver as u64), want, "version {}", ver);
    }

    // successor probes against the model.
    for _i in 0..1000 {
        let key = rng.gen_range(1..=100);
        let ver = rng.gen_range(0..=200u64);
        let node = match index.search(key, ver) {
            Some(node) => node,
            None => {
                assert_eq!(index.successor(key, ver), i32::MAX);
                continue;
            }
        };
        let next = history[ver as usize].range((key + 1)..).next().cloned();
        match index.right_of(node, ver) {
            Some(_) => {
                // with a right arm the answer is the next key in order.
                assert_eq!(index.successor(key, ver), next.unwrap(), "key {} ver {}", key, ver);
                assert_eq!(index.in_order_successor(key, ver), next);
            }
            None => {
                assert_eq!(index.successor(key, ver), key, "key {} ver {}", key, ver);
                assert_eq!(index.in_order_successor(key, ver), next);
            }
        }
    }

    index.validate().unwrap();
}

// a narrow key space keeps hammering the same nodes, pushing their
// modification logs over the limit again and again, so historical
// reads have to chase node copies.
#[derive(Clone, Copy, Debug, Arbitrary)]
enum Churn {
    Insert(u8),
    Remove(u8),
}

#[test]
fn test_copy_out_churn() {
    let seed: u64 = random();
    println!("test_copy_out_churn seed:{}", seed);
    let mut rng = SmallRng::seed_from_u64(seed);

    let mut raw = vec![0_u8; 16384];
    rng.fill(&mut raw[..]);
    let mut uns = Unstructured::new(&raw);

    let mut index = Index::new("test-copy-out");
    let mut model: BTreeSet<i32> = BTreeSet::new();
    let mut history = vec![model.clone()];

    for _i in 0..2000 {
        let op = match uns.arbitrary::<Churn>() {
            Ok(op) => op,
            Err(_) => break,
        };
        match op {
            Churn::Insert(key) => {
                let key = (key % 16) as i32;
                if model.insert(key) {
                    index.insert(key).unwrap();
                    history.push(model.clone());
                } else {
                    assert!(index.insert(key).is_err());
                }
            }
            Churn::Remove(key) => {
                let key = (key % 16) as i32;
                if model.remove(&key) {
                    assert!(index.remove(key).unwrap().is_some());
                    history.push(model.clone());
                } else {
                    assert_eq!(index.remove(key).unwrap(), None);
                }
            }
        }
    }

    assert_eq!(index.current_version() as usize, history.len() - 1);
    for (ver, model) in history.iter().enumerate() {
        let want: Vec<i32> = model.iter().cloned().collect();
        assert_eq!(keys_at(&index, ver as u64), want, "version {}", ver);
    }

    index.validate().unwrap();
}

#[test]
fn test_shape_accessors() {
    let mut index = Index::new("test-shape");
    for key in [10, 20, 30].iter() {
        index.insert(*key).unwrap();
    }
    // version 3 settled as 20(10, 30) after one rotation.
    let root = index.root_at(3).unwrap();
    assert_eq!(index.key_of(root), 20);
    assert_eq!(index.color_of(root, 3), Color::Black);

    let left = index.left_of(root, 3).unwrap();
    let right = index.right_of(root, 3).unwrap();
    assert_eq!(index.key_of(left), 10);
    assert_eq!(index.key_of(right), 30);
    assert_eq!(index.color_of(left, 3), Color::Red);
    assert_eq!(index.color_of(right, 3), Color::Red);
    assert_eq!(index.parent_of(left, 3), Some(root));
    assert_eq!(index.parent_of(right, 3), Some(root));
    assert_eq!(index.parent_of(root, 3), None);

    // at version 1 the tree was a lone root.
    let root1 = index.root_at(1).unwrap();
    assert_eq!(index.key_of(root1), 10);
    assert!(index.left_of(root1, 1).is_none());
    assert!(index.right_of(root1, 1).is_none());

    let stats = index.to_stats();
    assert_eq!(stats.n_count, 3);
    assert_eq!(stats.n_versions, 3);
    assert!(stats.n_nodes >= 3);
}
