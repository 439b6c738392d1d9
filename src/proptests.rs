use super::*;

use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
enum Op {
    Insert(u8, u8),
    Remove(u8, u8),
    RemoveKey(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    // Small domains so keys and values collide often
    prop_oneof![
        4 => (0u8..48, 0u8..4).prop_map(|(k, v)| Op::Insert(k, v)),
        3 => (0u8..48, 0u8..4).prop_map(|(k, v)| Op::Remove(k, v)),
        1 => (0u8..48).prop_map(Op::RemoveKey),
    ]
}

/// Reference model: each key maps to its values in insertion order.
fn apply_model(model: &mut BTreeMap<u8, Vec<u8>>, op: &Op) {
    match *op {
        Op::Insert(k, v) => {
            let values = model.entry(k).or_default();
            if !values.contains(&v) {
                values.push(v);
            }
        }
        Op::Remove(k, v) => {
            if let Some(values) = model.get_mut(&k) {
                values.retain(|&x| x != v);
                if values.is_empty() {
                    model.remove(&k);
                }
            }
        }
        Op::RemoveKey(k) => {
            model.remove(&k);
        }
    }
}

fn apply_tree(tree: &mut RbTree<u8, u8>, op: &Op) {
    match *op {
        Op::Insert(k, v) => {
            tree.insert(k, v);
        }
        Op::Remove(k, v) => {
            tree.remove(&k, &v);
        }
        Op::RemoveKey(k) => {
            tree.remove_key(&k);
        }
    }
}

fn snapshot(tree: &RbTree<u8, u8>) -> Vec<(u8, Vec<u8>)> {
    tree.iter()
        .map(|node| (*node.key(), node.values().as_slice().to_vec()))
        .collect()
}

fn height_bound(len: usize) -> usize {
    // 2 * log2(len + 1), rounded up
    let bits = usize::BITS - len.leading_zeros();
    2 * bits as usize
}

proptest! {
    #[test]
    fn prop_matches_model(ops in prop::collection::vec(op_strategy(), 1..400)) {
        let mut tree = RbTree::new();
        let mut model: BTreeMap<u8, Vec<u8>> = BTreeMap::new();

        for op in &ops {
            apply_tree(&mut tree, op);
            apply_model(&mut model, op);

            prop_assert_eq!(tree.validate(), Ok(()));
            prop_assert_eq!(tree.len(), model.len());
            prop_assert!(tree.height() <= height_bound(tree.len()));
        }

        let expected: Vec<(u8, Vec<u8>)> = model.into_iter().collect();
        prop_assert_eq!(snapshot(&tree), expected);
    }

    #[test]
    fn prop_insert_then_contains(pairs in prop::collection::vec((any::<u16>(), any::<u8>()), 1..200)) {
        let mut tree = RbTree::new();
        for &(k, v) in &pairs {
            tree.insert(k, v);
            prop_assert!(tree.contains(&k, &v));

            let before = tree.get_values(&k).len();
            prop_assert!(!tree.insert(k, v));
            prop_assert_eq!(tree.get_values(&k).len(), before);
        }

        let keys: Vec<u16> = tree.iter().map(|n| *n.key()).collect();
        prop_assert!(keys.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(tree.first().map(|n| *n.key()), keys.first().copied());
        prop_assert_eq!(tree.last().map(|n| *n.key()), keys.last().copied());
    }

    #[test]
    fn prop_emptying_a_key_removes_it(values in prop::collection::vec(any::<u8>(), 1..16)) {
        let mut tree = RbTree::new();
        for k in 0..32u8 {
            tree.insert(k, 0u8);
        }
        for &v in &values {
            tree.insert(100u8, v);
        }

        let stored: Vec<u8> = tree.get_values(&100).to_vec();
        for v in &stored {
            prop_assert!(tree.contains_key(&100));
            prop_assert!(tree.remove(&100, v));
        }
        prop_assert!(!tree.contains_key(&100));
        prop_assert_eq!(tree.len(), 32);
        prop_assert_eq!(tree.validate(), Ok(()));
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys = [5, 3, 8, 1, 4, 7, 9];

    let mut base: RbTree<i32, i32> = RbTree::new();
    for k in keys {
        base.insert(k, k * 10);
    }

    for_each_permutation(&keys, |perm| {
        let mut tree = base.clone();
        for (removed, k) in perm.iter().enumerate() {
            assert!(tree.remove(k, &(k * 10)));
            assert_eq!(tree.validate(), Ok(()));
            assert_eq!(tree.len(), keys.len() - removed - 1);
        }
        assert!(tree.is_empty());
        assert!(tree.first().is_none());
        assert!(tree.last().is_none());
    });
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys = [5, 3, 8, 1, 4, 7];

    for_each_permutation(&keys, |perm| {
        let mut tree = RbTree::new();
        for k in perm {
            tree.insert(k, ());
            assert_eq!(tree.validate(), Ok(()));
        }
        let got: Vec<i32> = tree.iter().map(|n| *n.key()).collect();
        assert_eq!(got, vec![1, 3, 4, 5, 7, 8]);
    });
}

#[test]
fn directory_stays_consistent_with_its_trees() {
    let mut dir = Directory::new();
    let brands = ["Audi", "BMW", "Lada", "Toyota", "Volvo"];
    let models = ["A", "B", "C"];

    for (i, brand) in brands.iter().enumerate() {
        for (j, model) in models.iter().enumerate() {
            let start = 1970 + (i * 3 + j) as u16;
            assert!(dir.insert(Car::new(*brand, *model, start, None)).is_ok());
        }
    }
    assert_eq!(dir.len(), 15);

    assert_eq!(dir.remove_brand("Lada"), 3);
    assert!(dir.remove(&Car::new("BMW", "B", 1974, None)));

    assert_eq!(dir.len(), 11);
    assert!(!dir.contains_model("Lada", "A"));
    assert!(!dir.contains_model("BMW", "B"));
    assert!(dir.contains_model("BMW", "C"));
    assert!(dir.cars_started_in(1974).is_empty());
    assert_eq!(dir.cars_started_in(1975).len(), 1);
}
