use std::collections::BTreeMap;

use bplus_index::{BPlusTree, NodeRef, Order, ValidationError};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

mod common;

/// The number of operations to perform in each proptest case.
const TEST_SIZE: usize = 2_000;

fn key_strategy() -> impl Strategy<Value = i32> {
    // Narrower than TEST_SIZE so inserts collide and deletes hit
    -500i32..500i32
}

fn order_strategy() -> impl Strategy<Value = usize> {
    3usize..=8
}

// ─── Operations enum for driving randomized tests ────────────────────────────

#[derive(Debug, Clone)]
enum TreeOp {
    Insert(i32, i32),
    Delete(i32),
    Search(i32),
    Range(i32, i32),
    SearchPath(i32),
}

fn tree_op_strategy() -> impl Strategy<Value = TreeOp> {
    prop_oneof![
        5 => (key_strategy(), any::<i32>()).prop_map(|(k, v)| TreeOp::Insert(k, v)),
        4 => key_strategy().prop_map(TreeOp::Delete),
        2 => key_strategy().prop_map(TreeOp::Search),
        1 => (key_strategy(), key_strategy()).prop_map(|(a, b)| TreeOp::Range(a, b)),
        1 => key_strategy().prop_map(TreeOp::SearchPath),
    ]
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn tree_of(order: usize, keys: impl IntoIterator<Item = i32>) -> BPlusTree<i32, i32> {
    common::init_tracing();
    let mut tree = BPlusTree::new(order);
    for key in keys {
        assert!(tree.insert(key, key * 10));
    }
    tree
}

fn keys_of(entries: &[(&i32, &i32)]) -> Vec<i32> {
    entries.iter().map(|(k, _)| **k).collect()
}

/// Collects the keys of every node on one level, left to right.
fn level_keys(tree: &BPlusTree<i32, i32>, depth: usize) -> Vec<Vec<i32>> {
    let mut level = vec![tree.root()];
    for _ in 0..depth {
        level = level.iter().flat_map(|node| node.children()).collect();
    }
    level.iter().map(|node| node.keys().to_vec()).collect()
}

/// Walks the leaf chain through `NodeRef::next`.
fn chained_leaves<'a>(tree: &'a BPlusTree<i32, i32>) -> Vec<NodeRef<'a, i32, i32>> {
    let mut leaves = Vec::new();
    let mut current = Some(tree.first_leaf());
    while let Some(leaf) = current {
        leaves.push(leaf);
        current = leaf.next();
    }
    leaves
}

// ─── Construction and empty tree ─────────────────────────────────────────────

#[test]
fn new_tree_is_a_single_empty_leaf() {
    let tree: BPlusTree<i32, i32> = BPlusTree::new(3);

    assert!(tree.entries().is_empty());
    assert_eq!(tree.len(), 0);
    assert!(tree.is_empty());
    assert_eq!(tree.validate(), Ok(()));
    assert!(tree.root().is_leaf());
    assert_eq!(tree.root(), tree.first_leaf());
    assert_eq!(tree.height(), 1);
    assert_eq!(tree.search(&1), None);
    assert_eq!(tree.search_path(&1), Vec::<usize>::new());
    assert!(tree.range_search(&i32::MIN, &i32::MAX).is_empty());
    assert_eq!(tree.first_key_value(), None);
    assert_eq!(tree.last_key_value(), None);
}

#[test]
fn order_is_clamped_and_defaulted() {
    assert_eq!(BPlusTree::<i32, i32>::new(0).order(), Order::MIN);
    assert_eq!(BPlusTree::<i32, i32>::new(2).order(), Order::MIN);
    assert_eq!(BPlusTree::<i32, i32>::new(64).order().children(), 64);
    assert_eq!(BPlusTree::<i32, i32>::default().order(), Order::DEFAULT);
}

// ─── Insert / search ─────────────────────────────────────────────────────────

#[test]
fn ascending_inserts_at_order_three() {
    let tree = tree_of(3, (1..=7).map(|k| k * 5));

    assert_eq!(tree.len(), 7);
    assert_eq!(tree.height(), 3);
    assert_eq!(tree.search(&20), Some(&200));
    assert_eq!(level_keys(&tree, 0), vec![vec![15, 25]]);
    assert_eq!(
        level_keys(&tree, 2),
        vec![vec![5], vec![10], vec![15], vec![20], vec![25], vec![30], vec![35]]
    );
    assert_eq!(tree.validate(), Ok(()));
}

#[test]
fn duplicate_insert_is_rejected_without_overwriting() {
    let mut tree = tree_of(4, 0..50);

    assert!(!tree.insert(17, -1));
    assert_eq!(tree.len(), 50);
    assert_eq!(tree.search(&17), Some(&170));
    assert_eq!(tree.validate(), Ok(()));
}

#[test]
fn search_mut_updates_in_place() {
    let mut tree = tree_of(5, 0..100);
    *tree.search_mut(&42).unwrap() = 7;

    assert_eq!(tree.search(&42), Some(&7));
    assert_eq!(tree.search_mut(&1000), None);
}

#[test]
fn search_path_matches_the_node_structure() {
    let tree = tree_of(4, 0..200);

    for key in [-5, 0, 57, 133, 199, 500] {
        let path = tree.search_path(&key);
        assert_eq!(path.len(), tree.height() - 1);

        let mut node = tree.root();
        for &index in &path {
            assert!(index < node.child_count());
            node = node.child(index).unwrap();
        }
        assert!(node.is_leaf());
        if (0..200).contains(&key) {
            assert!(node.keys().contains(&key));
        }
    }
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[test]
fn delete_then_range_at_order_three() {
    let mut tree = tree_of(3, (1..=7).map(|k| k * 5));

    assert!(tree.delete(&20));
    assert_eq!(tree.validate(), Ok(()));
    assert_eq!(tree.search(&20), None);
    assert_eq!(keys_of(&tree.range_search(&10, &30)), vec![10, 15, 25, 30]);
}

#[test]
fn deleting_a_missing_key_changes_nothing() {
    let mut tree = tree_of(3, 0..20);
    let before = level_keys(&tree, 1);

    assert!(!tree.delete(&99));
    assert_eq!(tree.len(), 20);
    assert_eq!(level_keys(&tree, 1), before);
}

#[test]
fn remove_entry_hands_back_the_pair() {
    let mut tree = tree_of(3, 0..10);

    assert_eq!(tree.remove_entry(&4), Some((4, 40)));
    assert_eq!(tree.remove_entry(&4), None);
    assert_eq!(tree.len(), 9);
}

#[test]
fn deleting_everything_restores_the_initial_state() {
    for order in 3..=8 {
        let mut tree = tree_of(order, 0..300);
        // A fixed permutation of 0..300
        for key in (0..300).map(|i| (i * 7) % 300) {
            assert!(tree.delete(&key), "order {order} key {key}");
            assert_eq!(tree.validate(), Ok(()), "order {order} key {key}");
        }

        assert!(tree.is_empty());
        assert!(tree.root().is_leaf());
        assert_eq!(tree.root().keys(), &[] as &[i32]);
        assert_eq!(tree.root(), tree.first_leaf());
        assert_eq!(tree.height(), 1);
    }
}

#[test]
fn clear_keeps_the_order() {
    let mut tree = tree_of(6, 0..100);
    tree.clear();

    assert!(tree.is_empty());
    assert_eq!(tree.order().children(), 6);
    assert_eq!(tree.validate(), Ok(()));
    assert!(tree.insert(1, 1));
}

// ─── Range and traversal ─────────────────────────────────────────────────────

#[test]
fn inverted_range_is_empty() {
    let tree = tree_of(3, 0..10);
    assert!(tree.range_search(&7, &2).is_empty());
}

#[test]
fn range_bounds_are_inclusive() {
    let tree = tree_of(4, (0..50).map(|k| k * 2));

    assert_eq!(keys_of(&tree.range_search(&10, &16)), vec![10, 12, 14, 16]);
    assert_eq!(keys_of(&tree.range_search(&9, &17)), vec![10, 12, 14, 16]);
    assert_eq!(keys_of(&tree.range_search(&-10, &0)), vec![0]);
    assert_eq!(keys_of(&tree.range_search(&98, &200)), vec![98]);
    assert!(tree.range_search(&11, &11).is_empty());
}

#[test]
fn range_bounds_may_be_short_lived() {
    fn below(tree: &BPlusTree<i32, i32>, limit: i32) -> Vec<(&i32, &i32)> {
        let max = limit - 1;
        tree.range_search(&i32::MIN, &max)
    }

    let tree = tree_of(3, 0..30);
    assert_eq!(keys_of(&below(&tree, 4)), vec![0, 1, 2, 3]);
}

#[test]
fn range_accepts_borrowed_bounds() {
    let mut tree = BPlusTree::new(3);
    for word in ["apple", "banana", "cherry", "damson", "elder", "fig"] {
        tree.insert(String::from(word), word.len());
    }

    let hits: Vec<&str> = tree.range("b", "dz").map(|(k, _)| k.as_str()).collect();
    assert_eq!(hits, vec!["banana", "cherry", "damson"]);
}

#[test]
fn leaf_chain_visits_every_entry_in_order() {
    let tree = tree_of(5, (0..120).rev());

    let chained: Vec<i32> = chained_leaves(&tree)
        .iter()
        .flat_map(|leaf| leaf.keys().iter().copied())
        .collect();
    assert_eq!(chained, (0..120).collect::<Vec<_>>());
    assert_eq!(keys_of(&tree.entries()), chained);
    assert_eq!(tree.keys().copied().collect::<Vec<_>>(), chained);
    assert_eq!(tree.first_key_value(), Some((&0, &0)));
    assert_eq!(tree.last_key_value(), Some((&119, &1190)));
}

#[test]
fn node_views_expose_leaf_values_only() {
    let tree = tree_of(3, 0..10);
    let root = tree.root();

    assert_eq!(root.values(), None);
    assert_eq!(root.child_count(), root.keys().len() + 1);
    assert_eq!(root.parent(), None);
    assert_eq!(root.next(), None);

    let leaf = tree.first_leaf();
    assert_eq!(leaf.values(), Some(&[0][..]));
    assert_eq!(leaf.child_count(), 0);
    assert_eq!(leaf.child(0), None);
    assert_eq!(tree.node(leaf.id()), Some(leaf));
}

#[test]
fn clone_is_independent() {
    let original = tree_of(4, 0..40);
    let mut copy = original.clone();

    assert!(copy.delete(&10));
    assert!(copy.insert(100, 0));

    assert_eq!(original.len(), 40);
    assert_eq!(original.search(&10), Some(&100));
    assert_eq!(original.search(&100), None);
    assert_eq!(original.validate(), Ok(()));
    assert_eq!(copy.validate(), Ok(()));
}

#[test]
fn validation_errors_render_readably() {
    let error = ValidationError::CountMismatch { recorded: 2, actual: 3 };
    assert_eq!(error.to_string(), "tree records 2 entries but its leaves hold 3");
}

// ─── Logging ─────────────────────────────────────────────────────────────────

#[cfg(feature = "tracing")]
#[test]
fn structural_events_are_logged() {
    let logs = common::CapturedLogs::default();
    logs.record(|| {
        let mut tree = BPlusTree::new(3);
        for key in (1..=7).map(|k| k * 5) {
            tree.insert(key, ());
        }
        assert!(tree.delete(&20));
        tree.clear();
    });

    let output = logs.contents();
    for event in ["leaf split", "internal split", "root split", "merge", "tree reset to a single empty leaf"] {
        assert!(output.contains(event), "missing {event:?} in:\n{output}");
    }
    assert!(output.contains("bplus_index"));
}

// ─── Randomized comparison against BTreeMap ──────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Replays a random sequence of operations on both BPlusTree and BTreeMap and asserts
    /// identical results at every step, with the tree valid after every mutation.
    #[test]
    fn tree_ops_match_btreemap(
        order in order_strategy(),
        ops in proptest::collection::vec(tree_op_strategy(), TEST_SIZE),
    ) {
        common::init_tracing();
        let mut tree: BPlusTree<i32, i32> = BPlusTree::new(order);
        let mut model: BTreeMap<i32, i32> = BTreeMap::new();

        for op in ops {
            match op {
                TreeOp::Insert(k, v) => {
                    let expected = !model.contains_key(&k);
                    if expected {
                        model.insert(k, v);
                    }
                    prop_assert_eq!(tree.insert(k, v), expected);
                    prop_assert_eq!(tree.validate(), Ok(()));
                }
                TreeOp::Delete(k) => {
                    prop_assert_eq!(tree.delete(&k), model.remove(&k).is_some());
                    prop_assert_eq!(tree.validate(), Ok(()));
                }
                TreeOp::Search(k) => {
                    prop_assert_eq!(tree.search(&k), model.get(&k));
                }
                TreeOp::Range(a, b) => {
                    let expected: Vec<_> = if a <= b { model.range(a..=b).collect() } else { Vec::new() };
                    prop_assert_eq!(tree.range_search(&a, &b), expected);
                }
                TreeOp::SearchPath(k) => {
                    let path = tree.search_path(&k);
                    let expected_len = if tree.is_empty() { 0 } else { tree.height() - 1 };
                    prop_assert_eq!(path.len(), expected_len);
                }
            }
            prop_assert_eq!(tree.len(), model.len());
        }

        prop_assert_eq!(tree.entries(), model.iter().collect::<Vec<_>>());
    }

    /// Inserting unique keys and deleting them all in another random order always ends at a
    /// single empty leaf.
    #[test]
    fn insert_then_delete_all(
        order in order_strategy(),
        keys in proptest::collection::hash_set(any::<i32>(), 0..400),
        seed in any::<u64>(),
    ) {
        common::init_tracing();
        let mut tree = BPlusTree::new(order);
        let mut keys: Vec<i32> = keys.into_iter().collect();
        for &key in &keys {
            prop_assert!(tree.insert(key, ()));
        }
        prop_assert_eq!(tree.len(), keys.len());

        // Deterministic shuffle from the seed
        let mut x = seed;
        for i in (1..keys.len()).rev() {
            x = x.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            let j = usize::try_from(x >> 33).unwrap() % (i + 1);
            keys.swap(i, j);
        }

        for key in &keys {
            prop_assert!(tree.delete(key));
        }
        prop_assert!(tree.is_empty());
        prop_assert!(tree.root().is_leaf());
        prop_assert_eq!(tree.root(), tree.first_leaf());
        prop_assert_eq!(tree.validate(), Ok(()));
    }
}
