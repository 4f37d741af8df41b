use alloc::vec::Vec;

use super::handle::Handle;
use super::node::Node;
use super::raw_bplus_tree::RawBPlusTree;
use crate::{NodeId, ValidationError};

/// State carried through the depth-first walk.
struct Walk {
    leaf_depth: Option<usize>,
    leaves: Vec<Handle>,
    reachable: usize,
}

impl<K: Ord, V> RawBPlusTree<K, V> {
    /// Checks every structural invariant and reports the first violation found.
    ///
    /// Nodes are visited depth-first, left to right; the leaf chain, first-leaf link, entry count
    /// and arena occupancy are checked after the walk.
    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        let mut walk = Walk {
            leaf_depth: None,
            leaves: Vec::new(),
            reachable: 0,
        };
        self.check_node(self.root(), None, 0, &mut walk)?;
        self.check_leaf_chain(&walk.leaves)?;

        let actual: usize = walk.leaves.iter().map(|&leaf| self.node(leaf).key_count()).sum();
        if actual != self.len() {
            return Err(ValidationError::CountMismatch {
                recorded: self.len(),
                actual,
            });
        }

        if walk.reachable != self.node_count() {
            return Err(ValidationError::OrphanedNodes {
                live: self.node_count(),
                reachable: walk.reachable,
            });
        }
        Ok(())
    }

    fn check_node(
        &self,
        handle: Handle,
        expected_parent: Option<Handle>,
        depth: usize,
        walk: &mut Walk,
    ) -> Result<(), ValidationError> {
        let node = self.node(handle);
        let id = NodeId::from_handle(handle);
        walk.reachable += 1;

        if node.parent() != expected_parent {
            return Err(ValidationError::ParentMismatch {
                node: id,
                expected: expected_parent.map(NodeId::from_handle),
                found: node.parent().map(NodeId::from_handle),
            });
        }

        let keys = node.keys();
        if let Some(index) = (1..keys.len()).find(|&i| keys[i - 1] >= keys[i]) {
            return Err(ValidationError::UnsortedKeys { node: id, index });
        }

        let order = self.order();
        if keys.len() > order.max_keys() {
            return Err(ValidationError::TooManyKeys {
                node: id,
                keys: keys.len(),
                max: order.max_keys(),
            });
        }

        // The root is exempt from the minimum, but an internal root still needs two children.
        let min = match (expected_parent, node) {
            (None, Node::Leaf(_)) => 0,
            (None, Node::Internal(_)) => 1,
            (Some(_), _) => order.min_keys(),
        };
        if keys.len() < min {
            return Err(ValidationError::TooFewKeys {
                node: id,
                keys: keys.len(),
                min,
            });
        }

        match node {
            Node::Leaf(_) => {
                match walk.leaf_depth {
                    None => walk.leaf_depth = Some(depth),
                    Some(expected) if expected != depth => {
                        return Err(ValidationError::UnevenLeafDepth {
                            node: id,
                            depth,
                            expected,
                        });
                    }
                    Some(_) => {}
                }
                walk.leaves.push(handle);
            }
            Node::Internal(internal) => {
                if internal.child_count() != internal.key_count() + 1 {
                    return Err(ValidationError::ChildCountMismatch {
                        node: id,
                        keys: internal.key_count(),
                        children: internal.child_count(),
                    });
                }

                for (index, separator) in internal.keys().iter().enumerate() {
                    if self.min_key(internal.child(index + 1)) != Some(separator) {
                        return Err(ValidationError::SeparatorMismatch { node: id, index });
                    }
                }

                for &child in internal.children() {
                    self.check_node(child, Some(handle), depth + 1, walk)?;
                }
            }
        }
        Ok(())
    }

    /// `leaves` is every leaf in left-to-right order, as found by descent.
    fn check_leaf_chain(&self, leaves: &[Handle]) -> Result<(), ValidationError> {
        if leaves.first() != Some(&self.first_leaf()) {
            return Err(ValidationError::FirstLeafMismatch {
                expected: NodeId::from_handle(leaves[0]),
                found: NodeId::from_handle(self.first_leaf()),
            });
        }

        let mut last_key: Option<&K> = None;
        for (i, &handle) in leaves.iter().enumerate() {
            let leaf = self.node(handle).as_leaf();
            let expected = leaves.get(i + 1).copied();
            if leaf.next() != expected {
                return Err(ValidationError::BrokenLeafChain {
                    node: NodeId::from_handle(handle),
                    expected: expected.map(NodeId::from_handle),
                    found: leaf.next().map(NodeId::from_handle),
                });
            }

            if let (Some(prev), Some(first)) = (last_key, leaf.first_key())
                && prev >= first
            {
                return Err(ValidationError::UnorderedLeafChain {
                    node: NodeId::from_handle(handle),
                });
            }
            if let Some(last) = leaf.last_key() {
                last_key = Some(last);
            }
        }
        Ok(())
    }
}
