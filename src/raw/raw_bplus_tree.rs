use alloc::vec::Vec;
use core::borrow::Borrow;

use smallvec::SmallVec;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{INLINE_KEYS, InternalNode, Node, SearchResult};
use crate::Order;
use crate::tracing_helpers::{debug_log, trace_log};

/// The core B+Tree implementation backing `BPlusTree`.
///
/// Every node lives in one arena. Children, parent and next-leaf links are handles into that
/// arena, so the tree owns the whole node graph and the back-links never own anything.
#[derive(Clone)]
pub(crate) struct RawBPlusTree<K, V> {
    /// Arena storing all tree nodes.
    nodes: Arena<Node<K, V>>,
    /// Handle to the root node. An empty tree is a single empty leaf.
    root: Handle,
    /// Handle to the leftmost leaf, the origin of every full scan.
    first_leaf: Handle,
    /// Branching factor.
    order: Order,
    /// Total number of key-value pairs in the tree.
    len: usize,
}

impl<K, V> RawBPlusTree<K, V> {
    /// Creates a tree holding a single empty leaf.
    pub(crate) fn new(order: Order) -> Self {
        let mut nodes = Arena::new();
        let leaf = nodes.alloc(Node::new_leaf());
        Self {
            nodes,
            root: leaf,
            first_leaf: leaf,
            order,
            len: 0,
        }
    }

    /// Drops every node and returns to the freshly constructed state.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        let leaf = self.nodes.alloc(Node::new_leaf());
        self.root = leaf;
        self.first_leaf = leaf;
        self.len = 0;
        debug_log!("tree reset to a single empty leaf");
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn order(&self) -> Order {
        self.order
    }

    pub(crate) const fn root(&self) -> Handle {
        self.root
    }

    pub(crate) const fn first_leaf(&self) -> Handle {
        self.first_leaf
    }

    pub(crate) fn node(&self, handle: Handle) -> &Node<K, V> {
        self.nodes.get(handle)
    }

    /// Returns the node named by `handle`, if it is live.
    pub(crate) fn try_node(&self, handle: Handle) -> Option<&Node<K, V>> {
        self.nodes.contains(handle).then(|| self.nodes.get(handle))
    }

    /// Number of allocated nodes.
    pub(crate) const fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[cfg(test)]
    pub(crate) fn nodes_mut(&mut self) -> &mut Arena<Node<K, V>> {
        &mut self.nodes
    }

    /// Number of levels from the root down to the leaves, counting both.
    pub(crate) fn height(&self) -> usize {
        let mut height = 1;
        let mut current = self.root;
        while let Node::Internal(internal) = self.nodes.get(current) {
            current = internal.child(0);
            height += 1;
        }
        height
    }

    /// Returns the smallest key in the subtree rooted at `handle`.
    ///
    /// `None` only while the leftmost leaf of that subtree is empty, which happens transiently
    /// during underflow repair.
    pub(crate) fn min_key(&self, handle: Handle) -> Option<&K> {
        let mut current = handle;
        loop {
            match self.nodes.get(current) {
                Node::Internal(internal) => current = internal.child(0),
                Node::Leaf(leaf) => return leaf.first_key(),
            }
        }
    }

    pub(crate) fn first_key_value(&self) -> Option<(&K, &V)> {
        let leaf = self.nodes.get(self.first_leaf).as_leaf();
        if leaf.is_empty() {
            return None;
        }
        Some((leaf.key(0), leaf.value(0)))
    }

    pub(crate) fn last_key_value(&self) -> Option<(&K, &V)> {
        let mut current = self.root;
        while let Node::Internal(internal) = self.nodes.get(current) {
            current = internal.child(internal.child_count() - 1);
        }
        let leaf = self.nodes.get(current).as_leaf();
        let last = leaf.key_count().checked_sub(1)?;
        Some((leaf.key(last), leaf.value(last)))
    }

    /// Descends from the root to the leaf whose key range covers `key`.
    pub(crate) fn find_leaf<Q>(&self, key: &Q) -> Handle
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root;
        while let Node::Internal(internal) = self.nodes.get(current) {
            current = internal.child(internal.search_child(key));
        }
        current
    }

    /// Searches for a key and returns the leaf handle and index if found.
    pub(crate) fn search<Q>(&self, key: &Q) -> Option<(Handle, usize)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let leaf_handle = self.find_leaf(key);
        match self.nodes.get(leaf_handle).as_leaf().search(key) {
            SearchResult::Found(idx) => Some((leaf_handle, idx)),
            SearchResult::NotFound(_) => None,
        }
    }

    pub(crate) fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let (leaf_handle, idx) = self.search(key)?;
        Some(self.nodes.get(leaf_handle).as_leaf().value(idx))
    }

    pub(crate) fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let (leaf_handle, idx) = self.search(key)?;
        Some(self.nodes.get_mut(leaf_handle).as_leaf_mut().value_mut(idx))
    }

    pub(crate) fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.search(key).is_some()
    }

    /// Records the child index chosen at each internal level while descending towards `key`.
    ///
    /// The trace is empty for an empty tree and for a tree that is a single leaf.
    pub(crate) fn search_path<Q>(&self, key: &Q) -> Vec<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut path = Vec::new();
        if self.len == 0 {
            return path;
        }

        let mut current = self.root;
        while let Node::Internal(internal) = self.nodes.get(current) {
            let child_idx = internal.search_child(key);
            path.push(child_idx);
            current = internal.child(child_idx);
        }
        path
    }

    /// Returns the first position whose key is not less than `key`, as a leaf and an index that
    /// may equal that leaf's length.
    pub(crate) fn lower_bound<Q>(&self, key: &Q) -> (Handle, usize)
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let leaf_handle = self.find_leaf(key);
        (leaf_handle, self.nodes.get(leaf_handle).as_leaf().lower_bound(key))
    }

    /// Returns the slot `child` occupies in its parent.
    fn child_index(&self, parent: Handle, child: Handle) -> usize {
        self.nodes
            .get(parent)
            .as_internal()
            .position_of(child)
            .expect("`RawBPlusTree::child_index()` - child is not linked from its parent!")
    }

    fn reparent(&mut self, children: &[Handle], parent: Handle) {
        for &child in children {
            self.nodes.get_mut(child).set_parent(Some(parent));
        }
    }
}

impl<K: Clone + Ord, V> RawBPlusTree<K, V> {
    /// Inserts a key-value pair.
    ///
    /// Returns false, leaving the stored value untouched, if the key is already present.
    pub(crate) fn insert(&mut self, key: K, value: V) -> bool {
        let leaf_handle = self.find_leaf(&key);
        let leaf = self.nodes.get_mut(leaf_handle).as_leaf_mut();
        let idx = match leaf.search(&key) {
            SearchResult::Found(_) => return false,
            SearchResult::NotFound(idx) => idx,
        };

        leaf.insert(idx, key, value);
        self.len += 1;

        if leaf.key_count() >= self.order.max_keys() {
            self.split_leaf(leaf_handle);
        }
        true
    }

    /// Splits a full leaf and copies the right half's first key up as the separator.
    fn split_leaf(&mut self, leaf_handle: Handle) {
        let mid = self.order.midpoint();
        let leaf = self.nodes.get_mut(leaf_handle).as_leaf_mut();
        let right = leaf.split(mid);
        let separator = right.key(0).clone();

        let right_handle = self.nodes.alloc(Node::Leaf(right));
        self.nodes.get_mut(leaf_handle).as_leaf_mut().set_next(Some(right_handle));
        trace_log!(left = ?leaf_handle, right = ?right_handle, "leaf split");

        self.insert_into_parent(leaf_handle, separator, right_handle);
    }

    /// Splits an overfull internal node and moves its median key up.
    fn split_internal(&mut self, handle: Handle) {
        let mid = self.order.midpoint();
        let (median, right) = self.nodes.get_mut(handle).as_internal_mut().split(mid);
        let moved: SmallVec<[Handle; INLINE_KEYS + 1]> = SmallVec::from_slice(right.children());

        let right_handle = self.nodes.alloc(Node::Internal(right));
        self.reparent(&moved, right_handle);
        trace_log!(left = ?handle, right = ?right_handle, "internal split");

        self.insert_into_parent(handle, median, right_handle);
    }

    /// Links a freshly split-off `right` sibling next to `left`, growing a new root if `left` was
    /// the root.
    fn insert_into_parent(&mut self, left: Handle, separator: K, right: Handle) {
        let Some(parent) = self.nodes.get(left).parent() else {
            let root = self.nodes.alloc(Node::Internal(InternalNode::with_children(left, separator, right)));
            self.reparent(&[left, right], root);
            self.root = root;
            debug_log!(height = self.height(), "root split");
            return;
        };

        let idx = self.child_index(parent, left);
        self.nodes.get_mut(right).set_parent(Some(parent));
        let node = self.nodes.get_mut(parent).as_internal_mut();
        node.insert_child(idx, separator, right);

        if node.key_count() > self.order.max_keys() {
            self.split_internal(parent);
        }
    }

    /// Removes a key from the tree and returns the key-value pair.
    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let leaf_handle = self.find_leaf(key);
        let leaf = self.nodes.get_mut(leaf_handle).as_leaf_mut();
        let SearchResult::Found(idx) = leaf.search(key) else {
            return None;
        };

        let entry = leaf.remove(idx);
        let remaining = leaf.key_count();
        self.len -= 1;

        if leaf_handle == self.root {
            if self.len == 0 {
                self.clear();
            }
            return Some(entry);
        }

        // The removed key may have been the separator above this leaf.
        if idx == 0 && remaining > 0 {
            self.refresh_separator(leaf_handle);
        }
        if remaining < self.order.min_keys() {
            self.handle_underflow(leaf_handle);
        }

        Some(entry)
    }

    /// Rewrites the separator that routes to `handle` after its subtree's minimum changed.
    ///
    /// That separator sits in the lowest ancestor where the path does not take the leftmost child.
    /// If the path is leftmost all the way up, the subtree holds the tree's minimum and no
    /// separator names it.
    fn refresh_separator(&mut self, handle: Handle) {
        let Some(min) = self.min_key(handle).cloned() else {
            return;
        };

        let mut child = handle;
        while let Some(parent) = self.nodes.get(child).parent() {
            let idx = self.child_index(parent, child);
            if idx > 0 {
                self.nodes.get_mut(parent).as_internal_mut().set_key(idx - 1, min);
                return;
            }
            child = parent;
        }
    }

    /// Restores minimum occupancy of a non-root node.
    ///
    /// Prefers the right sibling both for borrowing and for merging.
    fn handle_underflow(&mut self, handle: Handle) {
        let Some(parent) = self.nodes.get(handle).parent() else {
            return;
        };

        let min_keys = self.order.min_keys();
        let idx = self.child_index(parent, handle);
        let parent_node = self.nodes.get(parent).as_internal();
        let left = (idx > 0).then(|| parent_node.child(idx - 1));
        let right = (idx + 1 < parent_node.child_count()).then(|| parent_node.child(idx + 1));

        if let Some(right) = right
            && self.nodes.get(right).key_count() > min_keys
        {
            self.borrow_from_right(handle, right, parent, idx);
        } else if let Some(left) = left
            && self.nodes.get(left).key_count() > min_keys
        {
            self.borrow_from_left(handle, left, parent, idx);
        } else if let Some(right) = right {
            self.merge(handle, right, parent, idx);
        } else if let Some(left) = left {
            self.merge(left, handle, parent, idx - 1);
        }
    }

    /// Moves the right sibling's first entry (or first child) to the end of `handle`.
    fn borrow_from_right(&mut self, handle: Handle, right: Handle, parent: Handle, idx: usize) {
        trace_log!(node = ?handle, sibling = ?right, "borrow from right");

        if self.nodes.get(handle).is_leaf() {
            let right_leaf = self.nodes.get_mut(right).as_leaf_mut();
            let (key, value) = right_leaf.pop_front().expect("`RawBPlusTree::borrow_from_right()` - empty sibling!");
            let separator = right_leaf.key(0).clone();

            let leaf = self.nodes.get_mut(handle).as_leaf_mut();
            let was_empty = leaf.is_empty();
            leaf.push(key, value);
            self.nodes.get_mut(parent).as_internal_mut().set_key(idx, separator);

            if was_empty {
                self.refresh_separator(handle);
            }
        } else {
            let down = self.nodes.get(parent).as_internal().key(idx).clone();
            let (child, up) = self
                .nodes
                .get_mut(right)
                .as_internal_mut()
                .pop_child_front()
                .expect("`RawBPlusTree::borrow_from_right()` - empty sibling!");

            self.nodes.get_mut(handle).as_internal_mut().push_child(down, child);
            self.nodes.get_mut(child).set_parent(Some(handle));
            self.nodes.get_mut(parent).as_internal_mut().set_key(idx, up);
        }
    }

    /// Moves the left sibling's last entry (or last child) to the front of `handle`.
    fn borrow_from_left(&mut self, handle: Handle, left: Handle, parent: Handle, idx: usize) {
        trace_log!(node = ?handle, sibling = ?left, "borrow from left");

        if self.nodes.get(handle).is_leaf() {
            let (key, value) = self
                .nodes
                .get_mut(left)
                .as_leaf_mut()
                .pop()
                .expect("`RawBPlusTree::borrow_from_left()` - empty sibling!");

            self.nodes.get_mut(parent).as_internal_mut().set_key(idx - 1, key.clone());
            self.nodes.get_mut(handle).as_leaf_mut().push_front(key, value);
        } else {
            let down = self.nodes.get(parent).as_internal().key(idx - 1).clone();
            let (up, child) = self
                .nodes
                .get_mut(left)
                .as_internal_mut()
                .pop_child()
                .expect("`RawBPlusTree::borrow_from_left()` - empty sibling!");

            self.nodes.get_mut(handle).as_internal_mut().push_child_front(child, down);
            self.nodes.get_mut(child).set_parent(Some(handle));
            self.nodes.get_mut(parent).as_internal_mut().set_key(idx - 1, up);
        }
    }

    /// Merges `right` into `left`, removing separator `sep_idx` and `right` from their parent.
    fn merge(&mut self, left: Handle, right: Handle, parent: Handle, sep_idx: usize) {
        trace_log!(left = ?left, right = ?right, "merge");

        let (separator, removed) = self.nodes.get_mut(parent).as_internal_mut().remove_child(sep_idx);
        debug_assert_eq!(removed, right, "merge removed the wrong child");

        match self.nodes.take(right) {
            Node::Leaf(right_leaf) => {
                let leaf = self.nodes.get_mut(left).as_leaf_mut();
                let was_empty = leaf.is_empty();
                leaf.merge_with_right(right_leaf);

                if was_empty {
                    self.refresh_separator(left);
                }
            }
            Node::Internal(right_node) => {
                let moved = self.nodes.get_mut(left).as_internal_mut().merge_with_right(separator, right_node);
                self.reparent(&moved, left);
            }
        }

        let parent_keys = self.nodes.get(parent).key_count();
        if parent == self.root {
            if parent_keys == 0 {
                self.collapse_root(left);
            }
        } else if parent_keys < self.order.min_keys() {
            self.handle_underflow(parent);
        }
    }

    /// Replaces an emptied root with its only child.
    fn collapse_root(&mut self, child: Handle) {
        let old_root = self.root;
        drop(self.nodes.take(old_root));

        self.nodes.get_mut(child).set_parent(None);
        self.root = child;
        if self.nodes.get(child).is_leaf() {
            self.first_leaf = child;
        }
        debug_log!(height = self.height(), "root collapsed");
    }
}
