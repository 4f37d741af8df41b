use core::borrow::Borrow;

use smallvec::SmallVec;

use super::handle::Handle;

/// Keys kept inline before a node spills to the heap. Small orders never spill.
pub(crate) const INLINE_KEYS: usize = 8;

type KeyVec<K> = SmallVec<[K; INLINE_KEYS]>;
type ChildVec = SmallVec<[Handle; INLINE_KEYS + 1]>;

#[allow(clippy::large_enum_variant)]
#[derive(Clone, Debug)]
pub(crate) enum Node<K, V> {
    Internal(InternalNode<K>),
    Leaf(LeafNode<K, V>),
}

// B+Tree: internal nodes route searches. keys[i] is the minimum key of the subtree at children[i + 1].
#[derive(Clone, Debug)]
pub(crate) struct InternalNode<K> {
    parent: Option<Handle>,
    keys: KeyVec<K>,
    children: ChildVec,
}

// B+Tree: leaf nodes own the entries and link forward to the next leaf.
#[derive(Clone, Debug)]
pub(crate) struct LeafNode<K, V> {
    parent: Option<Handle>,
    next: Option<Handle>,
    keys: KeyVec<K>,
    values: SmallVec<[V; INLINE_KEYS]>,
}

/// Result of searching for a key in a leaf.
pub(crate) enum SearchResult {
    /// Key was found at the given index.
    Found(usize),
    /// Key was not found; index is where it would be inserted.
    NotFound(usize),
}

impl<K, V> Node<K, V> {
    pub(crate) fn new_leaf() -> Self {
        Node::Leaf(LeafNode::new())
    }

    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    /// Returns the leaf node, panicking if this is not a leaf.
    pub(crate) fn as_leaf(&self) -> &LeafNode<K, V> {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => panic!("expected leaf node"),
        }
    }

    /// Returns the leaf node mutably, panicking if this is not a leaf.
    pub(crate) fn as_leaf_mut(&mut self) -> &mut LeafNode<K, V> {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => panic!("expected leaf node"),
        }
    }

    /// Returns the internal node, panicking if this is not internal.
    pub(crate) fn as_internal(&self) -> &InternalNode<K> {
        match self {
            Node::Internal(internal) => internal,
            Node::Leaf(_) => panic!("expected internal node"),
        }
    }

    /// Returns the internal node mutably, panicking if this is not internal.
    pub(crate) fn as_internal_mut(&mut self) -> &mut InternalNode<K> {
        match self {
            Node::Internal(internal) => internal,
            Node::Leaf(_) => panic!("expected internal node"),
        }
    }

    pub(crate) fn keys(&self) -> &[K] {
        match self {
            Node::Internal(internal) => internal.keys(),
            Node::Leaf(leaf) => leaf.keys(),
        }
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys().len()
    }

    pub(crate) fn parent(&self) -> Option<Handle> {
        match self {
            Node::Internal(internal) => internal.parent,
            Node::Leaf(leaf) => leaf.parent,
        }
    }

    pub(crate) fn set_parent(&mut self, parent: Option<Handle>) {
        match self {
            Node::Internal(internal) => internal.parent = parent,
            Node::Leaf(leaf) => leaf.parent = parent,
        }
    }
}

impl<K> InternalNode<K> {
    /// Creates a root holding a single separator between two children.
    pub(crate) fn with_children(left: Handle, separator: K, right: Handle) -> Self {
        let mut node = Self {
            parent: None,
            keys: SmallVec::new(),
            children: SmallVec::new(),
        };
        node.children.push(left);
        node.push_child(separator, right);
        node
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn child_count(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> &K {
        &self.keys[index]
    }

    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    #[inline]
    pub(crate) fn child(&self, index: usize) -> Handle {
        self.children[index]
    }

    pub(crate) fn children(&self) -> &[Handle] {
        &self.children
    }

    /// Returns the index of the child to descend into for `key`.
    ///
    /// A key equal to a separator routes right, since the separator is the minimum of its right
    /// subtree.
    #[inline]
    pub(crate) fn search_child<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        match self.keys.binary_search_by(|k| k.borrow().cmp(key)) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }

    /// Returns the slot holding `child`.
    pub(crate) fn position_of(&self, child: Handle) -> Option<usize> {
        self.children.iter().position(|&c| c == child)
    }

    /// Inserts `key` at `index` and `child` immediately to its right.
    pub(crate) fn insert_child(&mut self, index: usize, key: K, child: Handle) {
        self.keys.insert(index, key);
        self.children.insert(index + 1, child);
    }

    /// Removes the key at `index` together with the child to its right.
    pub(crate) fn remove_child(&mut self, index: usize) -> (K, Handle) {
        let key = self.keys.remove(index);
        let child = self.children.remove(index + 1);
        (key, child)
    }

    pub(crate) fn set_key(&mut self, index: usize, key: K) {
        self.keys[index] = key;
    }

    /// Appends a separator and the child to its right.
    pub(crate) fn push_child(&mut self, key: K, child: Handle) {
        self.keys.push(key);
        self.children.push(child);
    }

    /// Prepends a child and the separator to its right.
    pub(crate) fn push_child_front(&mut self, child: Handle, key: K) {
        self.children.insert(0, child);
        self.keys.insert(0, key);
    }

    /// Pops the last separator and the child to its right.
    pub(crate) fn pop_child(&mut self) -> Option<(K, Handle)> {
        let key = self.keys.pop()?;
        let child = self.children.pop()?;
        Some((key, child))
    }

    /// Pops the first child and the separator to its right.
    pub(crate) fn pop_child_front(&mut self) -> Option<(Handle, K)> {
        if self.keys.is_empty() {
            return None;
        }
        let child = self.children.remove(0);
        let key = self.keys.remove(0);
        Some((child, key))
    }

    /// Splits at `mid`. Returns the separator moved up and the new right node.
    ///
    /// The left node keeps `keys[..mid]`, the right node takes `keys[mid + 1..]`, and `keys[mid]`
    /// leaves both. The right node's parent link is left unset.
    pub(crate) fn split(&mut self, mid: usize) -> (K, InternalNode<K>) {
        let keys: KeyVec<K> = self.keys.drain(mid + 1..).collect();
        let children: ChildVec = self.children.drain(mid + 1..).collect();
        let median = self.keys.pop().expect("`InternalNode::split()` - `mid` out of range!");

        let right = InternalNode {
            parent: None,
            keys,
            children,
        };
        (median, right)
    }

    /// Absorbs a right sibling, placing the parent's separator between the two key runs.
    ///
    /// Returns the children moved over so the caller can re-parent them.
    pub(crate) fn merge_with_right(&mut self, separator: K, right: InternalNode<K>) -> ChildVec {
        self.keys.push(separator);
        self.keys.extend(right.keys);
        self.children.extend(right.children.iter().copied());
        right.children
    }
}

impl<K, V> LeafNode<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            parent: None,
            next: None,
            keys: SmallVec::new(),
            values: SmallVec::new(),
        }
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub(crate) fn next(&self) -> Option<Handle> {
        self.next
    }

    pub(crate) fn set_next(&mut self, next: Option<Handle>) {
        self.next = next;
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> &K {
        &self.keys[index]
    }

    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    #[inline]
    pub(crate) fn value(&self, index: usize) -> &V {
        &self.values[index]
    }

    #[inline]
    pub(crate) fn value_mut(&mut self, index: usize) -> &mut V {
        &mut self.values[index]
    }

    pub(crate) fn values(&self) -> &[V] {
        &self.values
    }

    pub(crate) fn first_key(&self) -> Option<&K> {
        self.keys.first()
    }

    pub(crate) fn last_key(&self) -> Option<&K> {
        self.keys.last()
    }

    #[inline]
    pub(crate) fn search<Q>(&self, key: &Q) -> SearchResult
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        match self.keys.binary_search_by(|k| k.borrow().cmp(key)) {
            Ok(idx) => SearchResult::Found(idx),
            Err(idx) => SearchResult::NotFound(idx),
        }
    }

    /// Returns the index of the first key not less than `key`.
    pub(crate) fn lower_bound<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        match self.search(key) {
            SearchResult::Found(idx) | SearchResult::NotFound(idx) => idx,
        }
    }

    pub(crate) fn insert(&mut self, index: usize, key: K, value: V) {
        self.keys.insert(index, key);
        self.values.insert(index, value);
    }

    pub(crate) fn remove(&mut self, index: usize) -> (K, V) {
        let key = self.keys.remove(index);
        let value = self.values.remove(index);
        (key, value)
    }

    pub(crate) fn push(&mut self, key: K, value: V) {
        self.keys.push(key);
        self.values.push(value);
    }

    pub(crate) fn push_front(&mut self, key: K, value: V) {
        self.keys.insert(0, key);
        self.values.insert(0, value);
    }

    pub(crate) fn pop(&mut self) -> Option<(K, V)> {
        let key = self.keys.pop()?;
        let value = self.values.pop()?;
        Some((key, value))
    }

    pub(crate) fn pop_front(&mut self) -> Option<(K, V)> {
        if self.keys.is_empty() {
            return None;
        }
        Some(self.remove(0))
    }

    /// Splits at `mid`, moving `keys[mid..]` into a new right leaf.
    ///
    /// The right leaf inherits this leaf's forward link; the caller splices it into the chain once
    /// it has a handle.
    pub(crate) fn split(&mut self, mid: usize) -> LeafNode<K, V> {
        LeafNode {
            parent: None,
            next: self.next,
            keys: self.keys.drain(mid..).collect(),
            values: self.values.drain(mid..).collect(),
        }
    }

    /// Absorbs a right sibling and takes over its forward link.
    pub(crate) fn merge_with_right(&mut self, right: LeafNode<K, V>) {
        self.keys.extend(right.keys);
        self.values.extend(right.values);
        self.next = right.next;
    }
}
