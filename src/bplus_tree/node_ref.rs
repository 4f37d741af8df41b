use core::fmt;

use crate::raw::{Handle, Node, RawBPlusTree};

/// A stable identifier for a node, valid until that node is merged away or the tree is cleared.
///
/// Renderers can key their own per-node state on it. Identifiers of freed nodes are reused by
/// later splits.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) const fn from_handle(handle: Handle) -> Self {
        Self(handle.to_index())
    }

    pub(crate) fn to_handle(self) -> Option<Handle> {
        (self.0 <= Handle::MAX).then(|| Handle::from_index(self.0))
    }

    /// The raw slot index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A read-only view of one node of a [`BPlusTree`](crate::BPlusTree).
///
/// Exposes the node's shape (keys, children, values, next-leaf link) so visualizers and
/// external checkers can mirror the tree without reimplementing it. The borrow on the tree
/// guarantees the view never outlives a structural change.
///
/// # Examples
///
/// ```
/// use bplus_index::BPlusTree;
///
/// let mut tree = BPlusTree::new(3);
/// for key in [5, 10, 15] {
///     tree.insert(key, ());
/// }
///
/// let root = tree.root();
/// assert!(!root.is_leaf());
/// assert_eq!(root.keys(), &[10, 15]);
///
/// let leaves: Vec<_> = root.children().map(|leaf| leaf.keys().to_vec()).collect();
/// assert_eq!(leaves, [vec![5], vec![10], vec![15]]);
/// ```
pub struct NodeRef<'a, K, V> {
    tree: &'a RawBPlusTree<K, V>,
    handle: Handle,
}

impl<'a, K, V> NodeRef<'a, K, V> {
    pub(crate) const fn new(tree: &'a RawBPlusTree<K, V>, handle: Handle) -> Self {
        Self { tree, handle }
    }

    fn node(&self) -> &'a Node<K, V> {
        self.tree.node(self.handle)
    }

    /// This node's identifier.
    #[must_use]
    pub const fn id(&self) -> NodeId {
        NodeId::from_handle(self.handle)
    }

    /// Returns true for leaves, which hold entries; false for internal nodes, which route.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.node().is_leaf()
    }

    /// The node's keys in increasing order. For internal nodes these are separators.
    #[must_use]
    pub fn keys(&self) -> &'a [K] {
        self.node().keys()
    }

    /// The values paired with [`keys`](Self::keys), or `None` for an internal node.
    #[must_use]
    pub fn values(&self) -> Option<&'a [V]> {
        match self.node() {
            Node::Leaf(leaf) => Some(leaf.values()),
            Node::Internal(_) => None,
        }
    }

    /// Number of children; always `keys().len() + 1` for internal nodes and 0 for leaves.
    #[must_use]
    pub fn child_count(&self) -> usize {
        match self.node() {
            Node::Internal(internal) => internal.child_count(),
            Node::Leaf(_) => 0,
        }
    }

    /// The child at `index`, if any.
    #[must_use]
    pub fn child(&self, index: usize) -> Option<NodeRef<'a, K, V>> {
        match self.node() {
            Node::Internal(internal) => internal.children().get(index).map(|&h| NodeRef::new(self.tree, h)),
            Node::Leaf(_) => None,
        }
    }

    /// The children from left to right. Empty for leaves.
    pub fn children(&self) -> impl ExactSizeIterator<Item = NodeRef<'a, K, V>> + use<'a, K, V> {
        let tree = self.tree;
        let children: &'a [Handle] = match self.node() {
            Node::Internal(internal) => internal.children(),
            Node::Leaf(_) => &[],
        };
        children.iter().map(move |&h| NodeRef::new(tree, h))
    }

    /// The next leaf in key order. `None` for internal nodes and for the last leaf.
    #[must_use]
    pub fn next(&self) -> Option<NodeRef<'a, K, V>> {
        match self.node() {
            Node::Leaf(leaf) => leaf.next().map(|h| NodeRef::new(self.tree, h)),
            Node::Internal(_) => None,
        }
    }

    /// The internal node that owns this one. `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<NodeRef<'a, K, V>> {
        self.node().parent().map(|h| NodeRef::new(self.tree, h))
    }
}

impl<K, V> Clone for NodeRef<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for NodeRef<'_, K, V> {}

impl<K, V> PartialEq for NodeRef<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.tree, other.tree) && self.handle == other.handle
    }
}

impl<K, V> Eq for NodeRef<'_, K, V> {}

impl<K: fmt::Debug, V> fmt::Debug for NodeRef<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id())
            .field("is_leaf", &self.is_leaf())
            .field("keys", &self.keys())
            .finish()
    }
}
