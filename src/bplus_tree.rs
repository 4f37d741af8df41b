use alloc::vec::Vec;
use core::borrow::Borrow;
use core::fmt;

use crate::raw::RawBPlusTree;
use crate::{Order, ValidationError};

mod iter;
mod node_ref;

pub use iter::{Iter, Keys, Range, Values};
pub use node_ref::{NodeId, NodeRef};

/// An ordered index based on a [B+ tree] with a configurable order.
///
/// Keys must implement [`Ord`]. Every entry lives in a leaf; internal nodes hold only separator
/// keys used for routing, and the leaves are chained left to right so that ordered scans and
/// range queries never climb back up the tree.
///
/// The order `m` fixes the shape: a node holds at most `m - 1` keys, internal nodes have at most
/// `m` children, and every node except the root keeps at least `⌈m/2⌉ - 1` keys. Inserting
/// splits full nodes and deleting redistributes or merges short ones, so all leaves always sit at
/// the same depth.
///
/// Unlike a map, inserting an existing key is rejected rather than overwriting the stored value.
///
/// Besides the lookup operations, the tree exposes its node structure through [`NodeRef`] and a
/// full invariant check through [`validate`](Self::validate), for visualizers and test oracles.
///
/// # Examples
///
/// ```
/// use bplus_index::BPlusTree;
///
/// let mut index = BPlusTree::new(3);
/// for key in [10, 20, 5, 6, 12, 30, 7, 17] {
///     index.insert(key, key * 100);
/// }
///
/// assert_eq!(index.search(&12), Some(&1200));
/// assert!(!index.insert(12, 0));
///
/// assert!(index.delete(&6));
/// assert!(!index.contains_key(&6));
///
/// let hits: Vec<_> = index.range(&7, &17).map(|(k, _)| *k).collect();
/// assert_eq!(hits, [7, 10, 12, 17]);
/// assert!(index.is_valid());
/// ```
///
/// [B+ tree]: https://en.wikipedia.org/wiki/B%2B_tree
pub struct BPlusTree<K, V> {
    raw: RawBPlusTree<K, V>,
}

impl<K, V> BPlusTree<K, V> {
    /// Makes a new, empty `BPlusTree` of the given order.
    ///
    /// Orders below 3 are raised to 3, the smallest order at which splitting is well defined.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::BPlusTree;
    ///
    /// let tree: BPlusTree<u32, ()> = BPlusTree::new(1);
    /// assert_eq!(tree.order().children(), 3);
    /// assert!(tree.is_empty());
    /// ```
    #[must_use]
    pub fn new(order: usize) -> Self {
        Self::with_order(Order::new(order))
    }

    /// Makes a new, empty `BPlusTree` with an already validated [`Order`].
    #[must_use]
    pub fn with_order(order: Order) -> Self {
        Self {
            raw: RawBPlusTree::new(order),
        }
    }

    /// Returns the order this tree was built with.
    #[must_use]
    pub const fn order(&self) -> Order {
        self.raw.order()
    }

    /// Removes every entry, leaving a single empty leaf. The order is kept.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new(4);
    /// tree.extend((0..100).map(|k| (k, ())));
    /// tree.clear();
    /// assert!(tree.is_empty());
    /// assert_eq!(tree.height(), 1);
    /// ```
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Returns the number of entries in the tree.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the tree holds no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of levels, counting the root and the leaves. An empty tree has height 1.
    #[must_use]
    pub fn height(&self) -> usize {
        self.raw.height()
    }

    /// Returns a reference to the value stored under `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new(3);
    /// tree.insert(String::from("alpha"), 1);
    /// assert_eq!(tree.search("alpha"), Some(&1));
    /// assert_eq!(tree.search("beta"), None);
    /// ```
    pub fn search<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get(key)
    }

    /// Returns a mutable reference to the value stored under `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new(3);
    /// tree.insert(1, "a");
    /// if let Some(value) = tree.search_mut(&1) {
    ///     *value = "b";
    /// }
    /// assert_eq!(tree.search(&1), Some(&"b"));
    /// ```
    pub fn search_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get_mut(key)
    }

    /// Returns `true` if the tree holds an entry for `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.contains_key(key)
    }

    /// Returns the child index taken at each internal level while descending towards `key`.
    ///
    /// The trace has one entry per internal level whether or not `key` is present, and is empty
    /// for an empty tree or a tree that is a single leaf. Keys equal to a separator route right.
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
    /// assert_eq!(tree.search_path(&4), [0]);
    /// assert_eq!(tree.search_path(&10), [1]);
    /// assert_eq!(tree.search_path(&99), [2]);
    /// ```
    pub fn search_path<Q>(&self, key: &Q) -> Vec<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.search_path(key)
    }

    /// Returns an iterator over the entries whose keys fall in `min..=max`, in key order.
    ///
    /// Descends once to the leaf holding `min`, then follows the leaf chain until a key exceeds
    /// `max`. An inverted range (`min > max`) yields nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new(4);
    /// tree.extend((0..20).map(|k| (k * 2, ())));
    ///
    /// let keys: Vec<_> = tree.range(&5, &11).map(|(k, _)| *k).collect();
    /// assert_eq!(keys, [6, 8, 10]);
    /// assert_eq!(tree.range(&11, &5).count(), 0);
    /// ```
    pub fn range<'q, Q>(&self, min: &Q, max: &'q Q) -> Range<'_, 'q, K, V, Q>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        if min > max || self.is_empty() {
            return Range::empty(&self.raw, max);
        }
        Range::new(&self.raw, self.raw.lower_bound(min), max)
    }

    /// Collects the entries whose keys fall in `min..=max`, in key order.
    pub fn range_search<Q>(&self, min: &Q, max: &Q) -> Vec<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.range(min, max).collect()
    }

    /// Gets an iterator over the entries of the tree, sorted by key.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.raw)
    }

    /// Collects every entry in key order by walking the leaf chain.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new(3);
    /// tree.insert(3, 'c');
    /// tree.insert(1, 'a');
    /// tree.insert(2, 'b');
    /// assert_eq!(tree.entries(), [(&1, &'a'), (&2, &'b'), (&3, &'c')]);
    /// ```
    #[must_use]
    pub fn entries(&self) -> Vec<(&K, &V)> {
        self.iter().collect()
    }

    /// Gets an iterator over the keys of the tree, in sorted order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Gets an iterator over the values of the tree, in order by key.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns the entry with the smallest key.
    #[must_use]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.raw.first_key_value()
    }

    /// Returns the entry with the largest key.
    #[must_use]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.raw.last_key_value()
    }

    /// Returns a view of the root node. An empty tree's root is an empty leaf.
    #[must_use]
    pub fn root(&self) -> NodeRef<'_, K, V> {
        NodeRef::new(&self.raw, self.raw.root())
    }

    /// Returns a view of the leftmost leaf, the head of the leaf chain.
    #[must_use]
    pub fn first_leaf(&self) -> NodeRef<'_, K, V> {
        NodeRef::new(&self.raw, self.raw.first_leaf())
    }

    /// Looks a node up by the identifier a previous [`NodeRef::id`] returned.
    ///
    /// Returns `None` if that node has since been freed. Freed identifiers are recycled, so an
    /// old identifier may also name a newer node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_, K, V>> {
        let handle = id.to_handle()?;
        self.raw.try_node(handle)?;
        Some(NodeRef::new(&self.raw, handle))
    }
}

impl<K: Clone + Ord, V> BPlusTree<K, V> {
    /// Inserts a key-value pair.
    ///
    /// Returns `true` if the entry was added. If the key is already present the tree is left
    /// untouched, including the stored value, and `false` is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new(3);
    /// assert!(tree.insert(37, "a"));
    /// assert!(!tree.insert(37, "b"));
    /// assert_eq!(tree.search(&37), Some(&"a"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> bool {
        self.raw.insert(key, value)
    }

    /// Removes the entry for `key`, rebalancing as needed.
    ///
    /// Returns `true` if an entry was removed and `false` if the key was absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new(3);
    /// tree.insert(1, "a");
    /// assert!(tree.delete(&1));
    /// assert!(!tree.delete(&1));
    /// ```
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.remove(key).is_some()
    }

    /// Removes the entry for `key` and returns it.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.remove(key)
    }
}

impl<K: Ord, V> BPlusTree<K, V> {
    /// Checks every structural invariant and reports the first violation found.
    ///
    /// A tree only ever mutated through this API always validates; the check exists for test
    /// oracles and visual debugging.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found in a depth-first, left-to-right walk.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.raw.validate()
    }

    /// Returns `true` if [`validate`](Self::validate) finds no violation.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

impl<K: Clone, V: Clone> Clone for BPlusTree<K, V> {
    fn clone(&self) -> Self {
        Self { raw: self.raw.clone() }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for BPlusTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> Default for BPlusTree<K, V> {
    /// Creates an empty `BPlusTree` of [`Order::DEFAULT`].
    fn default() -> Self {
        Self::with_order(Order::DEFAULT)
    }
}

impl<K: Clone + Ord, V> Extend<(K, V)> for BPlusTree<K, V> {
    /// Inserts each pair in turn. Pairs whose key is already present are dropped.
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K, V> IntoIterator for &'a BPlusTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}
