use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;

use crate::raw::{Handle, RawBPlusTree};

/// An iterator over the entries of a `BPlusTree`, in key order.
///
/// This `struct` is created by the [`iter`] method on [`BPlusTree`]. It walks the leaf chain
/// from the first leaf and never revisits internal nodes.
///
/// # Examples
///
/// ```
/// use bplus_index::BPlusTree;
///
/// let mut tree = BPlusTree::new(3);
/// tree.insert(2, "b");
/// tree.insert(1, "a");
///
/// let mut iter = tree.iter();
/// assert_eq!(iter.next(), Some((&1, &"a")));
/// assert_eq!(iter.next(), Some((&2, &"b")));
/// assert_eq!(iter.next(), None);
/// ```
///
/// [`iter`]: crate::BPlusTree::iter
/// [`BPlusTree`]: crate::BPlusTree
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, K, V> {
    tree: &'a RawBPlusTree<K, V>,
    leaf: Option<Handle>,
    index: usize,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(tree: &'a RawBPlusTree<K, V>) -> Self {
        Self {
            tree,
            leaf: Some(tree.first_leaf()),
            index: 0,
            remaining: tree.len(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        loop {
            let leaf = self.tree.node(self.leaf?).as_leaf();
            if self.index < leaf.key_count() {
                let item = (leaf.key(self.index), leaf.value(self.index));
                self.index += 1;
                self.remaining -= 1;
                return Some(item);
            }
            self.leaf = leaf.next();
            self.index = 0;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            leaf: self.leaf,
            index: self.index,
            remaining: self.remaining,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// An iterator over the entries of a `BPlusTree` whose keys fall in a closed range.
///
/// This `struct` is created by the [`range`] method on [`BPlusTree`]. It starts at the leaf
/// holding the lower bound, follows the leaf chain and stops at the first key past `max`.
///
/// [`range`]: crate::BPlusTree::range
/// [`BPlusTree`]: crate::BPlusTree
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Range<'a, 'q, K, V, Q: ?Sized = K> {
    tree: &'a RawBPlusTree<K, V>,
    leaf: Option<Handle>,
    index: usize,
    max: &'q Q,
}

impl<'a, 'q, K, V, Q: ?Sized> Range<'a, 'q, K, V, Q> {
    /// A range starting at position `start` and running up to and including `max`.
    pub(crate) fn new(tree: &'a RawBPlusTree<K, V>, start: (Handle, usize), max: &'q Q) -> Self {
        Self {
            tree,
            leaf: Some(start.0),
            index: start.1,
            max,
        }
    }

    pub(crate) fn empty(tree: &'a RawBPlusTree<K, V>, max: &'q Q) -> Self {
        Self {
            tree,
            leaf: None,
            index: 0,
            max,
        }
    }
}

impl<'a, K, V, Q> Iterator for Range<'a, '_, K, V, Q>
where
    K: Borrow<Q>,
    Q: ?Sized + Ord,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let leaf = self.tree.node(self.leaf?).as_leaf();
            if self.index < leaf.key_count() {
                let key = leaf.key(self.index);
                if key.borrow() > self.max {
                    self.leaf = None;
                    return None;
                }
                let item = (key, leaf.value(self.index));
                self.index += 1;
                return Some(item);
            }
            self.leaf = leaf.next();
            self.index = 0;
        }
    }
}

impl<K, V, Q> FusedIterator for Range<'_, '_, K, V, Q>
where
    K: Borrow<Q>,
    Q: ?Sized + Ord,
{
}

impl<K, V, Q: ?Sized> Clone for Range<'_, '_, K, V, Q> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            leaf: self.leaf,
            index: self.index,
            max: self.max,
        }
    }
}

impl<K, V, Q> fmt::Debug for Range<'_, '_, K, V, Q>
where
    K: fmt::Debug + Borrow<Q>,
    V: fmt::Debug,
    Q: ?Sized + Ord,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// An iterator over the keys of a `BPlusTree`, in order.
///
/// This `struct` is created by the [`keys`](crate::BPlusTree::keys) method.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Keys<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K: fmt::Debug, V> fmt::Debug for Keys<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// An iterator over the values of a `BPlusTree`, in key order.
///
/// This `struct` is created by the [`values`](crate::BPlusTree::values) method.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Values<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> FusedIterator for Values<'_, K, V> {}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V: fmt::Debug> fmt::Debug for Values<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}
