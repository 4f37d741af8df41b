/// The branching factor of a [`BPlusTree`](crate::BPlusTree).
///
/// An order of `m` allows each internal node up to `m` children and every node up to `m - 1` keys.
/// Every node except the root keeps at least `ceil(m / 2) - 1` keys. Orders below [`Order::MIN`]
/// cannot be balanced and are clamped up to it.
///
/// # Examples
///
/// ```
/// use bplus_index::Order;
///
/// let order = Order::new(5);
/// assert_eq!(order.max_keys(), 4);
/// assert_eq!(order.min_keys(), 2);
///
/// // Too small to balance, so it is clamped.
/// assert_eq!(Order::new(1), Order::MIN);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Order(usize);

impl Order {
    /// The smallest order a tree can balance with.
    pub const MIN: Self = Self(3);

    /// The order used by [`BPlusTree::default`](crate::BPlusTree::default).
    pub const DEFAULT: Self = Self(4);

    /// Creates an order of `children`, clamped to at least [`Order::MIN`].
    #[must_use]
    pub const fn new(children: usize) -> Self {
        if children < Self::MIN.0 { Self::MIN } else { Self(children) }
    }

    /// Maximum children per internal node.
    #[must_use]
    pub const fn children(self) -> usize {
        self.0
    }

    /// Maximum keys per node.
    #[must_use]
    pub const fn max_keys(self) -> usize {
        self.0 - 1
    }

    /// Minimum keys per non-root node.
    #[must_use]
    pub const fn min_keys(self) -> usize {
        self.0.div_ceil(2) - 1
    }

    /// Index at which an overfull node is split.
    #[must_use]
    pub const fn midpoint(self) -> usize {
        self.0 / 2
    }
}

impl Default for Order {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<usize> for Order {
    fn from(children: usize) -> Self {
        Self::new(children)
    }
}
