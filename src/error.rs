use snafu::Snafu;

use crate::NodeId;

/// A structural invariant violation reported by [`BPlusTree::validate`](crate::BPlusTree::validate).
///
/// Validation only reports; it never repairs. Any of these after a sequence of public calls is a
/// defect in the tree itself.
#[derive(Clone, Debug, Eq, PartialEq, Snafu)]
pub enum ValidationError {
    /// Keys within a node are not strictly increasing.
    #[snafu(display("keys of node {node} are not strictly increasing at index {index}"))]
    UnsortedKeys {
        /// The offending node.
        node: NodeId,
        /// Index of the first key that is not greater than its predecessor.
        index: usize,
    },

    /// A node holds more than `order - 1` keys.
    #[snafu(display("node {node} holds {keys} keys, more than the maximum of {max}"))]
    TooManyKeys {
        /// The offending node.
        node: NodeId,
        /// Keys held.
        keys: usize,
        /// Maximum allowed by the order.
        max: usize,
    },

    /// A non-root node (or an internal root) holds fewer keys than allowed.
    #[snafu(display("node {node} holds {keys} keys, fewer than the minimum of {min}"))]
    TooFewKeys {
        /// The offending node.
        node: NodeId,
        /// Keys held.
        keys: usize,
        /// Minimum required.
        min: usize,
    },

    /// Leaves sit at different depths.
    #[snafu(display("leaf {node} is at depth {depth}, expected {expected}"))]
    UnevenLeafDepth {
        /// The offending leaf.
        node: NodeId,
        /// Its depth from the root.
        depth: usize,
        /// Depth of the first leaf visited.
        expected: usize,
    },

    /// An internal node does not have exactly one more child than keys.
    #[snafu(display("internal node {node} has {keys} keys but {children} children"))]
    ChildCountMismatch {
        /// The offending node.
        node: NodeId,
        /// Keys held.
        keys: usize,
        /// Children held.
        children: usize,
    },

    /// A separator key differs from the minimum key of the subtree to its right.
    #[snafu(display("separator {index} of node {node} is not the minimum key of child {}", index + 1))]
    SeparatorMismatch {
        /// The internal node holding the separator.
        node: NodeId,
        /// Index of the separator.
        index: usize,
    },

    /// A child's parent link does not point at the node that owns it.
    #[snafu(display("node {node} links to parent {found:?}, but is owned by {expected:?}"))]
    ParentMismatch {
        /// The offending child.
        node: NodeId,
        /// The actual owner, `None` for the root.
        expected: Option<NodeId>,
        /// The recorded parent link.
        found: Option<NodeId>,
    },

    /// The tree's first-leaf link does not name the leftmost leaf.
    #[snafu(display("first leaf is recorded as {found}, but the leftmost leaf is {expected}"))]
    FirstLeafMismatch {
        /// The leftmost leaf reached by descent.
        expected: NodeId,
        /// The recorded first leaf.
        found: NodeId,
    },

    /// A leaf's next link skips, repeats or reorders leaves.
    #[snafu(display("leaf {node} links to {found:?}, but the next leaf in order is {expected:?}"))]
    BrokenLeafChain {
        /// The offending leaf.
        node: NodeId,
        /// The next leaf in left-to-right order.
        expected: Option<NodeId>,
        /// The recorded next link.
        found: Option<NodeId>,
    },

    /// Keys read along the leaf chain are not strictly increasing.
    #[snafu(display("leaf chain is out of order entering leaf {node}"))]
    UnorderedLeafChain {
        /// The leaf whose first key does not exceed the previous leaf's last key.
        node: NodeId,
    },

    /// The recorded entry count differs from the keys actually stored in leaves.
    #[snafu(display("tree records {recorded} entries but its leaves hold {actual}"))]
    CountMismatch {
        /// The running count.
        recorded: usize,
        /// Keys found across all leaves.
        actual: usize,
    },

    /// Nodes are allocated that cannot be reached from the root.
    #[snafu(display("{live} nodes are allocated but only {reachable} are reachable from the root"))]
    OrphanedNodes {
        /// Live nodes in the arena.
        live: usize,
        /// Nodes reached by descent.
        reachable: usize,
    },
}
