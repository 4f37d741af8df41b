//! A generic B+ tree index for Rust.
//!
//! This crate provides [`BPlusTree`], an ordered key-value index with a configurable order.
//! All entries live in linked leaves, so besides point lookups it answers closed-range queries
//! and full ordered scans by walking the leaf chain:
//!
//! - [`search`](BPlusTree::search) / [`insert`](BPlusTree::insert) / [`delete`](BPlusTree::delete)
//!   in O(log n)
//! - [`range`](BPlusTree::range) over `min..=max` in O(log n + k)
//! - [`search_path`](BPlusTree::search_path) - the child index taken at every level of a descent
//! - [`validate`](BPlusTree::validate) - a full structural invariant check
//! - [`root`](BPlusTree::root) / [`NodeRef`] - read-only access to the node structure
//!
//! # Example
//!
//! ```
//! use bplus_index::BPlusTree;
//!
//! let mut tree = BPlusTree::new(3);
//! for key in [5, 10, 15, 20, 25, 30, 35] {
//!     tree.insert(key, key.to_string());
//! }
//!
//! assert_eq!(tree.search(&15).map(String::as_str), Some("15"));
//! assert_eq!(tree.height(), 3);
//!
//! tree.delete(&20);
//! let keys: Vec<_> = tree.range(&10, &30).map(|(k, _)| *k).collect();
//! assert_eq!(keys, [10, 15, 25, 30]);
//! assert_eq!(tree.validate(), Ok(()));
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **`tracing`** - Emits `tracing` events for splits, borrows, merges and height changes
//!
//! # Implementation
//!
//! Nodes are stored in a single arena and addressed by compact handles. Parent and next-leaf
//! links are plain handles, which lets deletion repair underflow bottom-up from the affected
//! leaf instead of re-walking the tree.

#![no_std]
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod tracing_helpers;

mod error;
mod order;
mod raw;

pub mod bplus_tree;

pub use bplus_tree::{BPlusTree, NodeId, NodeRef};
pub use error::ValidationError;
pub use order::Order;
