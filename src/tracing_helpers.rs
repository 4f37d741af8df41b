//! Zero-cost logging for structural events.
//!
//! With the `tracing` feature these macros forward to the `tracing` crate; without it they expand
//! to nothing, so the split and rebalance paths carry no logging cost in default builds.
//!
//! The integration tests install a subscriber through `tests/common/mod.rs`:
//!
//! ```bash
//! # Log every split, borrow and merge while running the tests
//! RUST_LOG=bplus_index=trace cargo test --features tracing -- --nocapture
//! ```
//!
//! Levels used by the tree:
//! - `trace`: per-node splits, borrows and merges
//! - `debug`: height changes (root growth and collapse) and resets to the empty state

#![allow(unused_macros, unused_imports)]

/// Trace-level logging. Compiles to no-op without `tracing` feature.
#[cfg(feature = "tracing")]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

/// Debug-level logging. Compiles to no-op without `tracing` feature.
#[cfg(feature = "tracing")]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

pub(crate) use debug_log;
pub(crate) use trace_log;
