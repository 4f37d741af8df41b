//! Shared test setup: a `tracing` subscriber for the tree's structural events.
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//!
//! #[test]
//! fn my_test() {
//!     common::init_tracing();
//!     // ... splits, borrows and merges are now logged
//! }
//! ```
//!
//! # Configuration
//!
//! Only active with the `tracing` feature. `RUST_LOG` holds the filter directives and defaults
//! to `warn`, which the tree never emits:
//!
//! ```bash
//! RUST_LOG=bplus_index=trace cargo test --features tracing -- --nocapture
//! ```

#![allow(dead_code)]

#[cfg(feature = "tracing")]
mod enabled {
    use std::io;
    use std::sync::{Arc, Mutex, Once, PoisonError};

    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt::MakeWriter;

    /// Ensures the global subscriber is only installed once across all tests.
    static INIT: Once = Once::new();

    /// Installs a console subscriber filtered by `RUST_LOG`.
    ///
    /// Safe to call from every test; only the first call takes effect. Output goes through the
    /// test writer, so it is captured unless the test runs with `--nocapture`.
    pub fn init_tracing() {
        INIT.call_once(|| {
            let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
            // try_init: another harness may already have installed one
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_test_writer()
                .compact()
                .try_init();
        });
    }

    /// An in-memory log sink for asserting on emitted events.
    #[derive(Clone, Default)]
    pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        /// Runs `f` with a thread-local subscriber that records every event at `trace` and up.
        pub fn record<R>(&self, f: impl FnOnce() -> R) -> R {
            let subscriber = tracing_subscriber::fmt()
                .with_max_level(tracing::Level::TRACE)
                .with_ansi(false)
                .with_writer(self.clone())
                .finish();
            tracing::subscriber::with_default(subscriber, f)
        }

        /// Everything recorded so far.
        pub fn contents(&self) -> String {
            let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
            String::from_utf8_lossy(&bytes).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap_or_else(PoisonError::into_inner).extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }
}

#[cfg(feature = "tracing")]
pub use enabled::{CapturedLogs, init_tracing};

/// Without the `tracing` feature the tree emits nothing, so there is nothing to install.
#[cfg(not(feature = "tracing"))]
pub fn init_tracing() {}
