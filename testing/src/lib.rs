//! # Huddle Testing
//!
//! Testing utilities and mock collaborators for the huddle claim ledger.
//!
//! This crate provides:
//! - `InMemoryClaimStore`: the fast, deterministic reference implementation
//!   of the `ClaimStore` contract
//! - `ConflictInjectingStore`: a decorator that loses conditional writes on
//!   purpose, for exercising the retry budget
//! - `FixedClock` and in-memory profile/group directories
//! - A tracing initializer for integration tests
//!
//! ## Example
//!
//! ```ignore
//! use huddle_testing::mocks::{InMemoryClaimStore, test_clock};
//! use huddle_engine::ClaimEngine;
//! use std::sync::Arc;
//!
//! #[tokio::test]
//! async fn claims_one_slot() {
//!     let engine: ClaimEngine<MyKind> = ClaimEngine::new(
//!         Arc::new(InMemoryClaimStore::new()),
//!         Arc::new(test_clock()),
//!     );
//!     // ...
//! }
//! ```

use std::sync::Once;

pub mod mocks;

pub use mocks::{
    ConflictInjectingStore, FailingProfileDirectory, FixedClock, InMemoryClaimStore,
    InMemoryGroupDirectory, InMemoryProfileDirectory, OpenGroupDirectory, test_clock,
};

static TRACING_INIT: Once = Once::new();

/// Initialize a tracing subscriber for tests, honoring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_test_tracing() {
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
