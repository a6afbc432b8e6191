//! # Huddle Engine
//!
//! The claim engine: every operation on a capacity-bounded offer is a
//! read-decide-write cycle against the [`ClaimStore`](huddle_core::ClaimStore)
//! with bounded retry on version conflicts.
//!
//! Concurrency correctness comes entirely from the store's conditional write:
//! the engine holds no locks, suspends only at the store read and the store
//! write, and computes every decision purely in memory from the snapshot
//! taken at read time. A stale decision fails closed at the write and the
//! whole cycle is retried.
//!
//! Business-rule rejections (`CapacityExceeded`, `OfferNotCollecting`,
//! `Validation`, `Unauthorized`, `NotFound`) are never retried; they surface
//! immediately so a caller can tell "full" apart from "try again".

pub mod engine;
pub mod metrics;
pub mod retry;

pub use engine::ClaimEngine;
pub use retry::{RetryPolicy, RetryPolicyBuilder, retry_conflicts};
