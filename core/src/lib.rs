//! # Huddle Core
//!
//! Core types and contracts for the huddle claim ledger — the capacity-bounded
//! offer/claim subsystem behind reservation offers and carpool seats.
//!
//! This crate is a leaf: it defines the domain vocabulary and the boundaries
//! the engine operates across, but performs no I/O itself.
//!
//! ## Core Concepts
//!
//! - **Offer**: a capacity-bounded resource (ticket slots, car seats) created
//!   by one owner and claimed by others.
//! - **Claim**: a record of one user holding one unit of an offer's capacity.
//! - **Capacity Pool**: the total/claimed counters and the invariant relating
//!   them (`0 <= claimed <= capacity`), with pure value semantics.
//! - **Claim Store**: the persistence boundary — a single consistent read of
//!   an offer and its claims, and version-conditioned atomic writes.
//! - **Offer Kind**: the narrow seam each feature implements so the
//!   concurrency-critical path is written exactly once.
//!
//! ## Architecture Principles
//!
//! - Optimistic concurrency via a version token, never in-process locks
//! - Decisions computed purely from a snapshot, re-validated by the
//!   conditional write
//! - Dependency injection via traits (`ClaimStore`, `Clock`, directories)

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};

pub mod capacity;
pub mod directory;
pub mod environment;
pub mod error;
pub mod ids;
pub mod kind;
pub mod lifecycle;
pub mod money;
pub mod offer;
pub mod record;
pub mod store;
pub mod version;

pub use capacity::{Capacity, CapacityError, CapacityPool};
pub use directory::{DirectoryError, GroupDirectory, ProfileDirectory, UserProfile};
pub use environment::{Clock, SystemClock};
pub use error::ClaimError;
pub use ids::{OfferId, ParentId, UserId};
pub use kind::OfferKind;
pub use lifecycle::OfferStatus;
pub use money::Money;
pub use offer::{Claim, Offer};
pub use record::{ClaimRecord, OfferRecord, OfferSnapshot};
pub use store::{ClaimStore, ClaimStoreError};
pub use version::Version;
