//! Storage records for offers and claims.
//!
//! These are the documents the [`ClaimStore`](crate::store::ClaimStore)
//! persists. Feature-specific fields (`details`, `payload`, `outcome`) are
//! opaque bytes at this layer: the engine encodes and decodes them, which
//! keeps the store trait independent of any particular offer kind and usable
//! as a trait object.

use crate::capacity::CapacityPool;
use crate::ids::{OfferId, ParentId, UserId};
use crate::lifecycle::OfferStatus;
use crate::version::Version;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Parent record of a claim pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferRecord {
    /// Owning hangout/event.
    pub parent_id: ParentId,
    /// Offer identity within the parent.
    pub offer_id: OfferId,
    /// User who created the offer and owns its mutations.
    pub owner_id: UserId,
    /// Stable kind tag (e.g. `"ticket-offer"`); guards against decoding an
    /// offer with the wrong feature types.
    pub kind: String,
    /// Capacity counters. The claimed count is denormalized for fast reads
    /// and reconciled against the claim records on every load.
    pub pool: CapacityPool,
    /// Lifecycle status.
    pub status: OfferStatus,
    /// Optimistic-concurrency token; bumped on every successful write.
    pub version: Version,
    /// Feature fields (section, notes, ...), opaque JSON.
    pub details: Vec<u8>,
    /// Terminal settlement, opaque JSON; `Some` once completed.
    pub outcome: Option<Vec<u8>>,
    /// When the offer was created.
    pub created_at: DateTime<Utc>,
    /// When the offer was last written.
    pub updated_at: DateTime<Utc>,
}

/// Child record: one user holding one unit of an offer's capacity.
///
/// The `(parent_id, offer_id, user_id)` tuple is the identity — its
/// uniqueness is the double-claim guard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    /// Owning hangout/event.
    pub parent_id: ParentId,
    /// Offer the claim belongs to.
    pub offer_id: OfferId,
    /// The claiming user.
    pub user_id: UserId,
    /// Feature payload (rider note, seat label, ...), opaque JSON.
    pub payload: Vec<u8>,
    /// When the claim was created.
    pub created_at: DateTime<Utc>,
    /// When the claim was last written.
    pub updated_at: DateTime<Utc>,
}

/// An offer together with all of its claims, produced by one consistent read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OfferSnapshot {
    /// The parent record.
    pub offer: OfferRecord,
    /// Every claim currently held against the offer.
    pub claims: Vec<ClaimRecord>,
}
