//! The offer kind seam.
//!
//! Reservation offers and carpool seats share one state machine and one
//! concurrency-critical code path; what differs is vocabulary and completion
//! semantics. Each feature implements [`OfferKind`] and the engine is written
//! once, generic over it.

use crate::error::ClaimError;
use crate::offer::Offer;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;

/// A feature's view of a claimable pool: its payload types and its
/// settlement rule.
///
/// Implementors are zero-sized markers (e.g. a `TicketOffer` unit struct);
/// the associated types carry the feature data and `settle` computes the
/// terminal outcome when the owner completes the offer.
pub trait OfferKind: Clone + fmt::Debug + Send + Sync + 'static {
    /// Stable kind tag stored on every offer record. Guards against decoding
    /// an offer with the wrong feature types.
    const KIND: &'static str;

    /// Offer-level feature fields (section, notes, ...), opaque to the
    /// engine.
    type Details: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Per-claim feature payload (rider note, seat label, ...).
    type Payload: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Input to the terminal completion transition.
    type Completion: Clone + fmt::Debug + Send + Sync + 'static;

    /// Final settlement recorded on the completed offer.
    ///
    /// `PartialEq` makes completion idempotent: a repeated `complete` call
    /// recomputes the outcome and compares it with the stored one.
    type Outcome: Clone
        + fmt::Debug
        + PartialEq
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;

    /// Compute the terminal outcome from the offer snapshot at completion
    /// time.
    ///
    /// The claims on `offer` are in deterministic order (creation time, then
    /// user id), so settlements that depend on ordering — like handing
    /// remainder cents to the earliest claimants — are stable across loads.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::Validation`] when the completion input does not
    /// fit the current claim set.
    fn settle(offer: &Offer<Self>, input: &Self::Completion) -> Result<Self::Outcome, ClaimError>;
}
