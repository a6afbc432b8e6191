//! The error taxonomy surfaced by the claim engine and its façades.

use crate::capacity::CapacityError;
use crate::ids::{OfferId, ParentId, UserId};
use crate::lifecycle::OfferStatus;
use crate::store::ClaimStoreError;
use thiserror::Error;

/// Errors from claim operations.
///
/// The taxonomy matters to callers: a claim attempt on a full offer must be
/// distinguishable from a claim attempt on a deleted offer, and both from a
/// transient conflict the caller may simply retry. Only
/// [retryable](ClaimError::is_retryable) variants are ever recovered from
/// internally; the rest propagate unchanged.
#[derive(Error, Debug)]
pub enum ClaimError {
    /// The referenced offer does not exist under the given parent.
    #[error("offer {offer_id} not found under parent {parent_id}")]
    NotFound {
        /// Owning hangout/event.
        parent_id: ParentId,
        /// The missing offer.
        offer_id: OfferId,
    },

    /// The caller lacks the required relationship to the resource
    /// (non-owner attempting an owner-only action, or a non-member of the
    /// owning group).
    #[error("user {user_id} is not allowed to perform this action")]
    Unauthorized {
        /// The rejected caller.
        user_id: UserId,
    },

    /// The operation is illegal in the offer's current lifecycle state.
    #[error("offer is {status} and no longer accepts this operation")]
    OfferNotCollecting {
        /// The offer's current status.
        status: OfferStatus,
    },

    /// The pool is full. A genuine business rejection, distinct from a
    /// concurrency conflict, and never retried.
    #[error("offer is full: {claimed} of {capacity} slots claimed")]
    CapacityExceeded {
        /// Total capacity.
        capacity: u32,
        /// Slots already claimed.
        claimed: u32,
    },

    /// Invalid input: illegal capacity resize, malformed settlement, ...
    #[error("validation failed: {0}")]
    Validation(String),

    /// The retry budget was exhausted under contention. The request was
    /// never partially applied; the caller may try again.
    #[error("operation abandoned after {attempts} conflicting attempts, try again")]
    Contention {
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// A storage-layer failure surfaced from the claim store.
    #[error("claim store error: {0}")]
    Store(#[from] ClaimStoreError),

    /// A collaborator (profile or membership lookup) was unavailable.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    /// Failed to encode or decode a feature payload.
    #[error("encode/decode failure: {0}")]
    Codec(String),
}

impl ClaimError {
    /// Whether the caller (or the engine's internal retry loop) can hope to
    /// succeed by simply trying again.
    ///
    /// Business-rule violations are final; conflicts and transient failures
    /// are not.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Store(err) => err.is_retryable(),
            Self::Contention { .. } | Self::Unavailable(_) => true,
            Self::NotFound { .. }
            | Self::Unauthorized { .. }
            | Self::OfferNotCollecting { .. }
            | Self::CapacityExceeded { .. }
            | Self::Validation(_)
            | Self::Codec(_) => false,
        }
    }

    /// Map a pure capacity-pool rejection into the engine taxonomy.
    #[must_use]
    pub fn from_capacity(err: CapacityError) -> Self {
        match err {
            CapacityError::Exceeded {
                capacity, claimed, ..
            } => Self::CapacityExceeded { capacity, claimed },
            CapacityError::BelowClaimed { .. } => Self::Validation(err.to_string()),
        }
    }
}
