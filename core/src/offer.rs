//! Typed views over the storage records.
//!
//! The engine and the façades work with [`Offer`] and [`Claim`], which carry
//! the feature types of an [`OfferKind`]; encoding to and decoding from the
//! byte-opaque records happens here, at the boundary, so the store never
//! learns about feature types.

use crate::capacity::CapacityPool;
use crate::error::ClaimError;
use crate::ids::{OfferId, ParentId, UserId};
use crate::kind::OfferKind;
use crate::lifecycle::OfferStatus;
use crate::record::{ClaimRecord, OfferRecord, OfferSnapshot};
use crate::version::Version;
use chrono::{DateTime, Utc};

fn codec_err(err: serde_json::Error) -> ClaimError {
    ClaimError::Codec(err.to_string())
}

/// One user's hold on one unit of an offer's capacity, decoded.
#[derive(Clone, Debug)]
pub struct Claim<K: OfferKind> {
    /// The claiming user.
    pub user_id: UserId,
    /// Feature payload.
    pub payload: K::Payload,
    /// When the claim was created.
    pub created_at: DateTime<Utc>,
    /// When the claim was last written.
    pub updated_at: DateTime<Utc>,
}

impl<K: OfferKind> Claim<K> {
    /// Decode a stored claim record.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::Codec`] when the payload bytes do not decode as
    /// `K::Payload`.
    pub fn from_record(record: &ClaimRecord) -> Result<Self, ClaimError> {
        Ok(Self {
            user_id: record.user_id,
            payload: serde_json::from_slice(&record.payload).map_err(codec_err)?,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    /// Encode this claim for storage under the given offer.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::Codec`] when the payload fails to serialize.
    pub fn to_record(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
    ) -> Result<ClaimRecord, ClaimError> {
        Ok(ClaimRecord {
            parent_id,
            offer_id,
            user_id: self.user_id,
            payload: serde_json::to_vec(&self.payload).map_err(codec_err)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// An offer with its claims, decoded from one consistent snapshot.
#[derive(Clone, Debug)]
pub struct Offer<K: OfferKind> {
    /// Owning hangout/event.
    pub parent_id: ParentId,
    /// Offer identity within the parent.
    pub offer_id: OfferId,
    /// User who created the offer.
    pub owner_id: UserId,
    /// Capacity counters, reconciled against the claim set at decode time.
    pub pool: CapacityPool,
    /// Lifecycle status.
    pub status: OfferStatus,
    /// Version the snapshot was read at; conditional writes key on it.
    pub version: Version,
    /// Feature fields.
    pub details: K::Details,
    /// Terminal settlement, present once completed.
    pub outcome: Option<K::Outcome>,
    /// Claims in deterministic order: creation time, then user id.
    pub claims: Vec<Claim<K>>,
    /// When the offer was created.
    pub created_at: DateTime<Utc>,
    /// When the offer was last written.
    pub updated_at: DateTime<Utc>,
}

impl<K: OfferKind> Offer<K> {
    /// Decode a snapshot into the typed view.
    ///
    /// The denormalized claimed count is replaced by the observed claim count
    /// (it is recomputed on every write, so a mismatch means drift and the
    /// claim records win). Claims are sorted for deterministic settlement.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::Codec`] when the stored kind tag does not match
    /// `K::KIND` or any opaque field fails to decode.
    pub fn from_snapshot(snapshot: OfferSnapshot) -> Result<Self, ClaimError> {
        let record = snapshot.offer;
        if record.kind != K::KIND {
            return Err(ClaimError::Codec(format!(
                "offer kind mismatch: stored '{}', requested '{}'",
                record.kind,
                K::KIND
            )));
        }

        let mut claims = snapshot
            .claims
            .iter()
            .map(Claim::from_record)
            .collect::<Result<Vec<_>, _>>()?;
        claims.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });

        let observed = u32::try_from(claims.len()).unwrap_or(u32::MAX);

        Ok(Self {
            parent_id: record.parent_id,
            offer_id: record.offer_id,
            owner_id: record.owner_id,
            pool: record.pool.reconcile(observed),
            status: record.status,
            version: record.version,
            details: serde_json::from_slice(&record.details).map_err(codec_err)?,
            outcome: record
                .outcome
                .as_deref()
                .map(serde_json::from_slice)
                .transpose()
                .map_err(codec_err)?,
            claims,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    /// Encode the offer-level fields for storage.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::Codec`] when a feature field fails to serialize.
    pub fn to_record(&self) -> Result<OfferRecord, ClaimError> {
        Ok(OfferRecord {
            parent_id: self.parent_id,
            offer_id: self.offer_id,
            owner_id: self.owner_id,
            kind: K::KIND.to_string(),
            pool: self.pool,
            status: self.status,
            version: self.version,
            details: serde_json::to_vec(&self.details).map_err(codec_err)?,
            outcome: self
                .outcome
                .as_ref()
                .map(serde_json::to_vec)
                .transpose()
                .map_err(codec_err)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    /// The claim held by `user_id`, if any.
    #[must_use]
    pub fn claim_for(&self, user_id: UserId) -> Option<&Claim<K>> {
        self.claims.iter().find(|claim| claim.user_id == user_id)
    }

    /// Slots currently claimed.
    #[must_use]
    pub const fn claimed_count(&self) -> u32 {
        self.pool.claimed()
    }

    /// Slots still available (derived, never stored).
    #[must_use]
    pub const fn available(&self) -> u32 {
        self.pool.available()
    }

    /// Guard: the offer must still be collecting.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::OfferNotCollecting`] in a terminal state.
    pub const fn ensure_collecting(&self) -> Result<(), ClaimError> {
        if self.status.is_collecting() {
            Ok(())
        } else {
            Err(ClaimError::OfferNotCollecting {
                status: self.status,
            })
        }
    }

    /// Guard: only the owner may mutate offer-level state.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::Unauthorized`] for any other caller.
    pub fn ensure_owner(&self, caller: UserId) -> Result<(), ClaimError> {
        if self.owner_id == caller {
            Ok(())
        } else {
            Err(ClaimError::Unauthorized { user_id: caller })
        }
    }
}
