//! The ticket-offer service: membership checks, engine calls, and
//! display-enriched views.

use crate::types::{TicketDetails, TicketOffer, TicketOutcome, TicketSettlement};
use chrono::{DateTime, Utc};
use huddle_core::{
    Capacity, ClaimError, ClaimStore, Clock, GroupDirectory, Offer, OfferId, OfferStatus,
    ParentId, ProfileDirectory, UserId, UserProfile,
};
use huddle_engine::ClaimEngine;
use std::sync::Arc;

/// A ticket offer projected for display.
#[derive(Clone, Debug)]
pub struct TicketOfferView {
    /// The offer.
    pub offer_id: OfferId,
    /// Owning hangout/event.
    pub parent_id: ParentId,
    /// The host, enriched with display fields.
    pub owner: UserProfile,
    /// Venue section, when known.
    pub section: Option<String>,
    /// Host note.
    pub notes: Option<String>,
    /// Total slots.
    pub capacity: u32,
    /// Slots claimed.
    pub claimed: u32,
    /// Slots remaining (derived).
    pub remaining: u32,
    /// Lifecycle status.
    pub status: OfferStatus,
    /// Settlement, once finalized.
    pub outcome: Option<TicketOutcome>,
    /// Current claim holders, in claim order.
    pub claims: Vec<TicketClaimView>,
}

/// One claim projected for display.
#[derive(Clone, Debug)]
pub struct TicketClaimView {
    /// The claim holder, enriched with display fields.
    pub holder: UserProfile,
    /// When the slot was claimed.
    pub claimed_at: DateTime<Utc>,
}

/// Façade over the claim engine for ticket offers.
///
/// Performs the group-membership authorization check before every engine
/// call and enriches results with display profiles. Profile enrichment is a
/// best-effort side read: a directory failure degrades the display fields
/// and never fails an operation that already committed.
#[derive(Clone)]
pub struct TicketOfferService {
    engine: ClaimEngine<TicketOffer>,
    groups: Arc<dyn GroupDirectory>,
    profiles: Arc<dyn ProfileDirectory>,
}

impl TicketOfferService {
    /// Creates a service with the default engine configuration.
    #[must_use]
    pub fn new(
        store: Arc<dyn ClaimStore>,
        clock: Arc<dyn Clock>,
        groups: Arc<dyn GroupDirectory>,
        profiles: Arc<dyn ProfileDirectory>,
    ) -> Self {
        Self::with_engine(ClaimEngine::new(store, clock), groups, profiles)
    }

    /// Creates a service over an explicitly configured engine.
    #[must_use]
    pub const fn with_engine(
        engine: ClaimEngine<TicketOffer>,
        groups: Arc<dyn GroupDirectory>,
        profiles: Arc<dyn ProfileDirectory>,
    ) -> Self {
        Self {
            engine,
            groups,
            profiles,
        }
    }

    /// Open a new offer of `capacity` ticket slots.
    ///
    /// # Errors
    ///
    /// [`ClaimError::Unauthorized`] for non-members, plus the engine's
    /// creation errors.
    pub async fn open_offer(
        &self,
        parent_id: ParentId,
        owner_id: UserId,
        capacity: Capacity,
        details: TicketDetails,
    ) -> Result<TicketOfferView, ClaimError> {
        self.ensure_member(parent_id, owner_id).await?;
        let offer = self
            .engine
            .create(parent_id, owner_id, capacity, details)
            .await?;
        Ok(self.view(offer).await)
    }

    /// Fetch an offer with its claims.
    ///
    /// # Errors
    ///
    /// [`ClaimError::Unauthorized`] for non-members, [`ClaimError::NotFound`]
    /// for a missing offer.
    pub async fn offer(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        caller: UserId,
    ) -> Result<TicketOfferView, ClaimError> {
        self.ensure_member(parent_id, caller).await?;
        let offer = self.engine.get(parent_id, offer_id).await?;
        Ok(self.view(offer).await)
    }

    /// Claim one slot. Idempotent per user.
    ///
    /// # Errors
    ///
    /// [`ClaimError::CapacityExceeded`] when the offer is full,
    /// [`ClaimError::OfferNotCollecting`] once finalized or cancelled, plus
    /// membership and engine errors.
    pub async fn claim_slot(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        user_id: UserId,
    ) -> Result<TicketClaimView, ClaimError> {
        self.ensure_member(parent_id, user_id).await?;
        let claim = self.engine.claim(parent_id, offer_id, user_id, ()).await?;
        Ok(TicketClaimView {
            holder: self.display(claim.user_id).await,
            claimed_at: claim.created_at,
        })
    }

    /// Give a claimed slot back. A no-op success when no claim is held.
    ///
    /// # Errors
    ///
    /// [`ClaimError::OfferNotCollecting`] once finalized or cancelled, plus
    /// membership and engine errors.
    pub async fn withdraw_claim(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        user_id: UserId,
    ) -> Result<(), ClaimError> {
        self.ensure_member(parent_id, user_id).await?;
        self.engine.unclaim(parent_id, offer_id, user_id).await
    }

    /// Finalize the offer: settle the price across claim holders and lock
    /// the offer. Owner-only; repeating the call with the same settlement
    /// succeeds idempotently.
    ///
    /// # Errors
    ///
    /// [`ClaimError::Validation`] for a settlement that does not fit the
    /// claim set, plus ownership, membership, and engine errors.
    pub async fn finalize(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        owner_id: UserId,
        settlement: TicketSettlement,
    ) -> Result<TicketOfferView, ClaimError> {
        self.ensure_member(parent_id, owner_id).await?;
        let offer = self
            .engine
            .complete(parent_id, offer_id, owner_id, settlement)
            .await?;
        Ok(self.view(offer).await)
    }

    /// Change the slot count. Owner-only; rejected below the claimed count.
    ///
    /// # Errors
    ///
    /// [`ClaimError::Validation`] for a resize below the claimed count, plus
    /// ownership, membership, and engine errors.
    pub async fn set_capacity(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        owner_id: UserId,
        capacity: Capacity,
    ) -> Result<TicketOfferView, ClaimError> {
        self.ensure_member(parent_id, owner_id).await?;
        let offer = self
            .engine
            .update_capacity(parent_id, offer_id, owner_id, capacity)
            .await?;
        Ok(self.view(offer).await)
    }

    /// Update the section/notes. Owner-only.
    ///
    /// # Errors
    ///
    /// Ownership, membership, and engine errors.
    pub async fn annotate(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        owner_id: UserId,
        details: TicketDetails,
    ) -> Result<TicketOfferView, ClaimError> {
        self.ensure_member(parent_id, owner_id).await?;
        let offer = self
            .engine
            .update_details(parent_id, offer_id, owner_id, details)
            .await?;
        Ok(self.view(offer).await)
    }

    /// Cancel the offer. Owner-only; a no-op success when already terminal.
    ///
    /// # Errors
    ///
    /// Ownership, membership, and engine errors.
    pub async fn cancel_offer(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        owner_id: UserId,
    ) -> Result<(), ClaimError> {
        self.ensure_member(parent_id, owner_id).await?;
        self.engine.cancel(parent_id, offer_id, owner_id).await
    }

    /// Delete the offer and its claims. Owner-only; a no-op success when
    /// already gone.
    ///
    /// # Errors
    ///
    /// Ownership, membership, and engine errors.
    pub async fn delete_offer(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        owner_id: UserId,
    ) -> Result<(), ClaimError> {
        self.ensure_member(parent_id, owner_id).await?;
        self.engine.delete(parent_id, offer_id, owner_id).await
    }

    async fn ensure_member(&self, parent_id: ParentId, user_id: UserId) -> Result<(), ClaimError> {
        let is_member = self
            .groups
            .is_member(parent_id, user_id)
            .await
            .map_err(|err| ClaimError::Unavailable(err.to_string()))?;
        if is_member {
            Ok(())
        } else {
            Err(ClaimError::Unauthorized { user_id })
        }
    }

    async fn display(&self, user_id: UserId) -> UserProfile {
        match self.profiles.profile(user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => UserProfile::placeholder(user_id),
            Err(err) => {
                tracing::warn!(%user_id, error = %err, "profile enrichment failed, using placeholder");
                UserProfile::placeholder(user_id)
            }
        }
    }

    async fn view(&self, offer: Offer<TicketOffer>) -> TicketOfferView {
        let owner = self.display(offer.owner_id).await;
        let mut claims = Vec::with_capacity(offer.claims.len());
        for claim in &offer.claims {
            claims.push(TicketClaimView {
                holder: self.display(claim.user_id).await,
                claimed_at: claim.created_at,
            });
        }

        TicketOfferView {
            offer_id: offer.offer_id,
            parent_id: offer.parent_id,
            owner,
            section: offer.details.section.clone(),
            notes: offer.details.notes.clone(),
            capacity: offer.pool.total().value(),
            claimed: offer.claimed_count(),
            remaining: offer.available(),
            status: offer.status,
            outcome: offer.outcome,
            claims,
        }
    }
}
