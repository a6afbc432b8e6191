//! The carpool service: membership checks, engine calls, and display-enriched
//! ride views.

use crate::types::{CarDetails, CloseRide, RideOutcome, RiderDetails, SeatOffer};
use chrono::{DateTime, Utc};
use huddle_core::{
    Capacity, ClaimError, ClaimStore, Clock, GroupDirectory, Offer, OfferId, OfferStatus,
    ParentId, ProfileDirectory, UserId, UserProfile,
};
use huddle_engine::ClaimEngine;
use std::sync::Arc;

/// A ride projected for display.
#[derive(Clone, Debug)]
pub struct RideView {
    /// The offer.
    pub offer_id: OfferId,
    /// Owning hangout/event.
    pub parent_id: ParentId,
    /// The driver, enriched with display fields.
    pub driver: UserProfile,
    /// Driver note.
    pub notes: Option<String>,
    /// Total seats in the car.
    pub total_seats: u32,
    /// Seats still open — always `total - claimed`, derived, never stored.
    pub available_seats: u32,
    /// Lifecycle status.
    pub status: OfferStatus,
    /// Settlement, once the ride closed.
    pub outcome: Option<RideOutcome>,
    /// Current riders, in claim order.
    pub riders: Vec<RiderView>,
}

/// One rider projected for display.
#[derive(Clone, Debug)]
pub struct RiderView {
    /// The rider, enriched with display fields.
    pub rider: UserProfile,
    /// Pickup note the rider left when claiming.
    pub pickup_note: Option<String>,
    /// When the seat was claimed.
    pub claimed_at: DateTime<Utc>,
}

/// Façade over the claim engine for carpool seats. The driver is the
/// capacity owner.
#[derive(Clone)]
pub struct CarpoolService {
    engine: ClaimEngine<SeatOffer>,
    groups: Arc<dyn GroupDirectory>,
    profiles: Arc<dyn ProfileDirectory>,
}

impl CarpoolService {
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
        engine: ClaimEngine<SeatOffer>,
        groups: Arc<dyn GroupDirectory>,
        profiles: Arc<dyn ProfileDirectory>,
    ) -> Self {
        Self {
            engine,
            groups,
            profiles,
        }
    }

    /// Offer `seats` seats for a hangout.
    ///
    /// # Errors
    ///
    /// [`ClaimError::Unauthorized`] for non-members, plus the engine's
    /// creation errors.
    pub async fn offer_seats(
        &self,
        parent_id: ParentId,
        driver_id: UserId,
        seats: Capacity,
        details: CarDetails,
    ) -> Result<RideView, ClaimError> {
        self.ensure_member(parent_id, driver_id).await?;
        let offer = self
            .engine
            .create(parent_id, driver_id, seats, details)
            .await?;
        Ok(self.view(offer).await)
    }

    /// Fetch a ride with its riders.
    ///
    /// # Errors
    ///
    /// [`ClaimError::Unauthorized`] for non-members, [`ClaimError::NotFound`]
    /// for a missing ride.
    pub async fn ride(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        caller: UserId,
    ) -> Result<RideView, ClaimError> {
        self.ensure_member(parent_id, caller).await?;
        let offer = self.engine.get(parent_id, offer_id).await?;
        Ok(self.view(offer).await)
    }

    /// Claim a seat. Idempotent per rider.
    ///
    /// # Errors
    ///
    /// [`ClaimError::CapacityExceeded`] when the car is full,
    /// [`ClaimError::OfferNotCollecting`] once closed or cancelled, plus
    /// membership and engine errors.
    pub async fn claim_seat(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        rider_id: UserId,
        details: RiderDetails,
    ) -> Result<RiderView, ClaimError> {
        self.ensure_member(parent_id, rider_id).await?;
        let claim = self
            .engine
            .claim(parent_id, offer_id, rider_id, details)
            .await?;
        Ok(RiderView {
            rider: self.display(claim.user_id).await,
            pickup_note: claim.payload.pickup_note,
            claimed_at: claim.created_at,
        })
    }

    /// Give a seat back. A no-op success when the rider holds no seat.
    ///
    /// # Errors
    ///
    /// [`ClaimError::OfferNotCollecting`] once closed or cancelled, plus
    /// membership and engine errors.
    pub async fn release_seat(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        rider_id: UserId,
    ) -> Result<(), ClaimError> {
        self.ensure_member(parent_id, rider_id).await?;
        self.engine.unclaim(parent_id, offer_id, rider_id).await
    }

    /// Close the ride: lock in who rode. Driver-only; idempotent.
    ///
    /// # Errors
    ///
    /// Ownership, membership, and engine errors.
    pub async fn close_ride(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        driver_id: UserId,
    ) -> Result<RideView, ClaimError> {
        self.ensure_member(parent_id, driver_id).await?;
        let offer = self
            .engine
            .complete(parent_id, offer_id, driver_id, CloseRide)
            .await?;
        Ok(self.view(offer).await)
    }

    /// Change the seat count. Driver-only; rejected below the number of
    /// riders already aboard.
    ///
    /// # Errors
    ///
    /// [`ClaimError::Validation`] for a resize below the rider count, plus
    /// ownership, membership, and engine errors.
    pub async fn set_seat_count(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        driver_id: UserId,
        seats: Capacity,
    ) -> Result<RideView, ClaimError> {
        self.ensure_member(parent_id, driver_id).await?;
        let offer = self
            .engine
            .update_capacity(parent_id, offer_id, driver_id, seats)
            .await?;
        Ok(self.view(offer).await)
    }

    /// Update the driver note. Driver-only.
    ///
    /// # Errors
    ///
    /// Ownership, membership, and engine errors.
    pub async fn annotate(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        driver_id: UserId,
        details: CarDetails,
    ) -> Result<RideView, ClaimError> {
        self.ensure_member(parent_id, driver_id).await?;
        let offer = self
            .engine
            .update_details(parent_id, offer_id, driver_id, details)
            .await?;
        Ok(self.view(offer).await)
    }

    /// Cancel the ride. Driver-only; a no-op success when already terminal.
    ///
    /// # Errors
    ///
    /// Ownership, membership, and engine errors.
    pub async fn cancel_ride(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        driver_id: UserId,
    ) -> Result<(), ClaimError> {
        self.ensure_member(parent_id, driver_id).await?;
        self.engine.cancel(parent_id, offer_id, driver_id).await
    }

    /// Delete the ride and its claims. Driver-only; a no-op success when
    /// already gone.
    ///
    /// # Errors
    ///
    /// Ownership, membership, and engine errors.
    pub async fn delete_ride(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        driver_id: UserId,
    ) -> Result<(), ClaimError> {
        self.ensure_member(parent_id, driver_id).await?;
        self.engine.delete(parent_id, offer_id, driver_id).await
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

    async fn view(&self, offer: Offer<SeatOffer>) -> RideView {
        let driver = self.display(offer.owner_id).await;
        let mut riders = Vec::with_capacity(offer.claims.len());
        for claim in &offer.claims {
            riders.push(RiderView {
                rider: self.display(claim.user_id).await,
                pickup_note: claim.payload.pickup_note.clone(),
                claimed_at: claim.created_at,
            });
        }

        RideView {
            offer_id: offer.offer_id,
            parent_id: offer.parent_id,
            driver,
            notes: offer.details.notes.clone(),
            total_seats: offer.pool.total().value(),
            available_seats: offer.available(),
            status: offer.status,
            outcome: offer.outcome,
            riders,
        }
    }
}
