//! Domain types for carpool seat offers.

use huddle_core::{ClaimError, Offer, OfferKind};
use serde::{Deserialize, Serialize};

/// The carpool kind: seats in one driver's car.
#[derive(Clone, Copy, Debug, Default)]
pub struct SeatOffer;

/// Offer-level fields for a car.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarDetails {
    /// Free-form note from the driver (meeting point, departure time, ...).
    pub notes: Option<String>,
}

/// Per-rider claim payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiderDetails {
    /// Where the rider wants to be picked up.
    pub pickup_note: Option<String>,
}

/// Completion input for closing a ride. Carries nothing: the settlement is
/// just the seat count at closing time.
#[derive(Clone, Copy, Debug, Default)]
pub struct CloseRide;

/// Terminal settlement recorded on a closed ride.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RideOutcome {
    /// Seats that were claimed when the ride closed.
    pub seats_filled: u32,
}

impl OfferKind for SeatOffer {
    const KIND: &'static str = "carpool-seats";

    type Details = CarDetails;
    type Payload = RiderDetails;
    type Completion = CloseRide;
    type Outcome = RideOutcome;

    fn settle(offer: &Offer<Self>, _input: &CloseRide) -> Result<RideOutcome, ClaimError> {
        // A ride with no riders still closes; the driver just went alone.
        Ok(RideOutcome {
            seats_filled: offer.claimed_count(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use huddle_core::{
        Capacity, CapacityPool, Claim, OfferId, OfferStatus, ParentId, UserId, Version,
    };

    #[test]
    fn closing_settles_to_the_claimed_seat_count() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 18, 0, 0).single().unwrap();
        let claims = (0..3)
            .map(|_| Claim::<SeatOffer> {
                user_id: UserId::new(),
                payload: RiderDetails::default(),
                created_at: now,
                updated_at: now,
            })
            .collect::<Vec<_>>();

        let offer = Offer::<SeatOffer> {
            parent_id: ParentId::new(),
            offer_id: OfferId::new(),
            owner_id: UserId::new(),
            pool: CapacityPool::new(Capacity::new(4)).reconcile(3),
            status: OfferStatus::Collecting,
            version: Version::INITIAL,
            details: CarDetails::default(),
            outcome: None,
            claims,
            created_at: now,
            updated_at: now,
        };

        let outcome = SeatOffer::settle(&offer, &CloseRide).unwrap();
        assert_eq!(outcome, RideOutcome { seats_filled: 3 });
    }
}
