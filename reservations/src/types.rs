//! Domain types for ticket/reservation offers.

use huddle_core::{ClaimError, Money, Offer, OfferKind, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The ticket-offer kind: slots claimed by members, finalized into purchases
/// with a price split.
#[derive(Clone, Copy, Debug, Default)]
pub struct TicketOffer;

/// Offer-level fields for a ticket offer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketDetails {
    /// Venue section the tickets are in, when known.
    pub section: Option<String>,
    /// Free-form note from the host.
    pub notes: Option<String>,
}

/// One participant's share of the finalized price.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantShare {
    /// The participant.
    pub user_id: UserId,
    /// What they owe.
    pub amount: Money,
}

/// Completion input: the total the host paid, split evenly across claimants
/// unless explicit shares are given.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketSettlement {
    /// Total purchase price.
    pub total_price: Money,
    /// Explicit per-participant shares; must cover exactly the claimant set
    /// and sum to `total_price`.
    pub shares: Option<Vec<ParticipantShare>>,
}

impl TicketSettlement {
    /// Even split of `total_price` across whoever holds a claim.
    #[must_use]
    pub const fn even(total_price: Money) -> Self {
        Self {
            total_price,
            shares: None,
        }
    }
}

/// Terminal settlement recorded on a finalized ticket offer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketOutcome {
    /// Tickets purchased — one per claim held at finalization.
    pub tickets_purchased: u32,
    /// Total purchase price.
    pub total_price: Money,
    /// Per-participant shares, in claim order.
    pub shares: Vec<ParticipantShare>,
}

impl OfferKind for TicketOffer {
    const KIND: &'static str = "ticket-offer";

    type Details = TicketDetails;
    type Payload = ();
    type Completion = TicketSettlement;
    type Outcome = TicketOutcome;

    fn settle(
        offer: &Offer<Self>,
        input: &TicketSettlement,
    ) -> Result<TicketOutcome, ClaimError> {
        let claimants: Vec<UserId> = offer.claims.iter().map(|claim| claim.user_id).collect();
        if claimants.is_empty() {
            return Err(ClaimError::Validation(
                "cannot finalize a ticket offer with no claims".to_string(),
            ));
        }
        let count = u32::try_from(claimants.len()).unwrap_or(u32::MAX);

        let shares = match &input.shares {
            None => even_shares(&claimants, input.total_price)?,
            Some(explicit) => explicit_shares(&claimants, input.total_price, explicit)?,
        };

        Ok(TicketOutcome {
            tickets_purchased: count,
            total_price: input.total_price,
            shares,
        })
    }
}

/// Split the total evenly; leftover cents go to the earliest claimants so the
/// shares always sum exactly to the total.
fn even_shares(
    claimants: &[UserId],
    total_price: Money,
) -> Result<Vec<ParticipantShare>, ClaimError> {
    let count = u32::try_from(claimants.len()).unwrap_or(u32::MAX);
    let amounts = total_price.checked_split_even(count).ok_or_else(|| {
        ClaimError::Validation("cannot split a price across zero claimants".to_string())
    })?;

    Ok(claimants
        .iter()
        .zip(amounts)
        .map(|(&user_id, amount)| ParticipantShare { user_id, amount })
        .collect())
}

/// Validate explicit shares: exactly one per claimant, no strangers, and the
/// amounts must sum to the total. The result is normalized into claim order.
fn explicit_shares(
    claimants: &[UserId],
    total_price: Money,
    explicit: &[ParticipantShare],
) -> Result<Vec<ParticipantShare>, ClaimError> {
    let mut by_user: HashMap<UserId, Money> = HashMap::with_capacity(explicit.len());
    let mut sum = Money::ZERO;

    for share in explicit {
        if by_user.insert(share.user_id, share.amount).is_some() {
            return Err(ClaimError::Validation(format!(
                "duplicate share for user {}",
                share.user_id
            )));
        }
        sum = sum.checked_add(share.amount).ok_or_else(|| {
            ClaimError::Validation("share amounts overflow".to_string())
        })?;
    }

    if by_user.len() != claimants.len() {
        return Err(ClaimError::Validation(format!(
            "expected {} shares, got {}",
            claimants.len(),
            by_user.len()
        )));
    }
    if sum != total_price {
        return Err(ClaimError::Validation(format!(
            "shares sum to {sum}, total price is {total_price}"
        )));
    }

    claimants
        .iter()
        .map(|&user_id| {
            by_user
                .get(&user_id)
                .map(|&amount| ParticipantShare { user_id, amount })
                .ok_or_else(|| {
                    ClaimError::Validation(format!("no share given for claimant {user_id}"))
                })
        })
        .collect()
}
