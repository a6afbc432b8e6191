//! End-to-end ticket offer flows: membership, claiming, enrichment, and
//! price-split finalization.

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect

use huddle_core::{
    Capacity, ClaimError, Money, OfferStatus, ParentId, SystemClock, UserId, UserProfile,
};
use huddle_reservations::{
    ParticipantShare, TicketDetails, TicketOfferService, TicketSettlement,
};
use huddle_testing::mocks::{
    FailingProfileDirectory, InMemoryClaimStore, InMemoryGroupDirectory,
    InMemoryProfileDirectory, OpenGroupDirectory,
};
use std::sync::Arc;

fn open_service() -> (TicketOfferService, Arc<InMemoryProfileDirectory>) {
    let profiles = Arc::new(InMemoryProfileDirectory::new());
    let service = TicketOfferService::new(
        Arc::new(InMemoryClaimStore::new()),
        Arc::new(SystemClock),
        Arc::new(OpenGroupDirectory),
        profiles.clone(),
    );
    (service, profiles)
}

#[tokio::test]
async fn non_members_are_rejected_before_the_engine_runs() {
    let groups = Arc::new(InMemoryGroupDirectory::new());
    let service = TicketOfferService::new(
        Arc::new(InMemoryClaimStore::new()),
        Arc::new(SystemClock),
        groups.clone(),
        Arc::new(InMemoryProfileDirectory::new()),
    );

    let parent = ParentId::new();
    let host = UserId::new();
    let outsider = UserId::new();
    groups.add_member(parent, host).await;

    let view = service
        .open_offer(parent, host, Capacity::new(2), TicketDetails::default())
        .await
        .unwrap();

    let result = service.claim_slot(parent, view.offer_id, outsider).await;
    assert!(matches!(result, Err(ClaimError::Unauthorized { .. })));

    let result = service
        .open_offer(parent, outsider, Capacity::new(2), TicketDetails::default())
        .await;
    assert!(matches!(result, Err(ClaimError::Unauthorized { .. })));
}

#[tokio::test]
async fn claims_are_enriched_with_display_profiles() {
    let (service, profiles) = open_service();
    let parent = ParentId::new();
    let host = UserId::new();
    let alice = UserId::new();

    profiles
        .insert(UserProfile {
            user_id: alice,
            display_name: "Alice Kim".to_string(),
            avatar_path: Some("avatars/alice.jpg".to_string()),
        })
        .await;

    let view = service
        .open_offer(parent, host, Capacity::new(2), TicketDetails::default())
        .await
        .unwrap();

    let claim = service.claim_slot(parent, view.offer_id, alice).await.unwrap();
    assert_eq!(claim.holder.display_name, "Alice Kim");
    assert_eq!(claim.holder.avatar_path.as_deref(), Some("avatars/alice.jpg"));

    // unknown users degrade to a placeholder, the claim still works
    let bob = UserId::new();
    let claim = service.claim_slot(parent, view.offer_id, bob).await.unwrap();
    assert_eq!(claim.holder.display_name, bob.to_string());
}

#[tokio::test]
async fn enrichment_failure_never_fails_a_committed_claim() {
    let service = TicketOfferService::new(
        Arc::new(InMemoryClaimStore::new()),
        Arc::new(SystemClock),
        Arc::new(OpenGroupDirectory),
        Arc::new(FailingProfileDirectory),
    );

    let parent = ParentId::new();
    let host = UserId::new();
    let user = UserId::new();

    let view = service
        .open_offer(parent, host, Capacity::new(1), TicketDetails::default())
        .await
        .unwrap();

    let claim = service.claim_slot(parent, view.offer_id, user).await.unwrap();
    assert_eq!(claim.holder.display_name, user.to_string());

    // and the claim really is on the books
    let view = service.offer(parent, view.offer_id, host).await.unwrap();
    assert_eq!(view.claimed, 1);
}

#[tokio::test]
async fn full_flow_with_even_price_split() {
    let (service, _) = open_service();
    let parent = ParentId::new();
    let host = UserId::new();
    let alice = UserId::new();
    let bob = UserId::new();

    let view = service
        .open_offer(
            parent,
            host,
            Capacity::new(2),
            TicketDetails {
                section: Some("Balcony".to_string()),
                notes: Some("Friday show".to_string()),
            },
        )
        .await
        .unwrap();
    let offer_id = view.offer_id;
    assert_eq!(view.capacity, 2);
    assert_eq!(view.remaining, 2);
    assert_eq!(view.section.as_deref(), Some("Balcony"));

    service.claim_slot(parent, offer_id, alice).await.unwrap();
    service.claim_slot(parent, offer_id, bob).await.unwrap();

    // pool is full now
    let charlie = UserId::new();
    let result = service.claim_slot(parent, offer_id, charlie).await;
    assert!(matches!(result, Err(ClaimError::CapacityExceeded { .. })));

    // $100.00 split evenly over two claimants
    let view = service
        .finalize(
            parent,
            offer_id,
            host,
            TicketSettlement::even(Money::checked_from_dollars(100).unwrap()),
        )
        .await
        .unwrap();

    assert_eq!(view.status, OfferStatus::Completed);
    let outcome = view.outcome.clone().unwrap();
    assert_eq!(outcome.tickets_purchased, 2);
    for share in &outcome.shares {
        assert_eq!(share.amount, Money::from_cents(5000));
    }
    // claim records survive finalization as the historical record
    assert_eq!(view.claims.len(), 2);

    // the offer is locked
    let result = service.claim_slot(parent, offer_id, charlie).await;
    assert!(matches!(result, Err(ClaimError::OfferNotCollecting { .. })));

    // re-finalizing with the same settlement is an idempotent success
    let again = service
        .finalize(
            parent,
            offer_id,
            host,
            TicketSettlement::even(Money::checked_from_dollars(100).unwrap()),
        )
        .await
        .unwrap();
    assert_eq!(again.outcome.unwrap(), outcome);

    // but a different settlement is rejected
    let result = service
        .finalize(
            parent,
            offer_id,
            host,
            TicketSettlement::even(Money::checked_from_dollars(90).unwrap()),
        )
        .await;
    assert!(matches!(result, Err(ClaimError::OfferNotCollecting { .. })));
}

#[tokio::test]
async fn odd_cents_are_not_lost_in_the_split() {
    let (service, _) = open_service();
    let parent = ParentId::new();
    let host = UserId::new();

    let view = service
        .open_offer(parent, host, Capacity::new(2), TicketDetails::default())
        .await
        .unwrap();
    service
        .claim_slot(parent, view.offer_id, UserId::new())
        .await
        .unwrap();
    service
        .claim_slot(parent, view.offer_id, UserId::new())
        .await
        .unwrap();

    let finalized = service
        .finalize(
            parent,
            view.offer_id,
            host,
            TicketSettlement::even(Money::from_cents(10_001)),
        )
        .await
        .unwrap();

    let mut amounts: Vec<u64> = finalized
        .outcome
        .unwrap()
        .shares
        .iter()
        .map(|share| share.amount.cents())
        .collect();
    amounts.sort_unstable();
    assert_eq!(amounts, vec![5000, 5001]);
}

#[tokio::test]
async fn explicit_shares_flow() {
    let (service, _) = open_service();
    let parent = ParentId::new();
    let host = UserId::new();
    let alice = UserId::new();
    let bob = UserId::new();

    let view = service
        .open_offer(parent, host, Capacity::new(2), TicketDetails::default())
        .await
        .unwrap();
    service.claim_slot(parent, view.offer_id, alice).await.unwrap();
    service.claim_slot(parent, view.offer_id, bob).await.unwrap();

    // shares that do not sum to the total are rejected, offer stays open
    let result = service
        .finalize(
            parent,
            view.offer_id,
            host,
            TicketSettlement {
                total_price: Money::from_cents(9000),
                shares: Some(vec![
                    ParticipantShare {
                        user_id: alice,
                        amount: Money::from_cents(1000),
                    },
                    ParticipantShare {
                        user_id: bob,
                        amount: Money::from_cents(1000),
                    },
                ]),
            },
        )
        .await;
    assert!(matches!(result, Err(ClaimError::Validation(_))));
    let state = service.offer(parent, view.offer_id, host).await.unwrap();
    assert_eq!(state.status, OfferStatus::Collecting);

    // valid explicit shares settle
    let finalized = service
        .finalize(
            parent,
            view.offer_id,
            host,
            TicketSettlement {
                total_price: Money::from_cents(9000),
                shares: Some(vec![
                    ParticipantShare {
                        user_id: alice,
                        amount: Money::from_cents(6000),
                    },
                    ParticipantShare {
                        user_id: bob,
                        amount: Money::from_cents(3000),
                    },
                ]),
            },
        )
        .await
        .unwrap();

    let outcome = finalized.outcome.unwrap();
    let alice_share = outcome
        .shares
        .iter()
        .find(|share| share.user_id == alice)
        .unwrap();
    assert_eq!(alice_share.amount, Money::from_cents(6000));
}

#[tokio::test]
async fn capacity_updates_respect_existing_claims() {
    let (service, _) = open_service();
    let parent = ParentId::new();
    let host = UserId::new();

    let view = service
        .open_offer(parent, host, Capacity::new(4), TicketDetails::default())
        .await
        .unwrap();
    service
        .claim_slot(parent, view.offer_id, UserId::new())
        .await
        .unwrap();
    service
        .claim_slot(parent, view.offer_id, UserId::new())
        .await
        .unwrap();

    let result = service
        .set_capacity(parent, view.offer_id, host, Capacity::new(1))
        .await;
    assert!(matches!(result, Err(ClaimError::Validation(_))));

    let resized = service
        .set_capacity(parent, view.offer_id, host, Capacity::new(2))
        .await
        .unwrap();
    assert_eq!(resized.capacity, 2);
    assert_eq!(resized.remaining, 0);
}

#[tokio::test]
async fn cancelled_offers_stop_accepting_claims() {
    let (service, _) = open_service();
    let parent = ParentId::new();
    let host = UserId::new();

    let view = service
        .open_offer(parent, host, Capacity::new(2), TicketDetails::default())
        .await
        .unwrap();

    service.cancel_offer(parent, view.offer_id, host).await.unwrap();
    // cancelling again stays a success
    service.cancel_offer(parent, view.offer_id, host).await.unwrap();

    let result = service.claim_slot(parent, view.offer_id, UserId::new()).await;
    assert!(matches!(result, Err(ClaimError::OfferNotCollecting { .. })));

    service.delete_offer(parent, view.offer_id, host).await.unwrap();
    let result = service.offer(parent, view.offer_id, host).await;
    assert!(matches!(result, Err(ClaimError::NotFound { .. })));
}
