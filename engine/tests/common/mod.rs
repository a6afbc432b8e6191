//! Shared offer kind and fixtures for the engine integration tests.

#![allow(dead_code)] // each test binary uses a subset

use huddle_core::{ClaimError, ClaimStore, Offer, OfferKind};
use huddle_engine::ClaimEngine;
use huddle_testing::mocks::{InMemoryClaimStore, test_clock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Minimal kind: bare slots with a label and a fill-count settlement.
#[derive(Clone, Copy, Debug, Default)]
pub struct SlotKind;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDetails {
    pub label: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotOutcome {
    pub filled: u32,
}

impl OfferKind for SlotKind {
    const KIND: &'static str = "test-slot";

    type Details = SlotDetails;
    type Payload = ();
    type Completion = ();
    type Outcome = SlotOutcome;

    fn settle(offer: &Offer<Self>, _input: &()) -> Result<SlotOutcome, ClaimError> {
        Ok(SlotOutcome {
            filled: offer.claimed_count(),
        })
    }
}

/// Engine over a fresh in-memory store and a fixed clock.
pub fn engine() -> ClaimEngine<SlotKind> {
    engine_with_store(Arc::new(InMemoryClaimStore::new()))
}

/// Engine over the given store and a fixed clock.
pub fn engine_with_store(store: Arc<dyn ClaimStore>) -> ClaimEngine<SlotKind> {
    ClaimEngine::new(store, Arc::new(test_clock()))
}
