//! The claim engine: read-decide-write operations over one offer.
//!
//! Every operation follows the same cycle: load the offer and its claims in
//! one consistent snapshot, validate against the lifecycle and the capacity
//! pool purely in memory, then write back conditioned on the version the
//! snapshot was read at. A conflict means another writer moved the offer
//! first; the cycle is retried from the load with a bounded budget.
//!
//! The engine is written once, generic over [`OfferKind`]; the façades supply
//! vocabulary and settlement semantics through that seam and never touch the
//! concurrency-critical path.

use crate::retry::{RetryPolicy, retry_conflicts};
use huddle_core::{
    Capacity, CapacityPool, Claim, ClaimError, ClaimStore, Clock, Offer, OfferId, OfferKind,
    OfferStatus, ParentId, UserId, Version,
};
use std::marker::PhantomData;
use std::sync::Arc;

/// Engine for one kind of capacity-bounded offer.
///
/// Cheap to clone; holds its collaborators behind `Arc`.
pub struct ClaimEngine<K: OfferKind> {
    store: Arc<dyn ClaimStore>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
    _kind: PhantomData<fn() -> K>,
}

impl<K: OfferKind> Clone for ClaimEngine<K> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            retry: self.retry.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: OfferKind> ClaimEngine<K> {
    /// Creates an engine with the default retry policy.
    #[must_use]
    pub fn new(store: Arc<dyn ClaimStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_policy(store, clock, RetryPolicy::default())
    }

    /// Creates an engine with an explicit retry policy.
    #[must_use]
    pub const fn with_policy(
        store: Arc<dyn ClaimStore>,
        clock: Arc<dyn Clock>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            clock,
            retry,
            _kind: PhantomData,
        }
    }

    /// Create a new offer in `Collecting` state with an empty pool.
    ///
    /// # Errors
    ///
    /// - [`ClaimError::Validation`]: capacity is zero
    /// - [`ClaimError::Store`]: the insert failed
    pub async fn create(
        &self,
        parent_id: ParentId,
        owner_id: UserId,
        capacity: Capacity,
        details: K::Details,
    ) -> Result<Offer<K>, ClaimError> {
        if capacity.value() == 0 {
            return Err(ClaimError::Validation(
                "capacity must be greater than zero".to_string(),
            ));
        }

        let now = self.clock.now();
        let offer = Offer::<K> {
            parent_id,
            offer_id: OfferId::new(),
            owner_id,
            pool: CapacityPool::new(capacity),
            status: OfferStatus::Collecting,
            version: Version::INITIAL,
            details,
            outcome: None,
            claims: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.store.insert_offer(offer.to_record()?).await?;

        tracing::debug!(
            offer_id = %offer.offer_id,
            parent_id = %parent_id,
            kind = K::KIND,
            capacity = capacity.value(),
            "offer created"
        );
        metrics::counter!("claim_ledger_offers_created_total", "kind" => K::KIND).increment(1);

        Ok(offer)
    }

    /// Load the offer and its claims.
    ///
    /// # Errors
    ///
    /// - [`ClaimError::NotFound`]: no such offer
    /// - [`ClaimError::Store`] / [`ClaimError::Codec`]: the read failed
    pub async fn get(&self, parent_id: ParentId, offer_id: OfferId) -> Result<Offer<K>, ClaimError> {
        self.load(parent_id, offer_id).await
    }

    /// Claim one slot for `user_id`.
    ///
    /// Idempotent: a user who already holds a claim gets it back unchanged,
    /// with no capacity movement.
    ///
    /// # Errors
    ///
    /// - [`ClaimError::NotFound`]: no such offer
    /// - [`ClaimError::OfferNotCollecting`]: the offer is terminal
    /// - [`ClaimError::CapacityExceeded`]: the pool is full
    /// - [`ClaimError::Contention`]: the retry budget was exhausted
    pub async fn claim(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        user_id: UserId,
        payload: K::Payload,
    ) -> Result<Claim<K>, ClaimError> {
        retry_conflicts(&self.retry, || {
            self.try_claim(parent_id, offer_id, user_id, payload.clone())
        })
        .await
    }

    /// Release the slot held by `user_id`.
    ///
    /// Idempotent: succeeds as a no-op when the user holds no claim.
    ///
    /// # Errors
    ///
    /// - [`ClaimError::NotFound`]: no such offer
    /// - [`ClaimError::OfferNotCollecting`]: the offer is terminal
    /// - [`ClaimError::Contention`]: the retry budget was exhausted
    pub async fn unclaim(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        user_id: UserId,
    ) -> Result<(), ClaimError> {
        retry_conflicts(&self.retry, || {
            self.try_unclaim(parent_id, offer_id, user_id)
        })
        .await
    }

    /// Complete the offer: compute the terminal settlement and lock it in.
    ///
    /// Owner-only. Claims are retained as the historical record of who held a
    /// slot. Calling `complete` again with input that settles to the same
    /// outcome succeeds idempotently.
    ///
    /// # Errors
    ///
    /// - [`ClaimError::Unauthorized`]: caller is not the owner
    /// - [`ClaimError::OfferNotCollecting`]: cancelled, or completed with a
    ///   different settlement
    /// - [`ClaimError::Validation`]: the input does not fit the claim set
    /// - [`ClaimError::Contention`]: the retry budget was exhausted
    pub async fn complete(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        caller: UserId,
        input: K::Completion,
    ) -> Result<Offer<K>, ClaimError> {
        retry_conflicts(&self.retry, || {
            self.try_complete(parent_id, offer_id, caller, &input)
        })
        .await
    }

    /// Cancel the offer (terminal). Owner-only; a no-op success when the
    /// offer is already terminal.
    ///
    /// # Errors
    ///
    /// - [`ClaimError::NotFound`]: no such offer
    /// - [`ClaimError::Unauthorized`]: caller is not the owner
    /// - [`ClaimError::Contention`]: the retry budget was exhausted
    pub async fn cancel(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        caller: UserId,
    ) -> Result<(), ClaimError> {
        retry_conflicts(&self.retry, || self.try_cancel(parent_id, offer_id, caller)).await
    }

    /// Physically remove the offer and cascade to its claims. Owner-only; a
    /// no-op success when the offer is already gone.
    ///
    /// # Errors
    ///
    /// - [`ClaimError::Unauthorized`]: caller is not the owner
    /// - [`ClaimError::Store`]: the removal failed
    pub async fn delete(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        caller: UserId,
    ) -> Result<(), ClaimError> {
        let offer = match self.load(parent_id, offer_id).await {
            Ok(offer) => offer,
            Err(ClaimError::NotFound { .. }) => return Ok(()),
            Err(err) => return Err(err),
        };
        offer.ensure_owner(caller)?;

        self.store.remove_offer(parent_id, offer_id).await?;
        tracing::debug!(%offer_id, %parent_id, "offer removed with its claims");
        Ok(())
    }

    /// Change the offer's total capacity. Owner-only, `Collecting`-only; a
    /// resize below the current claimed count is rejected, never applied by
    /// truncating claims.
    ///
    /// # Errors
    ///
    /// - [`ClaimError::Unauthorized`]: caller is not the owner
    /// - [`ClaimError::OfferNotCollecting`]: the offer is terminal
    /// - [`ClaimError::Validation`]: `new_capacity` is below the claimed count
    /// - [`ClaimError::Contention`]: the retry budget was exhausted
    pub async fn update_capacity(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        caller: UserId,
        new_capacity: Capacity,
    ) -> Result<Offer<K>, ClaimError> {
        retry_conflicts(&self.retry, || {
            self.try_update_capacity(parent_id, offer_id, caller, new_capacity)
        })
        .await
    }

    /// Replace the offer's feature details (section, notes, ...). Owner-only,
    /// `Collecting`-only.
    ///
    /// # Errors
    ///
    /// Same classes as [`ClaimEngine::update_capacity`], minus the resize
    /// guard.
    pub async fn update_details(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        caller: UserId,
        details: K::Details,
    ) -> Result<Offer<K>, ClaimError> {
        retry_conflicts(&self.retry, || {
            self.try_update_details(parent_id, offer_id, caller, details.clone())
        })
        .await
    }

    // ========== single attempts (one read, one conditional write) ==========

    async fn load(&self, parent_id: ParentId, offer_id: OfferId) -> Result<Offer<K>, ClaimError> {
        let snapshot = self
            .store
            .load_snapshot(parent_id, offer_id)
            .await?
            .ok_or(ClaimError::NotFound {
                parent_id,
                offer_id,
            })?;

        let recorded = snapshot.offer.pool.claimed();
        let observed = u32::try_from(snapshot.claims.len()).unwrap_or(u32::MAX);
        if recorded != observed {
            tracing::warn!(
                %offer_id,
                recorded,
                observed,
                "denormalized claimed count drifted from claim records, trusting the records"
            );
        }

        Offer::from_snapshot(snapshot)
    }

    async fn try_claim(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        user_id: UserId,
        payload: K::Payload,
    ) -> Result<Claim<K>, ClaimError> {
        let offer = self.load(parent_id, offer_id).await?;
        offer.ensure_collecting()?;

        if let Some(existing) = offer.claim_for(user_id) {
            tracing::debug!(%offer_id, %user_id, "claim already held, returning it unchanged");
            return Ok(existing.clone());
        }

        let pool = offer
            .pool
            .try_reserve(1)
            .map_err(ClaimError::from_capacity)?;

        let now = self.clock.now();
        let claim = Claim::<K> {
            user_id,
            payload,
            created_at: now,
            updated_at: now,
        };

        let expected = offer.version;
        let mut updated = offer;
        updated.pool = pool;
        updated.version = expected.next();
        updated.updated_at = now;

        self.store
            .write_offer_and_claim(
                expected,
                updated.to_record()?,
                claim.to_record(parent_id, offer_id)?,
            )
            .await?;

        tracing::debug!(
            %offer_id,
            %user_id,
            claimed = pool.claimed(),
            capacity = pool.total().value(),
            "slot claimed"
        );
        metrics::counter!("claim_ledger_claims_total", "kind" => K::KIND).increment(1);

        Ok(claim)
    }

    async fn try_unclaim(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        user_id: UserId,
    ) -> Result<(), ClaimError> {
        let offer = self.load(parent_id, offer_id).await?;
        offer.ensure_collecting()?;

        if offer.claim_for(user_id).is_none() {
            tracing::debug!(%offer_id, %user_id, "no claim held, unclaim is a no-op");
            return Ok(());
        }

        let pool = offer.pool.release(1);
        let now = self.clock.now();

        let expected = offer.version;
        let mut updated = offer;
        updated.pool = pool;
        updated.version = expected.next();
        updated.updated_at = now;

        self.store
            .write_offer_and_remove_claim(expected, updated.to_record()?, user_id)
            .await?;

        tracing::debug!(%offer_id, %user_id, claimed = pool.claimed(), "slot released");
        metrics::counter!("claim_ledger_releases_total", "kind" => K::KIND).increment(1);

        Ok(())
    }

    async fn try_complete(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        caller: UserId,
        input: &K::Completion,
    ) -> Result<Offer<K>, ClaimError> {
        let offer = self.load(parent_id, offer_id).await?;
        offer.ensure_owner(caller)?;

        match offer.status {
            OfferStatus::Completed => {
                // Safe to re-run after a client timeout: an equal settlement
                // is acknowledged, a different one is rejected.
                let recomputed = K::settle(&offer, input)?;
                if offer.outcome.as_ref() == Some(&recomputed) {
                    tracing::debug!(%offer_id, "offer already completed with an equal settlement");
                    return Ok(offer);
                }
                Err(ClaimError::OfferNotCollecting {
                    status: offer.status,
                })
            }
            OfferStatus::Cancelled => Err(ClaimError::OfferNotCollecting {
                status: offer.status,
            }),
            OfferStatus::Collecting => {
                let outcome = K::settle(&offer, input)?;
                let now = self.clock.now();

                let expected = offer.version;
                let mut updated = offer;
                updated.status = OfferStatus::Completed;
                updated.outcome = Some(outcome);
                updated.version = expected.next();
                updated.updated_at = now;

                self.store
                    .write_completed_offer(expected, updated.to_record()?)
                    .await?;

                tracing::info!(
                    %offer_id,
                    claimed = updated.claimed_count(),
                    "offer completed"
                );
                metrics::counter!("claim_ledger_completions_total", "kind" => K::KIND).increment(1);

                Ok(updated)
            }
        }
    }

    async fn try_cancel(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        caller: UserId,
    ) -> Result<(), ClaimError> {
        let offer = self.load(parent_id, offer_id).await?;
        offer.ensure_owner(caller)?;

        if offer.status.is_terminal() {
            return Ok(());
        }

        let now = self.clock.now();
        let expected = offer.version;
        let mut updated = offer;
        updated.status = OfferStatus::Cancelled;
        updated.version = expected.next();
        updated.updated_at = now;

        self.store.write_offer(expected, updated.to_record()?).await?;

        tracing::info!(%offer_id, "offer cancelled");
        metrics::counter!("claim_ledger_cancellations_total", "kind" => K::KIND).increment(1);

        Ok(())
    }

    async fn try_update_capacity(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        caller: UserId,
        new_capacity: Capacity,
    ) -> Result<Offer<K>, ClaimError> {
        let offer = self.load(parent_id, offer_id).await?;
        offer.ensure_owner(caller)?;
        offer.ensure_collecting()?;

        let pool = offer
            .pool
            .resize(new_capacity)
            .map_err(ClaimError::from_capacity)?;
        let now = self.clock.now();

        let expected = offer.version;
        let mut updated = offer;
        updated.pool = pool;
        updated.version = expected.next();
        updated.updated_at = now;

        self.store.write_offer(expected, updated.to_record()?).await?;

        tracing::debug!(
            %offer_id,
            capacity = new_capacity.value(),
            claimed = pool.claimed(),
            "capacity updated"
        );

        Ok(updated)
    }

    async fn try_update_details(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
        caller: UserId,
        details: K::Details,
    ) -> Result<Offer<K>, ClaimError> {
        let offer = self.load(parent_id, offer_id).await?;
        offer.ensure_owner(caller)?;
        offer.ensure_collecting()?;

        let now = self.clock.now();
        let expected = offer.version;
        let mut updated = offer;
        updated.details = details;
        updated.version = expected.next();
        updated.updated_at = now;

        self.store.write_offer(expected, updated.to_record()?).await?;

        tracing::debug!(%offer_id, "details updated");

        Ok(updated)
    }
}
