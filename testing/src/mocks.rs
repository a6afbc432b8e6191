//! Mock implementations of the claim ledger's collaborator traits.

use chrono::{DateTime, Utc};
use huddle_core::{
    ClaimRecord, ClaimStore, ClaimStoreError, Clock, DirectoryError, GroupDirectory, OfferId,
    OfferRecord, OfferSnapshot, ParentId, ProfileDirectory, UserId, UserProfile, Version,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::RwLock;

/// Fixed clock for deterministic tests
///
/// Always returns the same time, making tests reproducible.
#[derive(Debug, Clone)]
pub struct FixedClock {
    time: DateTime<Utc>,
}

impl FixedClock {
    /// Create a new fixed clock with the given time
    #[must_use]
    pub const fn new(time: DateTime<Utc>) -> Self {
        Self { time }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.time
    }
}

/// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
///
/// # Panics
///
/// This function will panic if the hardcoded timestamp fails to parse,
/// which should never happen in practice.
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_clock() -> FixedClock {
    FixedClock::new(
        DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .expect("hardcoded timestamp should always parse")
            .with_timezone(&Utc),
    )
}

type OfferKey = (ParentId, OfferId);
type OfferEntry = (OfferRecord, BTreeMap<UserId, ClaimRecord>);

/// In-memory claim store: the reference implementation of the `ClaimStore`
/// contract.
///
/// An offer and its claims live in one map entry, so every read is a
/// consistent snapshot and every multi-record write is applied under one
/// critical section — the same atomicity a document store provides with a
/// conditional batch write. The version check makes concurrent writers race
/// exactly as they would against real storage.
///
/// Claims are keyed by user, which makes the `(offer, user)` uniqueness of
/// claims structural, and kept in a `BTreeMap` so listings are deterministic.
#[derive(Debug, Default)]
pub struct InMemoryClaimStore {
    offers: RwLock<HashMap<OfferKey, OfferEntry>>,
}

impl InMemoryClaimStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of offers currently stored.
    pub async fn offer_count(&self) -> usize {
        self.offers.read().await.len()
    }

    fn check_version(stored: &OfferRecord, expected: Version) -> Result<(), ClaimStoreError> {
        if stored.version == expected {
            Ok(())
        } else {
            Err(ClaimStoreError::Conflict {
                expected,
                actual: stored.version,
            })
        }
    }
}

impl ClaimStore for InMemoryClaimStore {
    fn load_snapshot(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<OfferSnapshot>, ClaimStoreError>> + Send + '_>>
    {
        Box::pin(async move {
            let offers = self.offers.read().await;
            Ok(offers
                .get(&(parent_id, offer_id))
                .map(|(offer, claims)| OfferSnapshot {
                    offer: offer.clone(),
                    claims: claims.values().cloned().collect(),
                }))
        })
    }

    fn load_claims(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ClaimRecord>, ClaimStoreError>> + Send + '_>> {
        Box::pin(async move {
            let offers = self.offers.read().await;
            Ok(offers
                .get(&(parent_id, offer_id))
                .map(|(_, claims)| claims.values().cloned().collect())
                .unwrap_or_default())
        })
    }

    fn insert_offer(
        &self,
        offer: OfferRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClaimStoreError>> + Send + '_>> {
        Box::pin(async move {
            let mut offers = self.offers.write().await;
            let key = (offer.parent_id, offer.offer_id);
            if let Some((existing, _)) = offers.get(&key) {
                return Err(ClaimStoreError::Conflict {
                    expected: Version::INITIAL,
                    actual: existing.version,
                });
            }
            offers.insert(key, (offer, BTreeMap::new()));
            Ok(())
        })
    }

    fn write_offer_and_claim(
        &self,
        expected_version: Version,
        offer: OfferRecord,
        claim: ClaimRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClaimStoreError>> + Send + '_>> {
        Box::pin(async move {
            let mut offers = self.offers.write().await;
            let key = (offer.parent_id, offer.offer_id);
            let (stored, claims) = offers.get_mut(&key).ok_or(ClaimStoreError::NotFound)?;
            Self::check_version(stored, expected_version)?;
            *stored = offer;
            claims.insert(claim.user_id, claim);
            Ok(())
        })
    }

    fn write_offer_and_remove_claim(
        &self,
        expected_version: Version,
        offer: OfferRecord,
        user_id: UserId,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClaimStoreError>> + Send + '_>> {
        Box::pin(async move {
            let mut offers = self.offers.write().await;
            let key = (offer.parent_id, offer.offer_id);
            let (stored, claims) = offers.get_mut(&key).ok_or(ClaimStoreError::NotFound)?;
            Self::check_version(stored, expected_version)?;
            *stored = offer;
            claims.remove(&user_id);
            Ok(())
        })
    }

    fn write_offer(
        &self,
        expected_version: Version,
        offer: OfferRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClaimStoreError>> + Send + '_>> {
        Box::pin(async move {
            let mut offers = self.offers.write().await;
            let key = (offer.parent_id, offer.offer_id);
            let (stored, _) = offers.get_mut(&key).ok_or(ClaimStoreError::NotFound)?;
            Self::check_version(stored, expected_version)?;
            *stored = offer;
            Ok(())
        })
    }

    fn write_completed_offer(
        &self,
        expected_version: Version,
        offer: OfferRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClaimStoreError>> + Send + '_>> {
        // Claims are deliberately left in place: completion keeps the
        // historical record of who held a slot.
        self.write_offer(expected_version, offer)
    }

    fn remove_offer(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClaimStoreError>> + Send + '_>> {
        Box::pin(async move {
            let mut offers = self.offers.write().await;
            // claims cascade with the entry; removing an absent offer is fine
            offers.remove(&(parent_id, offer_id));
            Ok(())
        })
    }
}

/// Decorator that fails the first `conflicts` conditional writes with a
/// version conflict before delegating, for exercising the retry budget.
pub struct ConflictInjectingStore {
    inner: Arc<dyn ClaimStore>,
    remaining: AtomicU32,
}

impl ConflictInjectingStore {
    /// Wrap `inner`, injecting `conflicts` failures across the conditional
    /// write methods.
    #[must_use]
    pub fn new(inner: Arc<dyn ClaimStore>, conflicts: u32) -> Self {
        Self {
            inner,
            remaining: AtomicU32::new(conflicts),
        }
    }

    fn take_failure(&self, expected: Version) -> Option<ClaimStoreError> {
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .ok()
            .map(|_| ClaimStoreError::Conflict {
                expected,
                actual: expected.next(),
            })
    }
}

impl ClaimStore for ConflictInjectingStore {
    fn load_snapshot(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<OfferSnapshot>, ClaimStoreError>> + Send + '_>>
    {
        self.inner.load_snapshot(parent_id, offer_id)
    }

    fn load_claims(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ClaimRecord>, ClaimStoreError>> + Send + '_>> {
        self.inner.load_claims(parent_id, offer_id)
    }

    fn insert_offer(
        &self,
        offer: OfferRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClaimStoreError>> + Send + '_>> {
        self.inner.insert_offer(offer)
    }

    fn write_offer_and_claim(
        &self,
        expected_version: Version,
        offer: OfferRecord,
        claim: ClaimRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClaimStoreError>> + Send + '_>> {
        match self.take_failure(expected_version) {
            Some(err) => Box::pin(async move { Err(err) }),
            None => self.inner.write_offer_and_claim(expected_version, offer, claim),
        }
    }

    fn write_offer_and_remove_claim(
        &self,
        expected_version: Version,
        offer: OfferRecord,
        user_id: UserId,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClaimStoreError>> + Send + '_>> {
        match self.take_failure(expected_version) {
            Some(err) => Box::pin(async move { Err(err) }),
            None => self
                .inner
                .write_offer_and_remove_claim(expected_version, offer, user_id),
        }
    }

    fn write_offer(
        &self,
        expected_version: Version,
        offer: OfferRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClaimStoreError>> + Send + '_>> {
        match self.take_failure(expected_version) {
            Some(err) => Box::pin(async move { Err(err) }),
            None => self.inner.write_offer(expected_version, offer),
        }
    }

    fn write_completed_offer(
        &self,
        expected_version: Version,
        offer: OfferRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClaimStoreError>> + Send + '_>> {
        match self.take_failure(expected_version) {
            Some(err) => Box::pin(async move { Err(err) }),
            None => self.inner.write_completed_offer(expected_version, offer),
        }
    }

    fn remove_offer(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClaimStoreError>> + Send + '_>> {
        self.inner.remove_offer(parent_id, offer_id)
    }
}

/// In-memory profile directory.
#[derive(Debug, Default)]
pub struct InMemoryProfileDirectory {
    profiles: RwLock<HashMap<UserId, UserProfile>>,
}

impl InMemoryProfileDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a profile.
    pub async fn insert(&self, profile: UserProfile) {
        self.profiles.write().await.insert(profile.user_id, profile);
    }
}

impl ProfileDirectory for InMemoryProfileDirectory {
    fn profile(
        &self,
        user_id: UserId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<UserProfile>, DirectoryError>> + Send + '_>>
    {
        Box::pin(async move { Ok(self.profiles.read().await.get(&user_id).cloned()) })
    }
}

/// Profile directory that always fails, for exercising enrichment fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingProfileDirectory;

impl ProfileDirectory for FailingProfileDirectory {
    fn profile(
        &self,
        _user_id: UserId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<UserProfile>, DirectoryError>> + Send + '_>>
    {
        Box::pin(async move { Err(DirectoryError::Lookup("profile service is down".to_string())) })
    }
}

/// In-memory group directory with explicit membership.
#[derive(Debug, Default)]
pub struct InMemoryGroupDirectory {
    members: RwLock<HashMap<ParentId, HashSet<UserId>>>,
}

impl InMemoryGroupDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member to a group.
    pub async fn add_member(&self, parent_id: ParentId, user_id: UserId) {
        self.members
            .write()
            .await
            .entry(parent_id)
            .or_default()
            .insert(user_id);
    }
}

impl GroupDirectory for InMemoryGroupDirectory {
    fn is_member(
        &self,
        parent_id: ParentId,
        user_id: UserId,
    ) -> Pin<Box<dyn Future<Output = Result<bool, DirectoryError>> + Send + '_>> {
        Box::pin(async move {
            Ok(self
                .members
                .read()
                .await
                .get(&parent_id)
                .is_some_and(|members| members.contains(&user_id)))
        })
    }
}

/// Group directory where everyone is a member of everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGroupDirectory;

impl GroupDirectory for OpenGroupDirectory {
    fn is_member(
        &self,
        _parent_id: ParentId,
        _user_id: UserId,
    ) -> Pin<Box<dyn Future<Output = Result<bool, DirectoryError>> + Send + '_>> {
        Box::pin(async move { Ok(true) })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_is_fixed() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
    }

    #[tokio::test]
    async fn conflict_injector_fails_exactly_n_writes() {
        let store = ConflictInjectingStore::new(Arc::new(InMemoryClaimStore::new()), 2);
        assert!(store.take_failure(Version::INITIAL).is_some());
        assert!(store.take_failure(Version::INITIAL).is_some());
        assert!(store.take_failure(Version::INITIAL).is_none());
        assert!(store.take_failure(Version::INITIAL).is_none());
    }

    #[tokio::test]
    async fn group_membership() {
        let groups = InMemoryGroupDirectory::new();
        let parent = ParentId::new();
        let user = UserId::new();

        assert!(!groups.is_member(parent, user).await.unwrap());
        groups.add_member(parent, user).await;
        assert!(groups.is_member(parent, user).await.unwrap());
    }
}
