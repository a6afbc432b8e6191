//! Collaborator traits for identity lookups.
//!
//! The engine never resolves display identity and the façades never parse
//! tokens; both consume these read-side lookups, injected as trait objects.
//! Returns are `Pin<Box<dyn Future>>` so the traits stay dyn-compatible.

use crate::ids::{ParentId, UserId};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors from directory lookups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// The lookup could not be performed.
    #[error("directory lookup failed: {0}")]
    Lookup(String),
}

/// Caller-facing display fields resolved by the user-profile collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserProfile {
    /// The user the profile belongs to.
    pub user_id: UserId,
    /// Display name shown next to a claim.
    pub display_name: String,
    /// Avatar path, when the user has uploaded one.
    pub avatar_path: Option<String>,
}

impl UserProfile {
    /// Fallback profile used when the directory has no entry (or is down):
    /// the user id doubles as the display name, enrichment degrades instead
    /// of failing the committed operation.
    #[must_use]
    pub fn placeholder(user_id: UserId) -> Self {
        Self {
            user_id,
            display_name: user_id.to_string(),
            avatar_path: None,
        }
    }
}

/// User-profile lookup for display enrichment.
pub trait ProfileDirectory: Send + Sync {
    /// Resolve the display profile for a user.
    ///
    /// Returns `None` for unknown users.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Lookup`] when the backing service fails.
    fn profile(
        &self,
        user_id: UserId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<UserProfile>, DirectoryError>> + Send + '_>>;
}

/// Membership check for the owning group/event.
///
/// Façades call this before invoking the engine; the engine itself performs
/// no membership checks.
pub trait GroupDirectory: Send + Sync {
    /// Whether `user_id` belongs to the group that owns `parent_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Lookup`] when the backing service fails.
    fn is_member(
        &self,
        parent_id: ParentId,
        user_id: UserId,
    ) -> Pin<Box<dyn Future<Output = Result<bool, DirectoryError>> + Send + '_>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_uses_the_id_as_display_name() {
        let user_id = UserId::new();
        let profile = UserProfile::placeholder(user_id);
        assert_eq!(profile.display_name, user_id.to_string());
        assert!(profile.avatar_path.is_none());
    }
}
