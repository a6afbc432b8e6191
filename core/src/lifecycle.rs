//! Offer lifecycle state machine.
//!
//! `Collecting` is the only state that accepts claim traffic. `Completed` and
//! `Cancelled` are terminal: once entered, the offer is immutable except for
//! reads, and no transition ever leaves them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of an offer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferStatus {
    /// Open for claims, unclaims, and owner updates (initial state).
    Collecting,
    /// Finalized with a settlement; terminal.
    Completed,
    /// Withdrawn by the owner; terminal.
    Cancelled,
}

impl OfferStatus {
    /// Whether the offer still accepts claims, unclaims, and owner updates.
    #[must_use]
    pub const fn is_collecting(self) -> bool {
        matches!(self, Self::Collecting)
    }

    /// Whether the offer has reached a terminal state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Collecting => "collecting",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_is_the_only_open_state() {
        assert!(OfferStatus::Collecting.is_collecting());
        assert!(!OfferStatus::Completed.is_collecting());
        assert!(!OfferStatus::Cancelled.is_collecting());
    }

    #[test]
    fn terminal_states() {
        assert!(!OfferStatus::Collecting.is_terminal());
        assert!(OfferStatus::Completed.is_terminal());
        assert!(OfferStatus::Cancelled.is_terminal());
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", OfferStatus::Collecting), "collecting");
        assert_eq!(format!("{}", OfferStatus::Completed), "completed");
        assert_eq!(format!("{}", OfferStatus::Cancelled), "cancelled");
    }
}
