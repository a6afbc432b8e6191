//! # Huddle Reservations
//!
//! Ticket/reservation offer façade: a host offers N ticket or seat slots for
//! a hangout, members claim them, and the host finalizes the offer into
//! settled purchases with a price split.
//!
//! The façade owns vocabulary and settlement only. Capacity enforcement,
//! double-claim prevention, lifecycle guards, and conflict retry all live in
//! the shared [`ClaimEngine`](huddle_engine::ClaimEngine); this crate
//! supplies the [`TicketOffer`] kind and translates results into
//! display-enriched views.

pub mod service;
pub mod types;

pub use service::{TicketClaimView, TicketOfferService, TicketOfferView};
pub use types::{ParticipantShare, TicketDetails, TicketOffer, TicketOutcome, TicketSettlement};
