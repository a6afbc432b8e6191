//! # Huddle Carpool
//!
//! Carpool seat façade: a driver offers N seats for a hangout, riders claim
//! and release them, and the driver closes the ride when it happens.
//!
//! Same shape as the ticket-offer façade with the driver as the capacity
//! owner; the concurrency-critical path is the shared
//! [`ClaimEngine`](huddle_engine::ClaimEngine). `available_seats` is always
//! derived from the pool (`capacity - claimed`), never stored, so the two
//! numbers cannot drift apart.

pub mod service;
pub mod types;

pub use service::{CarpoolService, RideView, RiderView};
pub use types::{CarDetails, CloseRide, RideOutcome, RiderDetails, SeatOffer};
