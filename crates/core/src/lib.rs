//! `jamaat-core` — shared building blocks for the booking and inventory rules.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod clock;
pub mod error;
pub mod id;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{DomainError, DomainResult};
pub use id::{BookingId, EventId, HallId, ItemId};
