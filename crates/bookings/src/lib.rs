//! Booking rules.
//!
//! Hall/time conflict classification for new and edited bookings, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod booking;
pub mod conflict;

pub use booking::{Booking, BookingStatus, Candidate, parse_occasion_time};
pub use conflict::{ConflictResult, DEFAULT_BUFFER_MINUTES, check_conflict};
