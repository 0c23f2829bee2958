//! `jamaat-rules` — entry point for applications embedding the booking and
//! inventory rules.
//!
//! Wires configuration, the clock, and logging around the pure rule crates:
//! - [`jamaat_bookings`]: hall/time conflict checks
//! - [`jamaat_inventory`]: issue/return/loss reconciliation
//! - [`jamaat_progress`]: event stepper stage

pub mod config;
pub mod engine;

pub use config::RulesConfig;
pub use engine::{EventHeader, EventOverview, RulesEngine};

pub use jamaat_bookings::{Booking, BookingStatus, Candidate, ConflictResult};
pub use jamaat_core::{
    BookingId, Clock, DomainError, DomainResult, EventId, FixedClock, HallId, ItemId, SystemClock,
};
pub use jamaat_inventory::{
    DataInconsistency, EventReconciliation, InventoryAction, InventoryLogEntry, RawLogEntry,
    ReconciliationSnapshot,
};
pub use jamaat_progress::{ProgressState, SettlementInfo, Stage};
