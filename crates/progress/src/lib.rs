//! Event lifecycle stage derivation.
//!
//! Maps an event's date, booking status, and inventory reconciliation to the
//! stage shown on the event stepper. Pure: `now` is always passed in.

pub mod stage;

pub use stage::{
    ProgressState, SettlementInfo, SettlementPolicy, Stage, derive_progress, derive_progress_with,
};
