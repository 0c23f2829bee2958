//! Inventory reconciliation rules.
//!
//! Issue/return/loss/recovery arithmetic for the physical inventory handed out
//! per event, implemented purely as deterministic domain logic (no IO, no
//! HTTP, no storage).

pub mod entry;
pub mod ledger;
pub mod raw;
pub mod rollup;

pub use entry::{InventoryAction, InventoryLogEntry};
pub use ledger::{DataInconsistency, InventoryLedger, ReconciliationSnapshot, reconcile};
pub use raw::{RawLogDetails, RawLogEntry, normalize};
pub use rollup::{EventReconciliation, reconcile_event};
