use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use jamaat_core::{DomainError, EventId, ItemId};

/// What happened to a quantity of an item during an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InventoryAction {
    /// Handed out from the store for the event.
    Issue,
    /// Brought back to the store.
    Return,
    /// Written off as lost or broken.
    Loss,
    /// A previously lost quantity was found and brought back.
    Recovery,
}

impl InventoryAction {
    pub fn as_str(self) -> &'static str {
        match self {
            InventoryAction::Issue => "ISSUE",
            InventoryAction::Return => "RETURN",
            InventoryAction::Loss => "LOSS",
            InventoryAction::Recovery => "RECOVERY",
        }
    }
}

impl core::fmt::Display for InventoryAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for InventoryAction {
    type Err = DomainError;

    /// Case-insensitive; also accepts the past-tense labels the log screens use.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ISSUE" | "ISSUED" => Ok(InventoryAction::Issue),
            "RETURN" | "RETURNED" => Ok(InventoryAction::Return),
            "LOSS" | "LOST" => Ok(InventoryAction::Loss),
            "RECOVERY" | "RECOVERED" => Ok(InventoryAction::Recovery),
            _ => Err(DomainError::invalid_input(format!("unknown inventory action: {s:?}"))),
        }
    }
}

/// One immutable inventory movement for an (event, item) pair.
///
/// Entries are append-only facts: a loss is corrected by a later `Recovery`
/// entry, never by editing the `Loss` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryLogEntry {
    pub event_id: EventId,
    pub item_id: ItemId,
    pub action: InventoryAction,
    /// Must be non-negative; signed so malformed rows can be represented and rejected.
    pub quantity: i64,
    /// Display/ordering only; never used in the arithmetic.
    pub timestamp: DateTime<Utc>,
}

impl InventoryLogEntry {
    pub fn new(
        event_id: EventId,
        item_id: ItemId,
        action: InventoryAction,
        quantity: i64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id,
            item_id,
            action,
            quantity,
            timestamp,
        }
    }

    pub(crate) fn checked_quantity(&self) -> Result<u64, DomainError> {
        u64::try_from(self.quantity)
            .map_err(|_| DomainError::invalid_log_entry(self, "quantity cannot be negative"))
    }
}
