//! Normalisation of persisted inventory log rows.
//!
//! Rows written by different screens disagree on shape: the action is free
//! text, and the quantity sits either at the top level or under
//! `details.quantity`. Everything is funnelled into [`InventoryLogEntry`] here
//! so the ledger only ever sees one shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use jamaat_core::{DomainError, EventId, ItemId};

use crate::entry::{InventoryAction, InventoryLogEntry};

/// A log row as stored, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLogEntry {
    pub event_id: EventId,
    pub item_id: ItemId,
    pub action: String,
    #[serde(default)]
    pub quantity: Option<JsonValue>,
    #[serde(default)]
    pub details: Option<RawLogDetails>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLogDetails {
    #[serde(default)]
    pub quantity: Option<JsonValue>,
}

impl RawLogEntry {
    /// `details.quantity` wins over the top-level field, except that a zero in
    /// `details` defers to a top-level value when one is present.
    fn quantity_value(&self) -> Option<&JsonValue> {
        let detailed = self
            .details
            .as_ref()
            .and_then(|d| d.quantity.as_ref())
            .filter(|v| !v.is_null());
        let top_level = self.quantity.as_ref().filter(|v| !v.is_null());

        match detailed {
            Some(v) if parse_quantity(v) == Some(0) => top_level.or(Some(v)),
            Some(v) => Some(v),
            None => top_level,
        }
    }
}

/// Quantities arrive as JSON numbers or numeric strings.
fn parse_quantity(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl TryFrom<RawLogEntry> for InventoryLogEntry {
    type Error = DomainError;

    fn try_from(raw: RawLogEntry) -> Result<Self, Self::Error> {
        let action: InventoryAction = raw
            .action
            .parse()
            .map_err(|_| DomainError::invalid_log_entry(&raw, "unrecognised action"))?;

        let quantity = match raw.quantity_value() {
            None => return Err(DomainError::invalid_log_entry(&raw, "quantity is missing")),
            Some(v) => parse_quantity(v)
                .ok_or_else(|| DomainError::invalid_log_entry(&raw, "quantity is not an integer"))?,
        };
        if quantity < 0 {
            return Err(DomainError::invalid_log_entry(&raw, "quantity cannot be negative"));
        }

        Ok(InventoryLogEntry::new(
            raw.event_id,
            raw.item_id,
            action,
            quantity,
            raw.timestamp,
        ))
    }
}

/// Normalise a batch of rows, stopping at the first rejected row.
pub fn normalize(rows: impl IntoIterator<Item = RawLogEntry>) -> Result<Vec<InventoryLogEntry>, DomainError> {
    rows.into_iter().map(InventoryLogEntry::try_from).collect()
}
