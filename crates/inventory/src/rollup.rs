use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use jamaat_core::{DomainError, DomainResult, EventId, ItemId};

use crate::entry::InventoryLogEntry;
use crate::ledger::{InventoryLedger, ReconciliationSnapshot};

/// Per-item reconciliation of every item issued against one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventReconciliation {
    pub event_id: EventId,
    pub items: BTreeMap<ItemId, ReconciliationSnapshot>,
}

impl EventReconciliation {
    pub fn empty(event_id: EventId) -> Self {
        Self {
            event_id,
            items: BTreeMap::new(),
        }
    }

    pub fn aggregate_issued(&self) -> u64 {
        self.items.values().map(|s| s.issued).fold(0, u64::saturating_add)
    }

    pub fn aggregate_deficit(&self) -> u64 {
        self.items.values().map(|s| s.deficit).fold(0, u64::saturating_add)
    }

    /// Items whose log over-accounts for what was issued.
    pub fn inconsistent_items(&self) -> impl Iterator<Item = (&ItemId, &ReconciliationSnapshot)> {
        self.items.iter().filter(|(_, s)| !s.is_consistent())
    }

    pub fn has_inconsistency(&self) -> bool {
        self.inconsistent_items().next().is_some()
    }
}

/// Reconcile all entries of `event_id`, grouped by item.
///
/// Every entry must belong to `event_id`.
pub fn reconcile_event(
    event_id: EventId,
    entries: &[InventoryLogEntry],
) -> DomainResult<EventReconciliation> {
    let mut ledgers: BTreeMap<ItemId, InventoryLedger> = BTreeMap::new();

    for entry in entries {
        if entry.event_id != event_id {
            return Err(DomainError::invalid_log_entry(
                entry,
                format!("entry belongs to event {}, expected {event_id}", entry.event_id),
            ));
        }
        ledgers
            .entry(entry.item_id)
            .or_insert_with(|| InventoryLedger::new(event_id, entry.item_id))
            .record(entry)?;
    }

    Ok(EventReconciliation {
        event_id,
        items: ledgers
            .into_iter()
            .map(|(item_id, ledger)| (item_id, ledger.snapshot()))
            .collect(),
    })
}
