//! Issue/return/loss reconciliation for one item within one event.

use serde::{Deserialize, Serialize};

use jamaat_core::{DomainError, DomainResult, EventId, ItemId};

use crate::entry::{InventoryAction, InventoryLogEntry};

/// Upstream data that over-accounts for what was issued.
///
/// This is reported, not raised: the snapshot is still usable, but inventory
/// views should show it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataInconsistency {
    /// More came back than went out.
    OverReturn { excess: u64 },
    /// Returns plus outstanding losses exceed what went out.
    OverLoss { excess: u64 },
    /// More was recovered than was ever reported lost.
    ExcessRecovery { excess: u64 },
}

/// Canonical reconciliation of one (event, item) pair. Derived, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationSnapshot {
    pub issued: u64,
    /// Returns plus recoveries.
    pub returned_effective: u64,
    /// Losses not yet offset by a recovery.
    pub lost_effective: u64,
    /// Issued but neither returned nor written off. Never negative.
    pub deficit: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inconsistencies: Vec<DataInconsistency>,
}

impl ReconciliationSnapshot {
    pub fn is_consistent(&self) -> bool {
        self.inconsistencies.is_empty()
    }

    /// Everything issued is accounted for.
    pub fn is_settled(&self) -> bool {
        self.deficit == 0
    }
}

/// Running totals for one (event, item) pair.
///
/// Accumulates entries in any order; [`InventoryLedger::snapshot`] derives the
/// reconciliation from the totals alone, so order never matters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryLedger {
    event_id: EventId,
    item_id: ItemId,
    issued: u64,
    returned: u64,
    lost: u64,
    recovered: u64,
    entries: u64,
}

impl InventoryLedger {
    pub fn new(event_id: EventId, item_id: ItemId) -> Self {
        Self {
            event_id,
            item_id,
            issued: 0,
            returned: 0,
            lost: 0,
            recovered: 0,
            entries: 0,
        }
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    /// Number of entries recorded so far.
    pub fn len(&self) -> u64 {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Add one entry to the running totals.
    ///
    /// Rejects entries for another event or item, and negative quantities. A
    /// rejected entry leaves the totals untouched.
    pub fn record(&mut self, entry: &InventoryLogEntry) -> DomainResult<()> {
        if entry.event_id != self.event_id || entry.item_id != self.item_id {
            return Err(DomainError::invalid_log_entry(
                entry,
                format!(
                    "entry belongs to event {} / item {}, expected event {} / item {}",
                    entry.event_id, entry.item_id, self.event_id, self.item_id
                ),
            ));
        }
        let quantity = entry.checked_quantity()?;

        let total = match entry.action {
            InventoryAction::Issue => &mut self.issued,
            InventoryAction::Return => &mut self.returned,
            InventoryAction::Loss => &mut self.lost,
            InventoryAction::Recovery => &mut self.recovered,
        };
        *total = total.saturating_add(quantity);
        self.entries += 1;
        Ok(())
    }

    pub fn snapshot(&self) -> ReconciliationSnapshot {
        let returned_effective = self.returned.saturating_add(self.recovered);
        let lost_effective = self.lost.saturating_sub(self.recovered);
        let accounted = returned_effective.saturating_add(lost_effective);
        let deficit = self.issued.saturating_sub(accounted);

        let mut inconsistencies = Vec::new();
        if returned_effective > self.issued {
            inconsistencies.push(DataInconsistency::OverReturn {
                excess: returned_effective - self.issued,
            });
        } else if accounted > self.issued {
            inconsistencies.push(DataInconsistency::OverLoss {
                excess: accounted - self.issued,
            });
        }
        if self.recovered > self.lost {
            inconsistencies.push(DataInconsistency::ExcessRecovery {
                excess: self.recovered - self.lost,
            });
        }

        ReconciliationSnapshot {
            issued: self.issued,
            returned_effective,
            lost_effective,
            deficit,
            inconsistencies,
        }
    }
}

/// Reduce the log entries of a single (event, item) pair to a snapshot.
///
/// The pair is taken from the first entry; an empty slice reconciles to zeros.
pub fn reconcile(entries: &[InventoryLogEntry]) -> DomainResult<ReconciliationSnapshot> {
    let Some(first) = entries.first() else {
        return Ok(ReconciliationSnapshot::default());
    };

    let mut ledger = InventoryLedger::new(first.event_id, first.item_id);
    for entry in entries {
        ledger.record(entry)?;
    }
    Ok(ledger.snapshot())
}
