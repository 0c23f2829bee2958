use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use jamaat_bookings::{Booking, BookingStatus, Candidate, ConflictResult, check_conflict};
use jamaat_core::{Clock, DomainResult, EventId, SystemClock};
use jamaat_inventory::{
    EventReconciliation, InventoryLogEntry, RawLogEntry, ReconciliationSnapshot, normalize,
    reconcile, reconcile_event,
};
use jamaat_progress::{ProgressState, derive_progress_with};

use crate::config::RulesConfig;

/// The parts of an event record the stepper needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventHeader {
    pub event_id: EventId,
    pub occasion_date: Option<NaiveDate>,
    pub status: BookingStatus,
}

/// Everything an inventory/event view shows for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventOverview {
    pub event_id: EventId,
    pub reconciliation: EventReconciliation,
    pub progress: ProgressState,
    pub evaluated_at: NaiveDateTime,
}

impl EventOverview {
    /// Bad inventory data, or inventory out before the occasion day.
    pub fn needs_attention(&self) -> bool {
        self.reconciliation.has_inconsistency() || self.progress.issued_ahead_of_occasion()
    }
}

/// Applies the rules under one configuration and clock.
#[derive(Debug, Clone)]
pub struct RulesEngine<C = SystemClock> {
    config: RulesConfig,
    clock: C,
}

impl RulesEngine<SystemClock> {
    pub fn new(config: RulesConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }

    /// Process start-up: logging, then configuration from the environment.
    pub fn bootstrap() -> anyhow::Result<Self> {
        jamaat_observability::init();
        let config = RulesConfig::from_env()?;
        tracing::info!(
            conflict_buffer_minutes = config.conflict_buffer_minutes,
            auto_settle_after_hours = config.auto_settle_after_hours,
            "rules engine configured"
        );
        Ok(Self::new(config))
    }
}

impl<C: Clock> RulesEngine<C> {
    pub fn with_clock(config: RulesConfig, clock: C) -> Self {
        Self { config, clock }
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    /// Conflict check for a booking form submission.
    #[tracing::instrument(
        skip_all,
        fields(date = %candidate.date, halls = candidate.halls.len(), existing = existing.len())
    )]
    pub fn check_booking(
        &self,
        candidate: &Candidate,
        existing: &[Booking],
    ) -> DomainResult<ConflictResult> {
        let result = check_conflict(candidate, existing, self.config.conflict_buffer_minutes);

        match &result {
            Ok(ConflictResult::None) => tracing::debug!("no conflict"),
            Ok(ConflictResult::Soft { occupied_halls, .. }) => {
                tracing::info!(occupied = occupied_halls.len(), "soft booking conflict")
            }
            Ok(ConflictResult::Hard { message }) => tracing::info!(%message, "hard booking conflict"),
            Err(err) => tracing::warn!(error = %err, "booking rejected"),
        }
        result
    }

    /// Reconcile one item of one event.
    pub fn reconcile_item(&self, entries: &[InventoryLogEntry]) -> DomainResult<ReconciliationSnapshot> {
        let snapshot = reconcile(entries).inspect_err(|err| {
            tracing::warn!(error = %err, "inventory log rejected");
        })?;

        if !snapshot.is_consistent() {
            tracing::warn!(
                inconsistencies = ?snapshot.inconsistencies,
                "inventory log over-accounts for issued quantity"
            );
        }
        Ok(snapshot)
    }

    /// Reconcile every item of an event and derive its stage as of the engine's clock.
    #[tracing::instrument(skip_all, fields(event_id = %header.event_id, entries = entries.len()))]
    pub fn event_overview(
        &self,
        header: &EventHeader,
        entries: &[InventoryLogEntry],
    ) -> DomainResult<EventOverview> {
        let reconciliation = reconcile_event(header.event_id, entries).inspect_err(|err| {
            tracing::warn!(error = %err, "inventory log rejected");
        })?;

        let now = self.clock.now();
        let progress = derive_progress_with(
            self.config.settlement_policy(),
            header.occasion_date,
            header.status,
            reconciliation.aggregate_issued(),
            reconciliation.aggregate_deficit(),
            now,
        )?;

        let overview = EventOverview {
            event_id: header.event_id,
            reconciliation,
            progress,
            evaluated_at: now,
        };

        if overview.needs_attention() {
            tracing::warn!(stage = %overview.progress.stage, "event needs attention");
        } else {
            tracing::debug!(stage = %overview.progress.stage, "event evaluated");
        }
        Ok(overview)
    }

    /// [`Self::event_overview`] over rows as persisted, normalising them first.
    pub fn event_overview_from_rows(
        &self,
        header: &EventHeader,
        rows: Vec<RawLogEntry>,
    ) -> DomainResult<EventOverview> {
        let entries = normalize(rows)?;
        self.event_overview(header, &entries)
    }
}
