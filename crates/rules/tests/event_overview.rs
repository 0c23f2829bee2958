use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::json;

use jamaat_rules::{
    BookingStatus, DomainError, EventHeader, EventId, FixedClock, InventoryAction,
    InventoryLogEntry, ItemId, RawLogEntry, RulesConfig, RulesEngine, SettlementInfo, Stage,
};

fn occasion() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
}

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn engine_at(now: NaiveDateTime) -> RulesEngine<FixedClock> {
    jamaat_observability::init();
    RulesEngine::with_clock(RulesConfig::default(), FixedClock(now))
}

fn header(event_id: EventId) -> EventHeader {
    EventHeader {
        event_id,
        occasion_date: Some(occasion()),
        status: BookingStatus::Scheduled,
    }
}

struct Log {
    event_id: EventId,
    entries: Vec<InventoryLogEntry>,
}

impl Log {
    fn new(event_id: EventId) -> Self {
        Self {
            event_id,
            entries: Vec::new(),
        }
    }

    fn push(&mut self, item: ItemId, action: InventoryAction, quantity: i64) -> &mut Self {
        let ts = Utc.with_ymd_and_hms(2024, 1, 10, 17, 0, 0).unwrap();
        self.entries
            .push(InventoryLogEntry::new(self.event_id, item, action, quantity, ts));
        self
    }
}

#[test]
fn occasion_day_with_items_out_is_active() {
    let event_id = EventId::new();
    let thaal = ItemId::new();
    let mut log = Log::new(event_id);
    log.push(thaal, InventoryAction::Issue, 50)
        .push(thaal, InventoryAction::Return, 40);

    let overview = engine_at(at(10, 21))
        .event_overview(&header(event_id), &log.entries)
        .unwrap();

    assert_eq!(overview.reconciliation.aggregate_issued(), 50);
    assert_eq!(overview.reconciliation.aggregate_deficit(), 10);
    assert_eq!(overview.progress.stage, Stage::Active);
    assert_eq!(overview.evaluated_at, at(10, 21));
}

#[test]
fn next_day_full_return_settles_on_inventory_match() {
    let event_id = EventId::new();
    let thaal = ItemId::new();
    let chairs = ItemId::new();
    let mut log = Log::new(event_id);
    log.push(thaal, InventoryAction::Issue, 50)
        .push(chairs, InventoryAction::Issue, 120)
        .push(thaal, InventoryAction::Return, 48)
        .push(thaal, InventoryAction::Loss, 2)
        .push(chairs, InventoryAction::Return, 120);

    let overview = engine_at(at(11, 10))
        .event_overview(&header(event_id), &log.entries)
        .unwrap();

    assert_eq!(overview.progress.stage, Stage::Settled);
    assert_eq!(overview.progress.settlement, Some(SettlementInfo::InventoryMatch));
    assert!(!overview.needs_attention());
}

#[test]
fn over_returned_item_needs_attention() {
    let event_id = EventId::new();
    let degh = ItemId::new();
    let mut log = Log::new(event_id);
    log.push(degh, InventoryAction::Issue, 4)
        .push(degh, InventoryAction::Return, 5);

    let overview = engine_at(at(11, 10))
        .event_overview(&header(event_id), &log.entries)
        .unwrap();

    assert_eq!(overview.reconciliation.items[&degh].deficit, 0);
    assert!(overview.needs_attention());
}

#[test]
fn completed_event_is_settled_even_with_deficit() {
    let event_id = EventId::new();
    let thaal = ItemId::new();
    let mut log = Log::new(event_id);
    log.push(thaal, InventoryAction::Issue, 50);

    let mut completed = header(event_id);
    completed.status = BookingStatus::Completed;

    let overview = engine_at(at(10, 12))
        .event_overview(&completed, &log.entries)
        .unwrap();
    assert_eq!(overview.progress.stage, Stage::Settled);
    assert_eq!(overview.progress.settlement, Some(SettlementInfo::Completed));
}

#[test]
fn missing_occasion_date_is_rejected() {
    let event_id = EventId::new();
    let mut undated = header(event_id);
    undated.occasion_date = None;

    let err = engine_at(at(10, 12)).event_overview(&undated, &[]).unwrap_err();
    assert!(matches!(err, DomainError::InvalidInput(_)));
}

#[test]
fn persisted_rows_are_normalised_before_reconciling() {
    let event_id = EventId::new();
    let thaal = ItemId::new();
    let rows: Vec<RawLogEntry> = serde_json::from_value(json!([
        {
            "eventId": event_id, "itemId": thaal, "action": "ISSUED",
            "details": { "quantity": 30 }, "timestamp": "2024-01-10T12:00:00Z"
        },
        {
            "eventId": event_id, "itemId": thaal, "action": "return",
            "quantity": "25", "timestamp": "2024-01-11T09:00:00Z"
        }
    ]))
    .unwrap();

    let overview = engine_at(at(11, 12))
        .event_overview_from_rows(&header(event_id), rows)
        .unwrap();

    assert_eq!(overview.reconciliation.items[&thaal].deficit, 5);
    assert_eq!(overview.progress.stage, Stage::Returning);
    assert_eq!(
        overview.progress.settlement.map(|s| s.to_string()),
        Some("Auto-settles in 12h".to_string())
    );
}

#[test]
fn bad_row_rejects_the_overview() {
    let event_id = EventId::new();
    let rows: Vec<RawLogEntry> = serde_json::from_value(json!([
        {
            "eventId": event_id, "itemId": ItemId::new(), "action": "ISSUE",
            "quantity": -3, "timestamp": "2024-01-10T12:00:00Z"
        }
    ]))
    .unwrap();

    let err = engine_at(at(10, 12))
        .event_overview_from_rows(&header(event_id), rows)
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidLogEntry { .. }));
}

#[test]
fn overview_serializes_for_the_presentation_layer() {
    let event_id = EventId::new();
    let thaal = ItemId::new();
    let mut log = Log::new(event_id);
    log.push(thaal, InventoryAction::Issue, 10);

    let overview = engine_at(at(10, 20))
        .event_overview(&header(event_id), &log.entries)
        .unwrap();
    let value = serde_json::to_value(&overview).unwrap();

    assert_eq!(value["progress"]["stage"], "ACTIVE");
    assert_eq!(value["progress"]["settlement"]["kind"], "SETTLES_IN");
    assert_eq!(value["reconciliation"]["items"][thaal.to_string()]["deficit"], 10);
}
