use core::cmp::Ordering;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use jamaat_bookings::BookingStatus;
use jamaat_core::{DomainError, DomainResult};

/// Lifecycle stage of an event, in stepper order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    /// Booked; nothing issued yet.
    Booked,
    /// Inventory issued ahead of the occasion date.
    Dispatched,
    /// Occasion day with inventory out.
    Active,
    /// After the occasion day, inventory still coming back.
    Returning,
    /// Terminal.
    Settled,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Booked => "Booked",
            Stage::Dispatched => "Dispatched",
            Stage::Active => "Active",
            Stage::Returning => "Returning",
            Stage::Settled => "Settled",
        }
    }
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// How (or when) an event settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementInfo {
    /// The booking was marked completed.
    Completed,
    /// Settled automatically once the auto-settle window elapsed.
    AutoSettled { at: NaiveDateTime },
    /// Everything issued has been returned or written off.
    InventoryMatch,
    /// Whole hours left before auto-settlement.
    SettlesIn { hours: i64 },
    /// Less than an hour left before auto-settlement.
    SettlingSoon,
}

impl core::fmt::Display for SettlementInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SettlementInfo::Completed => f.write_str("Settled: Marked Completed"),
            SettlementInfo::AutoSettled { at } => {
                write!(f, "Auto-settled: {}", at.format("%Y-%m-%d %H:%M"))
            }
            SettlementInfo::InventoryMatch => f.write_str("Settled: Inventory Match"),
            SettlementInfo::SettlesIn { hours } => write!(f, "Auto-settles in {hours}h"),
            SettlementInfo::SettlingSoon => f.write_str("Settling soon"),
        }
    }
}

/// Derived progress of one event. Computed fresh, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    pub stage: Stage,
    pub settlement: Option<SettlementInfo>,
}

impl ProgressState {
    fn new(stage: Stage, settlement: Option<SettlementInfo>) -> Self {
        Self { stage, settlement }
    }

    pub fn is_settled(&self) -> bool {
        self.stage == Stage::Settled
    }

    /// Inventory went out before the occasion day.
    pub fn issued_ahead_of_occasion(&self) -> bool {
        self.stage == Stage::Dispatched
    }
}

/// When an unsettled event settles on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPolicy {
    /// Hours after the start of the occasion date.
    pub auto_settle_after_hours: u32,
}

impl Default for SettlementPolicy {
    fn default() -> Self {
        Self {
            auto_settle_after_hours: 48,
        }
    }
}

/// [`derive_progress_with`] under the default 48-hour policy.
pub fn derive_progress(
    occasion_date: Option<NaiveDate>,
    status: BookingStatus,
    aggregate_issued: u64,
    aggregate_deficit: u64,
    now: NaiveDateTime,
) -> DomainResult<ProgressState> {
    derive_progress_with(
        SettlementPolicy::default(),
        occasion_date,
        status,
        aggregate_issued,
        aggregate_deficit,
        now,
    )
}

/// Derive the stage of an event.
///
/// Rules, first match wins:
/// 1. completed booking: settled
/// 2. past the auto-settle window (measured from midnight of the occasion date): settled
/// 3. nothing issued: booked
/// 4. issued: active on the day, returning after it, dispatched before it;
///    returning with no deficit is settled
pub fn derive_progress_with(
    policy: SettlementPolicy,
    occasion_date: Option<NaiveDate>,
    status: BookingStatus,
    aggregate_issued: u64,
    aggregate_deficit: u64,
    now: NaiveDateTime,
) -> DomainResult<ProgressState> {
    let date = occasion_date.ok_or_else(|| DomainError::invalid_input("occasion date is missing"))?;

    if status == BookingStatus::Completed {
        return Ok(ProgressState::new(Stage::Settled, Some(SettlementInfo::Completed)));
    }

    let start = date.and_time(NaiveTime::MIN);
    let window = Duration::hours(i64::from(policy.auto_settle_after_hours));
    let deadline = start.checked_add_signed(window).ok_or_else(|| {
        DomainError::invalid_input(format!(
            "auto-settle deadline for {date} is out of the supported date range"
        ))
    })?;

    if now - start > window {
        return Ok(ProgressState::new(
            Stage::Settled,
            Some(SettlementInfo::AutoSettled { at: deadline }),
        ));
    }

    if aggregate_issued == 0 {
        return Ok(ProgressState::new(Stage::Booked, None));
    }

    let stage = match now.date().cmp(&date) {
        Ordering::Equal => Stage::Active,
        Ordering::Greater => Stage::Returning,
        Ordering::Less => Stage::Dispatched,
    };

    if stage >= Stage::Returning && aggregate_deficit == 0 {
        return Ok(ProgressState::new(
            Stage::Settled,
            Some(SettlementInfo::InventoryMatch),
        ));
    }

    let settlement = match stage {
        Stage::Active | Stage::Returning => {
            let hours = (deadline - now).num_hours().max(0);
            Some(if hours == 0 {
                SettlementInfo::SettlingSoon
            } else {
                SettlementInfo::SettlesIn { hours }
            })
        }
        _ => None,
    };

    Ok(ProgressState::new(stage, settlement))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn occasion() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn derive(issued: u64, deficit: u64, now: NaiveDateTime) -> ProgressState {
        derive_progress(Some(occasion()), BookingStatus::Scheduled, issued, deficit, now).unwrap()
    }

    #[test]
    fn same_day_with_deficit_is_active() {
        let state = derive(50, 10, at(10, 20, 0));
        assert_eq!(state.stage, Stage::Active);
        assert_eq!(state.settlement, Some(SettlementInfo::SettlesIn { hours: 28 }));
        assert_eq!(state.settlement.unwrap().to_string(), "Auto-settles in 28h");
    }

    #[test]
    fn next_day_without_deficit_settles_on_inventory_match() {
        let state = derive(50, 0, at(11, 9, 0));
        assert_eq!(state.stage, Stage::Settled);
        assert_eq!(
            state.settlement.unwrap().to_string(),
            "Settled: Inventory Match"
        );
    }

    #[test]
    fn same_day_without_deficit_stays_active() {
        let state = derive(50, 0, at(10, 23, 0));
        assert_eq!(state.stage, Stage::Active);
    }

    #[test]
    fn next_day_with_deficit_is_returning() {
        let state = derive(50, 4, at(11, 12, 0));
        assert_eq!(state.stage, Stage::Returning);
        assert_eq!(state.settlement, Some(SettlementInfo::SettlesIn { hours: 12 }));
    }

    #[test]
    fn last_hour_before_deadline_is_settling_soon() {
        let state = derive(50, 4, at(11, 23, 30));
        assert_eq!(state.stage, Stage::Returning);
        assert_eq!(state.settlement, Some(SettlementInfo::SettlingSoon));
    }

    #[test]
    fn exactly_at_deadline_is_not_yet_auto_settled() {
        let state = derive(50, 4, at(12, 0, 0));
        assert_eq!(state.stage, Stage::Returning);
        assert_eq!(state.settlement, Some(SettlementInfo::SettlingSoon));
    }

    #[test]
    fn forty_nine_hours_later_auto_settles_at_forty_eight() {
        let state = derive(50, 4, at(12, 1, 0));
        assert_eq!(state.stage, Stage::Settled);
        assert_eq!(
            state.settlement,
            Some(SettlementInfo::AutoSettled { at: at(12, 0, 0) })
        );
        assert_eq!(
            state.settlement.unwrap().to_string(),
            "Auto-settled: 2024-01-12 00:00"
        );
    }

    #[test]
    fn nothing_issued_is_booked() {
        let state = derive(0, 0, at(10, 12, 0));
        assert_eq!(state.stage, Stage::Booked);
        assert_eq!(state.settlement, None);
    }

    #[test]
    fn issuing_before_the_day_is_dispatched_and_flagged() {
        let state = derive(50, 50, at(9, 18, 0));
        assert_eq!(state.stage, Stage::Dispatched);
        assert!(state.issued_ahead_of_occasion());
        assert_eq!(state.settlement, None);

        // A clean reconciliation ahead of the day does not settle it.
        let state = derive(50, 0, at(9, 18, 0));
        assert_eq!(state.stage, Stage::Dispatched);
    }

    #[test]
    fn missing_occasion_date_is_invalid_input() {
        let err = derive_progress(None, BookingStatus::Scheduled, 0, 0, at(10, 0, 0)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn deadline_past_the_calendar_is_invalid_input() {
        let now = NaiveDate::MAX.and_hms_opt(12, 0, 0).unwrap();
        let err = derive_progress(Some(NaiveDate::MAX), BookingStatus::Scheduled, 5, 5, now)
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));

        let policy = SettlementPolicy {
            auto_settle_after_hours: u32::MAX,
        };
        let err = derive_progress_with(
            policy,
            Some(occasion()),
            BookingStatus::Scheduled,
            5,
            5,
            at(10, 12, 0),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn completed_settles_even_at_the_end_of_the_calendar() {
        let now = NaiveDate::MAX.and_hms_opt(12, 0, 0).unwrap();
        let state =
            derive_progress(Some(NaiveDate::MAX), BookingStatus::Completed, 5, 5, now).unwrap();
        assert_eq!(state.settlement, Some(SettlementInfo::Completed));
    }

    #[test]
    fn custom_policy_moves_the_deadline() {
        let policy = SettlementPolicy {
            auto_settle_after_hours: 24,
        };
        let state = derive_progress_with(
            policy,
            Some(occasion()),
            BookingStatus::Scheduled,
            50,
            4,
            at(11, 1, 0),
        )
        .unwrap();
        assert_eq!(
            state.settlement,
            Some(SettlementInfo::AutoSettled { at: at(11, 0, 0) })
        );
    }

    #[test]
    fn stages_are_ordered_like_the_stepper() {
        assert!(Stage::Booked < Stage::Dispatched);
        assert!(Stage::Dispatched < Stage::Active);
        assert!(Stage::Active < Stage::Returning);
        assert!(Stage::Returning < Stage::Settled);
        assert_eq!(serde_json::to_string(&Stage::Returning).unwrap(), "\"RETURNING\"");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: a completed booking is settled whatever the dates or counts.
        #[test]
        fn completed_is_always_settled(
            offset_minutes in -100_000i64..100_000,
            issued in any::<u64>(),
            deficit in any::<u64>(),
        ) {
            let now = occasion().and_time(NaiveTime::MIN) + Duration::minutes(offset_minutes);
            let state = derive_progress(Some(occasion()), BookingStatus::Completed, issued, deficit, now).unwrap();
            prop_assert_eq!(state.stage, Stage::Settled);
            prop_assert_eq!(state.settlement, Some(SettlementInfo::Completed));
        }

        /// Property: past the window every non-completed event auto-settles at date + 48h.
        #[test]
        fn past_window_always_auto_settles(
            extra_minutes in 1i64..100_000,
            issued in any::<u64>(),
            deficit in any::<u64>(),
            cancelled in any::<bool>(),
        ) {
            let start = occasion().and_time(NaiveTime::MIN);
            let now = start + Duration::hours(48) + Duration::minutes(extra_minutes);
            let status = if cancelled { BookingStatus::Cancelled } else { BookingStatus::Scheduled };

            let state = derive_progress(Some(occasion()), status, issued, deficit, now).unwrap();
            prop_assert_eq!(state.stage, Stage::Settled);
            prop_assert_eq!(
                state.settlement,
                Some(SettlementInfo::AutoSettled { at: start + Duration::hours(48) })
            );
        }
    }
}
