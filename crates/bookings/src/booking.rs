use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use jamaat_core::{BookingId, DomainError, DomainResult, HallId};

/// Lifecycle status of a booking as recorded by the office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Scheduled,
    Cancelled,
    Completed,
}

impl BookingStatus {
    /// A cancelled booking no longer holds its halls.
    pub fn occupies_halls(self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }
}

/// An existing booking, as supplied by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub occasion_date: NaiveDate,
    /// Wall-clock time as entered on the booking form (see [`parse_occasion_time`]).
    pub occasion_time: String,
    pub halls: BTreeSet<HallId>,
    pub status: BookingStatus,
}

/// The booking being created or edited.
///
/// `id` is the booking under edit, or `None` for a new booking. It is never
/// inferred: an edit that leaves it unset will conflict with itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: Option<BookingId>,
    pub date: NaiveDate,
    pub time: String,
    pub halls: BTreeSet<HallId>,
    #[serde(default = "default_status")]
    pub status: BookingStatus,
}

fn default_status() -> BookingStatus {
    BookingStatus::Scheduled
}

impl Candidate {
    /// New (not yet persisted) scheduled booking.
    pub fn new(date: NaiveDate, time: impl Into<String>, halls: impl IntoIterator<Item = HallId>) -> Self {
        Self {
            id: None,
            date,
            time: time.into(),
            halls: halls.into_iter().collect(),
            status: BookingStatus::Scheduled,
        }
    }

    /// Mark this candidate as an edit of `id`.
    pub fn editing(mut self, id: BookingId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_status(mut self, status: BookingStatus) -> Self {
        self.status = status;
        self
    }
}

const TIME_FORMATS: [&str; 4] = ["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M%p"];

/// Parse a booking-form time string.
///
/// Accepts 24-hour `HH:MM` / `HH:MM:SS` and 12-hour `h:MM AM` / `h:MMPM`.
pub fn parse_occasion_time(raw: &str) -> DomainResult<NaiveTime> {
    let normalized = raw.trim().to_ascii_uppercase();
    if normalized.is_empty() {
        return Err(DomainError::invalid_input("occasion time is missing"));
    }

    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&normalized, fmt).ok())
        .ok_or_else(|| DomainError::invalid_input(format!("unrecognised occasion time: {raw:?}")))
}
