//! Hall/time conflict classification.
//!
//! Two bookings clash when they share a hall on the same date. An identical
//! start time is a hard conflict; a start time inside the buffer window is a
//! soft conflict the office may override.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use jamaat_core::{DomainError, DomainResult, HallId};

use crate::booking::{Booking, Candidate, parse_occasion_time};

/// Minimum gap between two bookings of the same hall before a warning is raised.
pub const DEFAULT_BUFFER_MINUTES: u32 = 120;

/// Outcome of a conflict check. The caller decides whether to block, warn, or proceed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictResult {
    None,
    /// Another booking of a requested hall starts within the buffer window.
    ///
    /// `occupied_halls` and `available_halls` partition the requested halls.
    Soft {
        occupied_halls: BTreeSet<HallId>,
        available_halls: BTreeSet<HallId>,
        message: String,
    },
    /// Another booking holds a requested hall at the exact same time.
    Hard { message: String },
}

impl ConflictResult {
    pub fn is_none(&self) -> bool {
        matches!(self, ConflictResult::None)
    }

    pub fn is_blocking(&self) -> bool {
        matches!(self, ConflictResult::Hard { .. })
    }
}

/// Classify `candidate` against `existing` bookings.
///
/// `existing` may contain bookings from other dates, cancelled bookings, and the
/// candidate's own row; all of those are skipped here. Bookings that remain
/// after filtering must carry a parseable time.
pub fn check_conflict(
    candidate: &Candidate,
    existing: &[Booking],
    buffer_minutes: u32,
) -> DomainResult<ConflictResult> {
    if candidate.halls.is_empty() {
        return Err(DomainError::invalid_input("at least one hall must be selected"));
    }
    let candidate_time = parse_occasion_time(&candidate.time)?;

    if !candidate.status.occupies_halls() {
        return Ok(ConflictResult::None);
    }

    let buffer_secs = i64::from(buffer_minutes) * 60;
    let mut hard_halls: BTreeSet<HallId> = BTreeSet::new();
    let mut soft_halls: BTreeSet<HallId> = BTreeSet::new();
    let mut soft_times: BTreeSet<String> = BTreeSet::new();

    for other in existing.iter().filter(|b| competes_with(candidate, b)) {
        let other_time = parse_occasion_time(&other.occasion_time).map_err(|e| match e {
            DomainError::InvalidInput(msg) => {
                DomainError::invalid_input(format!("existing booking {}: {msg}", other.id))
            }
            e => e,
        })?;

        let gap_secs = (candidate_time - other_time).num_seconds().abs();
        let shared = candidate.halls.intersection(&other.halls).cloned();

        if gap_secs == 0 {
            hard_halls.extend(shared);
        } else if gap_secs < buffer_secs {
            soft_halls.extend(shared);
            soft_times.insert(other_time.format("%H:%M").to_string());
        }
    }

    if !hard_halls.is_empty() {
        return Ok(ConflictResult::Hard {
            message: format!(
                "{} already booked on {} at {}",
                join_halls(&hard_halls),
                candidate.date,
                candidate_time.format("%H:%M"),
            ),
        });
    }

    if soft_halls.is_empty() {
        return Ok(ConflictResult::None);
    }

    let available_halls: BTreeSet<HallId> = candidate.halls.difference(&soft_halls).cloned().collect();
    let mut message = format!(
        "{} has another booking within {} minutes (at {})",
        join_halls(&soft_halls),
        buffer_minutes,
        soft_times.into_iter().collect::<Vec<_>>().join(", "),
    );
    if !available_halls.is_empty() {
        message.push_str(&format!("; still free: {}", join_halls(&available_halls)));
    }

    Ok(ConflictResult::Soft {
        occupied_halls: soft_halls,
        available_halls,
        message,
    })
}

fn competes_with(candidate: &Candidate, other: &Booking) -> bool {
    other.occasion_date == candidate.date
        && other.status.occupies_halls()
        && candidate.id != Some(other.id)
        && !candidate.halls.is_disjoint(&other.halls)
}

fn join_halls(halls: &BTreeSet<HallId>) -> String {
    halls.iter().map(HallId::as_str).collect::<Vec<_>>().join(", ")
}
