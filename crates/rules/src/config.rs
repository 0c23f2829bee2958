//! Rule configuration, read from the environment.

use anyhow::{Context, ensure};
use serde::{Deserialize, Serialize};

use jamaat_bookings::DEFAULT_BUFFER_MINUTES;
use jamaat_progress::SettlementPolicy;

pub const CONFLICT_BUFFER_MINUTES_ENV: &str = "JAMAAT_CONFLICT_BUFFER_MINUTES";
pub const AUTO_SETTLE_HOURS_ENV: &str = "JAMAAT_AUTO_SETTLE_HOURS";

/// Longest accepted auto-settle window: one (leap) year.
pub const MAX_AUTO_SETTLE_HOURS: u32 = 24 * 366;

/// Policy knobs for the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Bookings of the same hall closer than this raise a soft conflict.
    pub conflict_buffer_minutes: u32,
    /// Hours after the start of the occasion date before an event auto-settles.
    pub auto_settle_after_hours: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            conflict_buffer_minutes: DEFAULT_BUFFER_MINUTES,
            auto_settle_after_hours: SettlementPolicy::default().auto_settle_after_hours,
        }
    }
}

impl RulesConfig {
    /// Read `JAMAAT_CONFLICT_BUFFER_MINUTES` and `JAMAAT_AUTO_SETTLE_HOURS`.
    ///
    /// Unset variables keep their defaults; set-but-invalid ones are an error.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let config = Self {
            conflict_buffer_minutes: read_u32(
                &lookup,
                CONFLICT_BUFFER_MINUTES_ENV,
                defaults.conflict_buffer_minutes,
            )?,
            auto_settle_after_hours: read_u32(
                &lookup,
                AUTO_SETTLE_HOURS_ENV,
                defaults.auto_settle_after_hours,
            )?,
        };

        ensure!(
            config.auto_settle_after_hours > 0,
            "{AUTO_SETTLE_HOURS_ENV} must be at least 1"
        );
        ensure!(
            config.auto_settle_after_hours <= MAX_AUTO_SETTLE_HOURS,
            "{AUTO_SETTLE_HOURS_ENV} must be at most {MAX_AUTO_SETTLE_HOURS}, got {}",
            config.auto_settle_after_hours
        );
        Ok(config)
    }

    pub fn settlement_policy(&self) -> SettlementPolicy {
        SettlementPolicy {
            auto_settle_after_hours: self.auto_settle_after_hours,
        }
    }
}

fn read_u32(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u32) -> anyhow::Result<u32> {
    match lookup(key) {
        None => {
            tracing::debug!(key, default, "not set; using default");
            Ok(default)
        }
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a non-negative integer, got {raw:?}")),
    }
}
