//! # Stats Periods
//!
//! Calendar windows for the day-stats report.
//!
//! ## Window Shape
//! ```text
//! period = 3days, today = Wed
//!
//!   Mon 00:00        Tue 00:00        Wed 00:00        Thu 00:00
//!      │                │   ┌────────────────────────────────┐
//!      │                │   │  first_day          end (excl) │
//!      │                │   ▼                                ▼
//!  ────┼────────────────┼────●═══════════════════════════════○────
//!                            Tue 00:00 local        Thu 00:00 local
//! ```
//!
//! The window covers whole local calendar days: today and the `n - 1`
//! preceding days. The store side converts the two local midnights to UTC
//! before querying.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

/// Report period selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum StatsPeriod {
    #[default]
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "3days")]
    ThreeDays,
    #[serde(rename = "7days")]
    SevenDays,
}

impl StatsPeriod {
    /// Parses a query value, falling back to `Today` for anything unknown
    /// (including a missing value).
    ///
    /// ```rust
    /// use tally_core::period::StatsPeriod;
    ///
    /// assert_eq!(StatsPeriod::parse_lenient(Some("7days")), StatsPeriod::SevenDays);
    /// assert_eq!(StatsPeriod::parse_lenient(Some("fortnight")), StatsPeriod::Today);
    /// assert_eq!(StatsPeriod::parse_lenient(None), StatsPeriod::Today);
    /// ```
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("3days") => StatsPeriod::ThreeDays,
            Some("7days") => StatsPeriod::SevenDays,
            _ => StatsPeriod::Today,
        }
    }

    /// Number of calendar days covered, today included.
    pub const fn days(&self) -> u64 {
        match self {
            StatsPeriod::Today => 1,
            StatsPeriod::ThreeDays => 3,
            StatsPeriod::SevenDays => 7,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            StatsPeriod::Today => "today",
            StatsPeriod::ThreeDays => "3days",
            StatsPeriod::SevenDays => "7days",
        }
    }

    /// Returns the local-day window ending with `today`.
    pub fn window(&self, today: NaiveDate) -> DayWindow {
        let first_day = today
            .checked_sub_days(Days::new(self.days() - 1))
            .unwrap_or(NaiveDate::MIN);
        let end_exclusive = today
            .checked_add_days(Days::new(1))
            .unwrap_or(NaiveDate::MAX);
        DayWindow {
            first_day,
            end_exclusive,
        }
    }
}

impl fmt::Display for StatsPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open range of local calendar days `[first_day, end_exclusive)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub first_day: NaiveDate,
    pub end_exclusive: NaiveDate,
}

/// Aggregated sales over a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DayStats {
    pub total_sales: Money,
    pub order_count: i64,
}
