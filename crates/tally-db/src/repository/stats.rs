//! # Stats Repository
//!
//! Sales totals over local calendar days.
//!
//! ## Local Days, UTC Storage
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  period=today, store clock UTC+05:00, now = Mar 10 10:00 local          │
//! │                                                                         │
//! │  window (local)   [Mar 10 00:00, Mar 11 00:00)                         │
//! │  window (UTC)     [Mar 09 19:00, Mar 10 19:00)                         │
//! │                                                                         │
//! │  SELECT SUM(total_cents), COUNT(*) FROM sales                          │
//! │   WHERE date_time >= '2024-03-09 19:00:00'                             │
//! │     AND date_time <  '2024-03-10 19:00:00'                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::to_db_timestamp;
use tally_core::{DayStats, Money, StatsPeriod};

/// Repository for day stats queries.
#[derive(Debug, Clone)]
pub struct StatsRepository {
    pool: SqlitePool,
}

impl StatsRepository {
    /// Creates a new StatsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StatsRepository { pool }
    }

    /// Totals for `period`, ending with today on the local clock.
    pub async fn day_stats(&self, period: StatsPeriod) -> DbResult<DayStats> {
        self.day_stats_at(period, Local::now()).await
    }

    /// Totals for `period`, ending with the calendar day of `now` in its
    /// own time zone.
    pub async fn day_stats_at<Tz: TimeZone>(
        &self,
        period: StatsPeriod,
        now: DateTime<Tz>,
    ) -> DbResult<DayStats> {
        let zone = now.timezone();
        let window = period.window(now.date_naive());

        let start = to_db_timestamp(&local_midnight_utc(&zone, window.first_day)?);
        let end = to_db_timestamp(&local_midnight_utc(&zone, window.end_exclusive)?);

        let (total_sales, order_count): (Money, i64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(total_cents), 0),
                COUNT(*)
            FROM sales
            WHERE date_time >= ?1 AND date_time < ?2
            "#,
        )
        .bind(&start)
        .bind(&end)
        .fetch_one(&self.pool)
        .await?;

        debug!(
            period = %period,
            from = %start,
            to = %end,
            order_count,
            total = %total_sales,
            "Computed day stats"
        );

        Ok(DayStats {
            total_sales,
            order_count,
        })
    }
}

/// The instant a local calendar day begins, in UTC.
///
/// On days where midnight falls in a DST gap, the day begins at the first
/// valid local time after it.
fn local_midnight_utc<Tz: TimeZone>(zone: &Tz, day: NaiveDate) -> DbResult<DateTime<Utc>> {
    let midnight = day.and_hms_opt(0, 0, 0);
    let one_am = day.and_hms_opt(1, 0, 0);

    [midnight, one_am]
        .into_iter()
        .flatten()
        .find_map(|naive| zone.from_local_datetime(&naive).earliest())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| DbError::Internal(format!("no local midnight for {day}")))
}

// =============================================================================
// Unit Tests
// =============================================================================
