//! Day stats.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use tally_core::{DayStats, StatsPeriod};
use tracing::warn;

use crate::dto::{StatsQuery, StatsResponse};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/daystats", get(day_stats))
}

/// Unknown periods count as `today`. A store failure reports zeros.
async fn day_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Json<StatsResponse> {
    let period = StatsPeriod::parse_lenient(query.period.as_deref());

    let stats = match state.db.stats().day_stats(period).await {
        Ok(stats) => stats,
        Err(e) => {
            warn!(period = %period, error = %e, "Day stats unavailable, reporting zeros");
            DayStats::default()
        }
    };

    Json(stats.into())
}
