//! Checkout.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;

use crate::dto::{CommitOrderRequest, CommitResponse};
use crate::error::ApiResult;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/sales", post(commit))
}

/// Commits the cart as one order. The order is stamped with the server
/// clock, not a client-supplied time.
async fn commit(
    State(state): State<AppState>,
    payload: Result<Json<CommitOrderRequest>, JsonRejection>,
) -> ApiResult<Json<CommitResponse>> {
    let Json(req) = payload?;
    let order = req.into_new_order(Utc::now())?;

    let receipt = state.db.sales().commit_order(&order).await?;

    Ok(Json(CommitResponse {
        message: "Sale completed!".to_string(),
        sale_id: receipt.order_id,
        total: receipt.total_amount.to_decimal(),
        order_type: receipt.order_type,
    }))
}
