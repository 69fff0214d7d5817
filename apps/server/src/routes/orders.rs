//! Order history API.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};

use crate::dto::{MessageResponse, OrderDto, UpdateOrderRequest};
use crate::error::ApiResult;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}", put(update).delete(delete))
}

/// Newest first. Read-only.
async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<OrderDto>>> {
    let orders = state.db.sales().list_orders().await?;
    Ok(Json(orders.into_iter().map(OrderDto::from).collect()))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateOrderRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(req) = payload?;
    let (total, order_type) = req.into_parts()?;

    state.db.sales().update_order(id, total, order_type).await?;
    Ok(Json(MessageResponse::new("Order updated!")))
}

async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    state.db.sales().delete_order(id).await?;
    Ok(Json(MessageResponse::new("Order deleted!")))
}
