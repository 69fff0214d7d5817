//! Liveness check.

use axum::{routing::get, Json, Router};

use crate::dto::MessageResponse;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/test", get(ping))
}

async fn ping() -> Json<MessageResponse> {
    Json(MessageResponse::new("Backend is working!"))
}
