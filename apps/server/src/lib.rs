//! # tally-server: HTTP API for Tally POS
//!
//! ## Request Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Register client (browser, :3000)                                      │
//! │       │  JSON over HTTP                                                 │
//! │       ▼                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────────────────┐    │
//! │  │ CorsLayer    │──►│ TraceLayer   │──►│ routes::*  (handlers)    │    │
//! │  └──────────────┘   └──────────────┘   └────────────┬─────────────┘    │
//! │                                                     │ dto → domain     │
//! │                                                     ▼                  │
//! │                                        ┌──────────────────────────┐    │
//! │                                        │ tally-db repositories    │    │
//! │                                        └────────────┬─────────────┘    │
//! │                                                     │ DbError          │
//! │                                                     ▼                  │
//! │                                        ApiError → status + {"error"}   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The binary (`main.rs`) adds config loading, CORS and graceful shutdown;
//! tests drive [`build_router`] directly.

pub mod config;
pub mod dto;
pub mod error;
pub mod routes;

use axum::http::{HeaderValue, Method};
use axum::Router;
use tally_db::Database;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult};

/// Shared handler state. Cloning is cheap (the pool is reference counted).
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        AppState { db }
    }
}

/// Builds the API router with request tracing.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::products::router())
        .merge(routes::sales::router())
        .merge(routes::orders::router())
        .merge(routes::stats::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy admitting the register front end at `origin`.
pub fn cors_layer(origin: &str) -> Result<CorsLayer, ConfigError> {
    let origin: HeaderValue = origin
        .parse()
        .map_err(|_| ConfigError::InvalidValue(format!("cors_origin: {origin}")))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any))
}
