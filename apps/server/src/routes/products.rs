//! Catalog API.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use tracing::info;

use crate::dto::{CreateProductResponse, MessageResponse, ProductDto, ProductRequest};
use crate::error::ApiResult;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/products", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", put(update).delete(delete))
}

async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<ProductDto>>> {
    let products = state.db.products().list().await?;
    Ok(Json(products.into_iter().map(ProductDto::from).collect()))
}

async fn create(
    State(state): State<AppState>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> ApiResult<Json<CreateProductResponse>> {
    let Json(req) = payload?;
    let input = req.into_input()?;

    let product = state.db.products().create(&input).await?;
    info!(product_id = product.id, name = %product.name, "Product added");

    Ok(Json(CreateProductResponse {
        message: "Product added!".to_string(),
        product_id: product.id,
    }))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> ApiResult<Json<ProductDto>> {
    let Json(req) = payload?;
    let input = req.into_input()?;

    let product = state.db.products().update(id, &input).await?;
    Ok(Json(product.into()))
}

async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    state.db.products().delete(id).await?;
    Ok(Json(MessageResponse::new("Product deleted!")))
}
