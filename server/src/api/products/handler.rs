//! Product API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{Product, ProductCreate, ProductUpdate};

use crate::core::ServerState;
use crate::db::repository::product;
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};

/// GET /api/products - all products
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<AppResponse<Vec<Product>>>> {
    let products = product::find_all(state.pool()).await?;
    Ok(ok(products))
}

/// GET /api/products/low-stock - products at or below minimum stock
pub async fn low_stock(
    State(state): State<ServerState>,
) -> AppResult<Json<AppResponse<Vec<Product>>>> {
    let products = product::find_low_stock(state.pool()).await?;
    Ok(ok(products))
}

/// GET /api/products/:id - single product
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<Product>>> {
    let product = product::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {id} not found")))?;
    Ok(ok(product))
}

/// POST /api/products - create product
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ProductCreate>,
) -> AppResult<Json<AppResponse<Product>>> {
    let product = product::create(state.pool(), payload).await?;
    state.dashboard_cache.invalidate();
    Ok(ok(product))
}

/// PUT /api/products/:id - update product
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<Json<AppResponse<Product>>> {
    let product = product::update(state.pool(), id, payload).await?;
    state.dashboard_cache.invalidate();
    Ok(ok(product))
}

/// DELETE /api/products/:id - delete product (only if never sold)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<bool>>> {
    let deleted = product::delete(state.pool(), id).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("Product {id} not found")));
    }
    state.dashboard_cache.invalidate();
    Ok(ok_with_message(true, "Product deleted"))
}
