//! Customer API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{Customer, CustomerCreate, CustomerUpdate};

use crate::core::ServerState;
use crate::db::repository::customer;
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};

/// GET /api/customers - all customers
pub async fn list(
    State(state): State<ServerState>,
) -> AppResult<Json<AppResponse<Vec<Customer>>>> {
    let customers = customer::find_all(state.pool()).await?;
    Ok(ok(customers))
}

/// GET /api/customers/:id - single customer
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<Customer>>> {
    let customer = customer::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Customer {id} not found")))?;
    Ok(ok(customer))
}

/// POST /api/customers - create customer
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CustomerCreate>,
) -> AppResult<Json<AppResponse<Customer>>> {
    let customer = customer::create(state.pool(), payload).await?;
    state.dashboard_cache.invalidate();
    Ok(ok(customer))
}

/// PUT /api/customers/:id - update customer
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<CustomerUpdate>,
) -> AppResult<Json<AppResponse<Customer>>> {
    let customer = customer::update(state.pool(), id, payload).await?;
    Ok(ok(customer))
}

/// DELETE /api/customers/:id - delete customer (only without sales)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<bool>>> {
    let deleted = customer::delete(state.pool(), id).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("Customer {id} not found")));
    }
    state.dashboard_cache.invalidate();
    Ok(ok_with_message(true, "Customer deleted"))
}
