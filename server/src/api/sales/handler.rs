//! Sales API Handlers

use axum::{Json, extract::State};
use serde::Serialize;
use shared::models::{Sale, SaleCreate, SaleItem};

use crate::core::ServerState;
use crate::db::repository::sale;
use crate::utils::{AppResponse, AppResult, ok_with_message};

/// The recorded sale together with its line items
#[derive(Serialize)]
pub struct SaleReceipt {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

/// POST /api/sales - record a sale (cash or fiado) with its items;
/// stock decrements commit in the same transaction
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<SaleCreate>,
) -> AppResult<Json<AppResponse<SaleReceipt>>> {
    let sale = sale::create(state.pool(), payload).await?;
    let items = sale::find_items(state.pool(), sale.id).await?;
    state.dashboard_cache.invalidate();
    Ok(ok_with_message(SaleReceipt { sale, items }, "Sale recorded"))
}
