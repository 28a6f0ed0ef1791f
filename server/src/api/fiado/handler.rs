//! Fiado API Handlers
//!
//! Thin layer over the settlement service: extract, delegate, invalidate
//! the dashboard cache on every successful write. All settlement rules
//! live in the ledger core.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use shared::models::{DebtorSummary, FiadoPayment, FiadoSaleDetail};

use crate::core::ServerState;
use crate::db::repository::fiado;
use crate::ledger::{SettleAllReport, SettlementReport, SingleSaleReceipt};
use crate::utils::{AppResponse, AppResult, ok, ok_with_message};

#[derive(Deserialize)]
pub struct PayRequest {
    pub amount: f64,
    pub note: Option<String>,
}

/// A customer's tab: outstanding total, open sales with items, payment
/// history
#[derive(Serialize)]
pub struct CustomerFiado {
    pub total_owed: f64,
    pub open_sales: Vec<FiadoSaleDetail>,
    pub payments: Vec<FiadoPayment>,
}

/// GET /api/fiado - customers with outstanding balances
pub async fn debtors(
    State(state): State<ServerState>,
) -> AppResult<Json<AppResponse<Vec<DebtorSummary>>>> {
    let debtors = fiado::find_debtors(state.pool()).await?;
    Ok(ok(debtors))
}

/// GET /api/fiado/customer/:id - one customer's tab in full
pub async fn customer_detail(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<CustomerFiado>>> {
    let balance = state.settlement.open_balance(id).await?;
    let open_sales = fiado::customer_detail(state.pool(), id).await?;
    let payments = fiado::find_payments(state.pool(), id).await?;

    Ok(ok(CustomerFiado {
        total_owed: balance.total_owed,
        open_sales,
        payments,
    }))
}

/// POST /api/fiado/customer/:id/pay - apply a payment across the
/// customer's open sales, oldest first
pub async fn pay_customer(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<PayRequest>,
) -> AppResult<Json<AppResponse<SettlementReport>>> {
    let report = state
        .settlement
        .settle_payment(id, payload.amount, payload.note)
        .await?;
    state.dashboard_cache.invalidate();
    Ok(ok_with_message(report, "Payment settled"))
}

/// POST /api/fiado/sales/:id/pay - apply a payment to one sale
pub async fn pay_sale(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<PayRequest>,
) -> AppResult<Json<AppResponse<SingleSaleReceipt>>> {
    let receipt = state
        .settlement
        .settle_single_sale(id, payload.amount, payload.note)
        .await?;
    state.dashboard_cache.invalidate();
    Ok(ok_with_message(receipt, "Payment settled"))
}

/// POST /api/fiado/customer/:id/pay-all - settle the whole tab
pub async fn pay_all(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<SettleAllReport>>> {
    let report = state.settlement.settle_all_open_sales(id, None).await?;
    state.dashboard_cache.invalidate();
    Ok(ok_with_message(report, "Tab settled"))
}
