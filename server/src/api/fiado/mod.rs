//! Fiado API module
//!
//! The credit-ledger surface: debtor listing, per-customer tab detail and
//! the three settlement operations.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/fiado", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::debtors))
        .route("/customer/{id}", get(handler::customer_detail))
        .route("/customer/{id}/pay", post(handler::pay_customer))
        .route("/customer/{id}/pay-all", post(handler::pay_all))
        .route("/sales/{id}/pay", post(handler::pay_sale))
}
