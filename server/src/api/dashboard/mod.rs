//! Dashboard API module

mod cache;
mod handler;

pub use cache::DashboardCache;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/dashboard", get(handler::stats))
        .route("/api/dashboard/chart", get(handler::chart))
}
