//! API routing module
//!
//! One module per resource, each contributing a `Router<ServerState>`:
//!
//! - [`auth`] - static password gate
//! - [`dashboard`] - aggregate metrics and chart
//! - [`products`] - product management
//! - [`customers`] - customer management
//! - [`sales`] - sale recording
//! - [`fiado`] - credit ledger views and settlement

pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod fiado;
pub mod products;
pub mod sales;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::core::ServerState;

/// Assemble the full application router
pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(products::router())
        .merge(customers::router())
        .merge(sales::router())
        .merge(fiado::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
