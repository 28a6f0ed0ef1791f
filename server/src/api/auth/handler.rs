//! Auth API Handlers
//!
//! A single static-password gate. The frontend stores the boolean and
//! gates its views on it; there is no session or token state here.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::utils::{AppError, AppResponse, AppResult, ok};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub authorized: bool,
}

/// POST /api/auth - check the shop password
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AppResponse<LoginResponse>>> {
    match &state.config.admin_password {
        // No password configured: open instance (development)
        None => Ok(ok(LoginResponse { authorized: true })),
        Some(expected) if *expected == payload.password => {
            Ok(ok(LoginResponse { authorized: true }))
        }
        Some(_) => Err(AppError::Unauthorized),
    }
}
