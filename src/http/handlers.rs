//! Request handlers.

use alloy::primitives::Address;
use axum::{body::Bytes, extract::State};
use serde::Serialize;

use crate::authorizer::AuthorizeError;
use crate::blockchain::SignedTransaction;
use crate::http::response::{ApiError, ApiResponse};
use crate::http::server::AppState;
use crate::policy::Network;

#[derive(Debug, Serialize)]
pub struct KeyStatus {
    pub address: Address,
    pub network: Network,
}

/// `GET /status`
pub async fn get_status(State(state): State<AppState>) -> Result<ApiResponse<KeyStatus>, ApiError> {
    let address = state
        .authorizer
        .keystore()
        .address()
        .ok_or(AuthorizeError::NotUnlocked)?;

    Ok(ApiResponse::ok(
        "Key is unlocked, ready to proceed",
        KeyStatus {
            address,
            network: state.authorizer.policy().network(),
        },
    ))
}

/// `POST /sign`
///
/// The body is taken raw so malformed JSON gets the error envelope instead
/// of axum's plain-text rejection.
pub async fn post_sign(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<ApiResponse<SignedTransaction>, ApiError> {
    let signed = state.authorizer.authorize_json(&body).await?;
    Ok(ApiResponse::ok("Transaction successfully signed", signed))
}

pub async fn not_found() -> ApiError {
    ApiError::not_found()
}
