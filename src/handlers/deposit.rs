//! Deposit API handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::auth::Session;
use crate::deposit::{
    CompleteDepositRequest, DepositReceipt, DepositService, InitiateDepositRequest,
    InitiateDepositResponse,
};
use crate::error::ApiError;
use crate::models::ApiResponse;

/// POST /api/deposits - Start a deposit checkout with the payment gateway
pub async fn initiate_deposit(
    State(deposit_service): State<Arc<DepositService>>,
    session: Session,
    Json(request): Json<InitiateDepositRequest>,
) -> Result<Json<ApiResponse<InitiateDepositResponse>>, ApiError> {
    let response = deposit_service.initiate(session.user_id, request).await?;
    Ok(Json(ApiResponse::ok(response)))
}

/// POST /api/deposits/complete - Complete a deposit after the gateway
/// redirect. Safe to call again with the same token.
pub async fn complete_deposit(
    State(deposit_service): State<Arc<DepositService>>,
    session: Session,
    Json(request): Json<CompleteDepositRequest>,
) -> Result<Json<ApiResponse<DepositReceipt>>, ApiError> {
    let receipt = deposit_service
        .complete(session.user_id, &request.order_token)
        .await?;
    Ok(Json(ApiResponse::ok(receipt)))
}
