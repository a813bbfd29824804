//! Loan API handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::Session;
use crate::error::ApiError;
use crate::loan::{CreateLoanRequest, Loan, MakePaymentRequest, PaymentReceipt};
use crate::loan_service::LoanService;
use crate::models::ApiResponse;

/// GET /api/loans - List the authenticated user's loans
pub async fn list_loans(
    State(loan_service): State<Arc<LoanService>>,
    session: Session,
) -> Result<Json<ApiResponse<Vec<Loan>>>, ApiError> {
    let loans = loan_service.list_loans(session.user_id).await?;
    Ok(Json(ApiResponse::ok(loans)))
}

/// GET /api/loans/:id - Get one of the authenticated user's loans
pub async fn get_loan(
    State(loan_service): State<Arc<LoanService>>,
    session: Session,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Loan>>, ApiError> {
    let loan = loan_service.get_loan(session.user_id, loan_id).await?;
    Ok(Json(ApiResponse::ok(loan)))
}

/// POST /api/loans - Submit a loan application
pub async fn create_loan(
    State(loan_service): State<Arc<LoanService>>,
    session: Session,
    Json(request): Json<CreateLoanRequest>,
) -> Result<Json<ApiResponse<Loan>>, ApiError> {
    let loan = loan_service.create_loan(session.user_id, request).await?;
    Ok(Json(ApiResponse::ok(loan)))
}

/// POST /api/loans/:id/payments - Make a repayment on a loan
pub async fn make_payment(
    State(loan_service): State<Arc<LoanService>>,
    session: Session,
    Path(loan_id): Path<Uuid>,
    Json(request): Json<MakePaymentRequest>,
) -> Result<Json<ApiResponse<PaymentReceipt>>, ApiError> {
    let receipt = loan_service
        .apply_payment(session.user_id, loan_id, request.amount_cents)
        .await?;
    Ok(Json(ApiResponse::ok(receipt)))
}

/// Count of loans still in the approval pipeline
#[derive(Debug, Serialize)]
pub struct ActiveLoanCount {
    pub count: i64,
}

/// GET /api/loans/active-count - Count the user's pending/approved loans
pub async fn active_loan_count(
    State(loan_service): State<Arc<LoanService>>,
    session: Session,
) -> Result<Json<ApiResponse<ActiveLoanCount>>, ApiError> {
    let count = loan_service.active_loan_count(session.user_id).await?;
    Ok(Json(ApiResponse::ok(ActiveLoanCount { count })))
}
